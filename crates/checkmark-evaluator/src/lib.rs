// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// checkmark-evaluator — Recognition and grading of photographed answer sheets.
//
// Provides photo loading and normalisation, answer-box registration (edge map,
// contour hierarchy filtering, polygon simplification, perspective
// rectification), multi-threshold mark detection, grading, and compositing of
// the correctness overlay back onto the photo.

pub mod photo;
pub mod sheet;

// Re-export the primary entry points so callers can use `checkmark_evaluator::SheetEvaluator` etc.
pub use photo::loader::{SheetImage, save_image};
pub use sheet::evaluator::{Evaluation, SheetEvaluator, SheetReading};
pub use sheet::geometry::BoxOutline;
pub use sheet::detect::AnswerVote;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Answer-sheet pipeline — box extraction, rectification, threshold-sweep mark
// detection, grading, and overlay compositing. Every stage is a pure function
// from borrowed inputs to freshly allocated outputs.

pub mod composite;
pub mod contours;
pub mod detect;
pub mod evaluator;
pub mod geometry;
pub mod grade;
pub mod rectify;

#[cfg(test)]
pub(crate) mod fixtures;

pub use evaluator::{Evaluation, SheetEvaluator, SheetReading};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Checkmark.

use thiserror::Error;

/// Top-level error type for all Checkmark operations.
#[derive(Debug, Error)]
pub enum CheckmarkError {
    // -- Sheet recognition --
    #[error("expected 1 to 4 answer boxes, found {found}")]
    ShapeCount { found: usize },

    #[error("answer box transform could not be computed: {0}")]
    DegenerateBox(String),

    // -- Grading inputs --
    #[error("answer key has {supplied} entries but the sheet holds {required} questions")]
    AnswerKeyLength { required: usize, supplied: usize },

    #[error("invalid answer key: {0}")]
    InvalidAnswerKey(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Image I/O --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CheckmarkError>;

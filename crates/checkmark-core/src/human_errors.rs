// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for anyone grading a stack of photographed sheets.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives whether the caller asks for a new photo.

use crate::error::CheckmarkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The photo cannot be read; taking another one usually fixes it.
    RetakePhoto,
    /// The user must correct an input (answer key, settings file).
    ActionRequired,
    /// Cannot be fixed by retrying: unreadable file, disk failure.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether a fresh photo of the same sheet may succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `CheckmarkError` into a `HumanError`.
pub fn humanize_error(err: &CheckmarkError) -> HumanError {
    match err {
        CheckmarkError::ShapeCount { found: 0 } => HumanError {
            message: "We couldn't find any answer boxes in this photo.".into(),
            suggestion: "Take the photo again from straight above, with the whole sheet in view and good lighting.".into(),
            retriable: true,
            severity: Severity::RetakePhoto,
        },

        CheckmarkError::ShapeCount { found } => HumanError {
            message: "This photo shows too many box-like shapes.".into(),
            suggestion: format!(
                "Take the photo again with only the answer sheet in view. ({found} candidate boxes were found, at most 4 are allowed.)"
            ),
            retriable: true,
            severity: Severity::RetakePhoto,
        },

        CheckmarkError::DegenerateBox(detail) => HumanError {
            message: "One of the answer boxes is too distorted to read.".into(),
            suggestion: format!("Flatten the sheet and take the photo again. ({detail})"),
            retriable: true,
            severity: Severity::RetakePhoto,
        },

        CheckmarkError::AnswerKeyLength { required, supplied } => HumanError {
            message: "The answer key doesn't match this sheet.".into(),
            suggestion: format!(
                "The sheet has {required} questions but the key only covers {supplied}. Check that you picked the right key."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CheckmarkError::InvalidAnswerKey(detail) => HumanError {
            message: "The answer key couldn't be read.".into(),
            suggestion: format!("Write the key using the letters A to D, for example ABCDA. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CheckmarkError::InvalidConfig(detail) => HumanError {
            message: "The settings file has a mistake.".into(),
            suggestion: format!("Fix the setting or delete the file to use the defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CheckmarkError::ImageError(detail) => HumanError {
            message: "This picture couldn't be opened.".into(),
            suggestion: format!("Save the photo as JPEG or PNG and try again. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        CheckmarkError::Io(io_err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check that the file exists and the folder is writable. ({io_err})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        CheckmarkError::Serialization(serde_err) => HumanError {
            message: "The settings file couldn't be understood.".into(),
            suggestion: format!("Make sure the file is valid JSON. ({serde_err})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

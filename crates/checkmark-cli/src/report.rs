// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Evaluation report — the machine-readable summary printed by `--json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use checkmark_core::{Answer, Score};
use checkmark_evaluator::Evaluation;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 of the photo bytes as lowercase hex, so a report can be matched
/// to the exact file it was produced from.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// `<dir>/<stem>_graded.png` next to the input photo.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_owned());
    input.with_file_name(format!("{stem}_graded.png"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub image: PathBuf,
    pub sha256: String,
    pub annotated: PathBuf,
    pub score: Score,
    /// `"points/max (blank)"`.
    pub summary: String,
    /// One entry per question; `null` for blank or unreadable.
    pub answers: Vec<Answer>,
    pub boxes: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        image: &Path,
        photo_bytes: &[u8],
        annotated: &Path,
        evaluation: &Evaluation,
    ) -> Self {
        Self {
            image: image.to_path_buf(),
            sha256: fingerprint(photo_bytes),
            annotated: annotated.to_path_buf(),
            score: evaluation.score,
            summary: evaluation.score.to_string(),
            answers: evaluation.answers.clone(),
            boxes: evaluation.boxes.len(),
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkmark_core::Choice;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn fingerprint_known_values() {
        assert_eq!(fingerprint(b""), EMPTY_SHA256);
        assert_eq!(
            fingerprint(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn graded_image_sits_next_to_photo() {
        assert_eq!(
            default_output_path(Path::new("/tmp/class-4b/sheet01.jpg")),
            PathBuf::from("/tmp/class-4b/sheet01_graded.png")
        );
        assert_eq!(
            default_output_path(Path::new("scan.png")),
            PathBuf::from("scan_graded.png")
        );
    }

    #[test]
    fn report_serializes_blank_answers_as_null() {
        let report = Report {
            image: PathBuf::from("sheet.jpg"),
            sha256: EMPTY_SHA256.into(),
            annotated: PathBuf::from("sheet_graded.png"),
            score: Score {
                points: 1,
                max_points: 2,
                no_answer: 1,
            },
            summary: "1/2 (1)".into(),
            answers: vec![Some(Choice::C), None],
            boxes: 1,
            evaluated_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["answers"], serde_json::json!(["C", null]));
        assert_eq!(json["score"]["no_answer"], 1);

        let back: Report = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.summary, "1/2 (1)");
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grading — score tally against the answer key, and per-box correctness
// overlays drawn in grid-window coordinates.

use checkmark_core::{Answer, AnswerKey, Choice, EvaluatorConfig, QUESTIONS_PER_BOX, Score};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use tracing::{info, instrument};

use super::rectify::CropWindow;

pub const CORRECT: Rgb<u8> = Rgb([0, 255, 0]);
pub const WRONG: Rgb<u8> = Rgb([255, 0, 0]);

/// Score plus one overlay per box, in box order.
#[derive(Debug, Clone)]
pub struct GradeResult {
    pub score: Score,
    pub overlays: Vec<RgbImage>,
}

/// Tally `given` against `key`, question by question. Only the first
/// `given.len()` key entries are used.
pub fn tally(given: &[Answer], key: &AnswerKey) -> Score {
    let mut score = Score::default();
    for (&answer, &expected) in given.iter().zip(key.as_slice()) {
        score.record(answer, expected);
    }
    score
}

/// Grade every box and draw its overlay.
///
/// `given` holds the answers of all boxes in box order (5 per box), aligned by
/// absolute question index with `key`. Each overlay has the size of its
/// box's grid window on a black background:
///
/// - the student's mark, if any, as a large disc: green if correct, red otherwise
/// - the expected answer as a small green disc, always drawn on top
#[instrument(skip_all, fields(boxes = windows.len(), questions = given.len()))]
pub fn grade(
    given: &[Answer],
    key: &AnswerKey,
    windows: &[CropWindow],
    config: &EvaluatorConfig,
) -> GradeResult {
    let score = tally(given, key);
    let overlays = windows
        .iter()
        .enumerate()
        .map(|(b, window)| {
            let start = b * QUESTIONS_PER_BOX;
            let questions = given
                .iter()
                .skip(start)
                .take(QUESTIONS_PER_BOX)
                .zip(key.as_slice().iter().skip(start));
            draw_overlay(window, questions, config)
        })
        .collect();

    info!(score = %score, "Sheet graded");
    GradeResult { score, overlays }
}

fn draw_overlay<'a>(
    window: &CropWindow,
    questions: impl Iterator<Item = (&'a Answer, &'a Choice)>,
    config: &EvaluatorConfig,
) -> RgbImage {
    let mut overlay = RgbImage::new(window.width, window.height);
    let cell = window.cell_width().min(window.cell_height()) as f32;
    let student_radius = (cell * config.student_marker_ratio).round() as i32;
    let key_radius = (cell * config.key_marker_ratio).round() as i32;

    for (row, (&given, &expected)) in questions.enumerate() {
        if let Some(choice) = given {
            let colour = if choice == expected { CORRECT } else { WRONG };
            draw_filled_circle_mut(
                &mut overlay,
                window.cell_centre(row, choice.index()),
                student_radius,
                colour,
            );
        }
        draw_filled_circle_mut(
            &mut overlay,
            window.cell_centre(row, expected.index()),
            key_radius,
            CORRECT,
        );
    }
    overlay
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet evaluator — runs the full pipeline from a photo and an answer key to a
// score and an annotated image.

use checkmark_core::error::{CheckmarkError, Result};
use checkmark_core::{Answer, AnswerKey, EvaluatorConfig, QUESTIONS_PER_BOX, Score};
use image::{DynamicImage, RgbImage};
use tracing::{info, instrument, warn};

use super::composite::composite;
use super::contours::{edge_map, extract_boxes};
use super::detect::{AnswerVote, resolve_box, sweep_box};
use super::geometry::BoxOutline;
use super::grade::grade;
use super::rectify::{BoxFrame, warp_box};
use crate::photo::loader::normalise;

/// Result of grading one sheet.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: Score,
    /// Final answer per question, in box order (5 per box).
    pub answers: Vec<Answer>,
    /// Sweep tallies behind `answers`.
    pub votes: Vec<AnswerVote>,
    /// Located boxes in page-slot order.
    pub boxes: Vec<BoxOutline>,
    /// The working image with correctness overlays composited on.
    pub annotated: RgbImage,
}

/// Answers read from a sheet without grading.
#[derive(Debug, Clone)]
pub struct SheetReading {
    pub frames: Vec<BoxFrame>,
    pub votes: Vec<AnswerVote>,
    pub answers: Vec<Answer>,
}

impl SheetReading {
    pub fn boxes(&self) -> Vec<BoxOutline> {
        self.frames.iter().map(|f| f.outline).collect()
    }
}

/// Grades photographed answer sheets.
///
/// Holds only the configuration; each call allocates its own buffers, so one
/// evaluator can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SheetEvaluator {
    config: EvaluatorConfig,
}

impl SheetEvaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Resize any decoded photo to the working resolution and evaluate it.
    pub fn evaluate(&self, photo: &DynamicImage, key: &AnswerKey) -> Result<Evaluation> {
        let working = normalise(photo, self.config.working_width, self.config.working_height);
        self.evaluate_working(&working, key)
    }

    /// Evaluate an image already at working resolution.
    #[instrument(
        skip_all,
        fields(width = working.width(), height = working.height(), key = key.len())
    )]
    pub fn evaluate_working(&self, working: &RgbImage, key: &AnswerKey) -> Result<Evaluation> {
        let reading = self.read_answers(working)?;
        check_key_length(key, reading.frames.len())?;

        let windows: Vec<_> = reading.frames.iter().map(|f| f.window).collect();
        let graded = grade(&reading.answers, key, &windows, &self.config);
        let annotated = composite(working, &reading.frames, &graded.overlays)?;

        info!(
            boxes = reading.frames.len(),
            score = %graded.score,
            "Sheet evaluated"
        );
        Ok(Evaluation {
            score: graded.score,
            boxes: reading.boxes(),
            answers: reading.answers,
            votes: reading.votes,
            annotated,
        })
    }

    /// Locate the answer boxes only.
    pub fn locate_boxes(&self, working: &RgbImage) -> Result<Vec<BoxOutline>> {
        let edges = edge_map(working, &self.config);
        extract_boxes(&edges, &self.config)
    }

    /// Locate, rectify and read every box, without an answer key.
    #[instrument(skip_all, fields(width = working.width(), height = working.height()))]
    pub fn read_answers(&self, working: &RgbImage) -> Result<SheetReading> {
        let outlines = self.locate_boxes(working)?;

        let mut frames = Vec::with_capacity(outlines.len());
        let mut votes = Vec::with_capacity(outlines.len() * QUESTIONS_PER_BOX);
        let mut answers = Vec::with_capacity(outlines.len() * QUESTIONS_PER_BOX);
        for outline in outlines {
            let warped = warp_box(working, outline, &self.config)?;
            let tally = sweep_box(&warped, &self.config);
            answers.extend(resolve_box(&tally, &self.config));
            votes.extend(tally);
            frames.push(warped.frame);
        }

        info!(
            boxes = frames.len(),
            answers = %labels(&answers),
            "Answers read"
        );
        Ok(SheetReading {
            frames,
            votes,
            answers,
        })
    }
}

fn labels(answers: &[Answer]) -> String {
    answers.iter().map(|a| checkmark_core::answer_label(*a)).collect()
}

fn check_key_length(key: &AnswerKey, boxes: usize) -> Result<()> {
    let required = boxes * QUESTIONS_PER_BOX;
    if key.len() < required {
        return Err(CheckmarkError::AnswerKeyLength {
            required,
            supplied: key.len(),
        });
    }
    if key.len() > required {
        warn!(
            required,
            supplied = key.len(),
            "Answer key longer than the located boxes; extra entries ignored"
        );
    }
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mark detection — per-cell ink counting, a per-threshold row decision, and the
// majority vote across the threshold sweep.

use checkmark_core::{Answer, Choice, EvaluatorConfig, OPTIONS_PER_QUESTION, QUESTIONS_PER_BOX};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::rectify::{WarpedBox, rectify};

/// Ink pixel counts per cell: `[row][column]`.
pub type CellCounts = [[u32; OPTIONS_PER_QUESTION]; QUESTIONS_PER_BOX];

/// Sweep tally for one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerVote {
    /// Samples that decided for each option A–D.
    pub votes: [u32; OPTIONS_PER_QUESTION],
    /// Samples where no option clearly dominated.
    pub uncertain: u32,
}

impl AnswerVote {
    /// Record the decision of one threshold sample.
    pub fn record(&mut self, decision: Answer) {
        match decision {
            Some(choice) => self.votes[choice.index()] += 1,
            None => self.uncertain += 1,
        }
    }

    /// Samples recorded so far.
    pub fn samples(&self) -> u32 {
        self.votes.iter().sum::<u32>() + self.uncertain
    }

    /// Final answer after the sweep.
    ///
    /// The leading option must hold an outright majority of the decisive
    /// samples, and must not be swamped by uncertain ones:
    /// `max * 2 > decisive` and `max * uncertain_factor > uncertain`.
    pub fn resolve(&self, uncertain_factor: u32) -> Answer {
        let (leader, max_count) = leading_option(&self.votes);
        let decisive: u32 = self.votes.iter().sum();
        if max_count * 2 > decisive && max_count * uncertain_factor > self.uncertain {
            Choice::from_index(leader)
        } else {
            None
        }
    }
}

/// Index and value of the largest count; the first one wins ties.
fn leading_option(counts: &[u32; OPTIONS_PER_QUESTION]) -> (usize, u32) {
    let mut best = (0, counts[0]);
    for (idx, &count) in counts.iter().enumerate().skip(1) {
        if count > best.1 {
            best = (idx, count);
        }
    }
    best
}

/// Count ink (non-zero) pixels in each cell of a rectified grid.
///
/// The image height must be a multiple of 5 and its width a multiple of 4.
pub fn count_cell_ink(grid: &GrayImage) -> CellCounts {
    let (width, height) = grid.dimensions();
    let cell_width = (width as usize) / OPTIONS_PER_QUESTION;
    let cell_height = (height as usize) / QUESTIONS_PER_BOX;
    let mut counts: CellCounts = [[0; OPTIONS_PER_QUESTION]; QUESTIONS_PER_BOX];
    if cell_width == 0 || cell_height == 0 {
        return counts;
    }

    for (y, row) in grid.as_raw().chunks_exact(width as usize).enumerate() {
        let question = y / cell_height;
        if question >= QUESTIONS_PER_BOX {
            break;
        }
        for (option, cell_row) in row
            .chunks_exact(cell_width)
            .take(OPTIONS_PER_QUESTION)
            .enumerate()
        {
            counts[question][option] += cell_row.iter().filter(|&&v| v != 0).count() as u32;
        }
    }
    counts
}

/// Decide one row at one threshold.
///
/// With the counts sorted descending (`top1 >= top2 >= .. >= bottom`), the
/// inkiest option wins only if `top1 - top2 > margin_ratio * cell_area +
/// (top2 - bottom)`: its lead must beat a fixed margin plus the spread of the
/// remaining cells.
pub fn decide_row(
    counts: &[u32; OPTIONS_PER_QUESTION],
    cell_area: u32,
    margin_ratio: f64,
) -> Answer {
    let mut sorted = *counts;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let (top1, top2, bottom) = (
        sorted[0] as f64,
        sorted[1] as f64,
        sorted[OPTIONS_PER_QUESTION - 1] as f64,
    );

    if top1 - top2 > margin_ratio * cell_area as f64 + (top2 - bottom) {
        Choice::from_index(leading_option(counts).0)
    } else {
        None
    }
}

/// Decisions for all rows of one rectified grid.
pub fn decide_grid(
    grid: &GrayImage,
    cell_area: u32,
    margin_ratio: f64,
) -> [Answer; QUESTIONS_PER_BOX] {
    let counts = count_cell_ink(grid);
    counts.map(|row| decide_row(&row, cell_area, margin_ratio))
}

/// Run the threshold sweep over one warped box and tally votes per question.
///
/// Each threshold is an independent binarization of the same warped
/// grayscale buffer.
#[instrument(skip_all, fields(window = ?warped.frame.window))]
pub fn sweep_box(warped: &WarpedBox, config: &EvaluatorConfig) -> [AnswerVote; QUESTIONS_PER_BOX] {
    let cell_area = warped.frame.window.cell_area();
    let mut tally = [AnswerVote::default(); QUESTIONS_PER_BOX];

    for threshold in config.sweep_thresholds() {
        let rectified = rectify(warped, threshold);
        let decisions = decide_grid(&rectified.image, cell_area, config.decision_margin_ratio);
        trace!(
            threshold,
            decisions = %decisions.map(checkmark_core::answer_label).iter().collect::<String>(),
            "Sweep sample"
        );
        for (vote, decision) in tally.iter_mut().zip(decisions) {
            vote.record(decision);
        }
    }

    debug!(samples = config.sweep_len(), "Sweep complete");
    tally
}

/// Resolve a box's tally into final answers.
pub fn resolve_box(tally: &[AnswerVote], config: &EvaluatorConfig) -> Vec<Answer> {
    tally
        .iter()
        .map(|vote| vote.resolve(config.uncertain_factor))
        .collect()
}

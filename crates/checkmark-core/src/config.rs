// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Evaluator configuration. Defaults reproduce the geometry of the printed
// answer sheet; changing them changes which boxes and marks are found.

use serde::{Deserialize, Serialize};

use crate::error::{CheckmarkError, Result};

/// Tunable parameters of the recognition and grading pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Width every photo is resized to before processing.
    pub working_width: u32,
    /// Height every photo is resized to before processing.
    pub working_height: u32,

    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,

    /// A box must enclose more than `total_area / min_area_divisor` pixels.
    pub min_area_divisor: f64,
    /// A box must enclose less than `total_area / max_area_divisor` pixels.
    pub max_area_divisor: f64,
    /// A nested box's parent must enclose more than `total_area / parent_area_divisor`.
    pub parent_area_divisor: f64,
    /// Douglas–Peucker epsilon as a fraction of the boundary perimeter.
    pub polygon_epsilon_ratio: f64,

    /// Border removed from the top and from the bottom, in percent of height.
    pub vertical_border_percent: u32,
    /// Border removed from the left and from the right, in percent of width.
    pub horizontal_border_percent: u32,

    /// First binarization threshold of the sweep (inclusive).
    pub sweep_start: u32,
    /// End of the sweep (exclusive, at most 256).
    pub sweep_end: u32,
    /// Distance between consecutive sweep thresholds.
    pub sweep_step: u32,

    /// Required lead of the inkiest cell, as a fraction of one cell's area.
    pub decision_margin_ratio: f64,
    /// Winning votes must exceed `uncertain / uncertain_factor`.
    pub uncertain_factor: u32,

    /// Student marker radius as a fraction of the smaller cell dimension.
    pub student_marker_ratio: f32,
    /// Expected-answer marker radius as a fraction of the smaller cell dimension.
    pub key_marker_ratio: f32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            working_width: 1200,
            working_height: 800,
            blur_sigma: 1.0,
            canny_low: 10.0,
            canny_high: 70.0,
            min_area_divisor: 100.0,
            max_area_divisor: 3.0,
            parent_area_divisor: 3.0,
            polygon_epsilon_ratio: 0.02,
            vertical_border_percent: 3,
            horizontal_border_percent: 5,
            sweep_start: 16,
            sweep_end: 240,
            sweep_step: 4,
            decision_margin_ratio: 0.01,
            uncertain_factor: 20,
            student_marker_ratio: 2.0 / 3.0,
            key_marker_ratio: 1.0 / 3.0,
        }
    }
}

impl EvaluatorConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Thresholds visited by the answer sweep, in ascending order.
    pub fn sweep_thresholds(&self) -> impl Iterator<Item = u8> + '_ {
        (self.sweep_start..self.sweep_end)
            .step_by(self.sweep_step.max(1) as usize)
            .map(|t| t.min(u8::MAX as u32) as u8)
    }

    /// Number of thresholds visited by the answer sweep.
    pub fn sweep_len(&self) -> usize {
        self.sweep_thresholds().count()
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CheckmarkError::InvalidConfig(msg));

        if self.working_width == 0 || self.working_height == 0 {
            return invalid(format!(
                "working resolution must be non-zero, got {}x{}",
                self.working_width, self.working_height
            ));
        }
        if self.sweep_step == 0 {
            return invalid("sweep_step must be at least 1".into());
        }
        if self.sweep_end > 256 {
            return invalid(format!("sweep_end must be at most 256, got {}", self.sweep_end));
        }
        if self.sweep_start >= self.sweep_end {
            return invalid(format!(
                "sweep range [{}, {}) is empty",
                self.sweep_start, self.sweep_end
            ));
        }
        if self.vertical_border_percent >= 50 || self.horizontal_border_percent >= 50 {
            return invalid("border percentages must stay below 50".into());
        }
        if !(self.polygon_epsilon_ratio > 0.0) {
            return invalid("polygon_epsilon_ratio must be positive".into());
        }
        if !(self.min_area_divisor > self.max_area_divisor && self.max_area_divisor > 0.0) {
            return invalid(format!(
                "area divisors must satisfy min ({}) > max ({}) > 0",
                self.min_area_divisor, self.max_area_divisor
            ));
        }
        if !(self.parent_area_divisor > 0.0) {
            return invalid("parent_area_divisor must be positive".into());
        }
        if self.decision_margin_ratio < 0.0 {
            return invalid("decision_margin_ratio must not be negative".into());
        }
        if self.uncertain_factor == 0 {
            return invalid("uncertain_factor must be at least 1".into());
        }
        if !(self.student_marker_ratio > 0.0 && self.key_marker_ratio > 0.0) {
            return invalid("marker ratios must be positive".into());
        }
        Ok(())
    }
}

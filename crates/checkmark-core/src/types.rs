// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for answer-sheet grading.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CheckmarkError;

/// Questions printed in one answer box (grid rows).
pub const QUESTIONS_PER_BOX: usize = 5;

/// Options per question (grid columns A–D).
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Most answer boxes a single page may carry.
pub const MAX_BOXES: usize = 4;

/// One of the four options a student can mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub const ALL: [Choice; OPTIONS_PER_QUESTION] = [Choice::A, Choice::B, Choice::C, Choice::D];

    /// Zero-based grid column of this option.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Option for a zero-based grid column, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Upper-case letter for this option.
    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Parse a letter (`a`–`d`, any case) or a column digit (`0`–`3`).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' | '0' => Some(Self::A),
            'B' | '1' => Some(Self::B),
            'C' | '2' => Some(Self::C),
            'D' | '3' => Some(Self::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The resolved decision for one question. `None` means blank or ambiguous.
pub type Answer = Option<Choice>;

/// Render an answer as its letter, or `-` when blank.
pub fn answer_label(answer: Answer) -> char {
    answer.map_or('-', Choice::letter)
}

/// Expected answers for a sheet, in absolute question order.
///
/// Question `n` of box `b` lives at index `b * QUESTIONS_PER_BOX + n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey(Vec<Choice>);

impl AnswerKey {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self(choices)
    }

    /// Build a key from zero-based option indices, the form the sheet's QR
    /// payload carries.
    pub fn from_indices(indices: &[usize]) -> Result<Self, CheckmarkError> {
        indices
            .iter()
            .enumerate()
            .map(|(question, &index)| {
                Choice::from_index(index).ok_or_else(|| {
                    CheckmarkError::InvalidAnswerKey(format!(
                        "question {} has option index {}, expected 0-3",
                        question + 1,
                        index
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, question: usize) -> Option<Choice> {
        self.0.get(question).copied()
    }

    pub fn as_slice(&self) -> &[Choice] {
        &self.0
    }
}

impl FromStr for AnswerKey {
    type Err = CheckmarkError;

    /// Accepts letters (`"ABCD DCBA"`) or indices (`"0 1 2 3"`). Whitespace
    /// and commas are separators and are skipped, so `"A,B, C"` and `"0,1,2"`
    /// parse too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choices = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .enumerate()
            .map(|(position, c)| {
                Choice::from_char(c).ok_or_else(|| {
                    CheckmarkError::InvalidAnswerKey(format!(
                        "unexpected character '{}' at position {}",
                        c,
                        position + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if choices.is_empty() {
            return Err(CheckmarkError::InvalidAnswerKey("answer key is empty".into()));
        }
        Ok(Self(choices))
    }
}

/// Aggregate grading outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Questions answered correctly.
    pub points: usize,
    /// Questions graded.
    pub max_points: usize,
    /// Questions left blank or unreadable.
    pub no_answer: usize,
}

impl Score {
    /// Record one graded question.
    pub fn record(&mut self, given: Answer, expected: Choice) {
        self.max_points += 1;
        if given == Some(expected) {
            self.points += 1;
        } else if given.is_none() {
            self.no_answer += 1;
        }
    }

    /// Fraction of questions answered correctly, 0.0 when nothing was graded.
    pub fn ratio(&self) -> f64 {
        if self.max_points == 0 {
            0.0
        } else {
            self.points as f64 / self.max_points as f64
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.points, self.max_points, self.no_answer)
    }
}

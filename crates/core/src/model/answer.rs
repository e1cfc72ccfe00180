use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::{AnswerId, QuestionId};

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Classification of one validated answer.
///
/// `Partial` only ever applies to multiple-choice questions: a non-empty,
/// wrong-free strict subset of the correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Partial,
    Incorrect,
    Skipped,
}

//
// ─── SESSION ANSWER ────────────────────────────────────────────────────────────
//

/// One record per question the user validated or skipped.
///
/// Records are appended at validation time and never mutated afterwards; the
/// ordered list is the session's ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnswer {
    question_id: QuestionId,
    selected_answer_ids: BTreeSet<AnswerId>,
    time_spent_secs: f64,
    is_correct: bool,
    is_partial: bool,
    is_skipped: bool,
}

impl SessionAnswer {
    /// Builds a record from the classified outcome, so the correctness flags
    /// can never disagree with each other.
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        selected_answer_ids: BTreeSet<AnswerId>,
        time_spent_secs: f64,
        outcome: AnswerOutcome,
    ) -> Self {
        Self {
            question_id,
            selected_answer_ids,
            time_spent_secs: time_spent_secs.max(0.0),
            is_correct: outcome == AnswerOutcome::Correct,
            is_partial: outcome == AnswerOutcome::Partial,
            is_skipped: outcome == AnswerOutcome::Skipped,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_answer_ids(&self) -> &BTreeSet<AnswerId> {
        &self.selected_answer_ids
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> f64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.is_skipped
    }

    /// Reconstructs the outcome this record was built from.
    #[must_use]
    pub fn outcome(&self) -> AnswerOutcome {
        if self.is_skipped {
            AnswerOutcome::Skipped
        } else if self.is_correct {
            AnswerOutcome::Correct
        } else if self.is_partial {
            AnswerOutcome::Partial
        } else {
            AnswerOutcome::Incorrect
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::{AnswerId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two answer choices, got {got}")]
    TooFewAnswers { got: usize },

    #[error("duplicate answer id: {0}")]
    DuplicateAnswerId(AnswerId),

    #[error("single-choice question needs exactly one correct answer, got {got}")]
    SingleChoiceCorrectCount { got: usize },

    #[error("multiple-choice question needs at least one correct answer")]
    MultipleChoiceWithoutCorrect,

    #[error("difficulty must be between 1 and 5, got {got}")]
    InvalidDifficulty { got: u8 },

    #[error("point weight must be finite and positive")]
    InvalidPointWeight,

    #[error("unknown question kind: {0}")]
    UnknownKind(String),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Whether a question accepts one answer or a set of answers.
///
/// `Single` questions use radio semantics (selecting replaces), `Multiple`
/// questions use checkbox semantics (selecting toggles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl QuestionKind {
    /// Stable string form, used by storage backends.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QuestionKind::Single),
            "multiple" => Ok(QuestionKind::Multiple),
            other => Err(QuestionError::UnknownKind(other.to_string())),
        }
    }
}

//
// ─── ANSWER CHOICE ─────────────────────────────────────────────────────────────
//

/// One selectable answer of a question.
///
/// Correctness travels with the choice itself so reordering the list never
/// changes which answers are right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerChoice {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
}

impl AnswerChoice {
    #[must_use]
    pub fn new(id: AnswerId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single exam question with its ordered answer choices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    id: QuestionId,
    theme: String,
    sub_theme: String,
    prompt: String,
    image: Option<Url>,
    answers: Vec<AnswerChoice>,
    kind: QuestionKind,
    explanation: Option<String>,
    difficulty: Option<u8>,
    point_weight: Option<f64>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is empty, fewer than two
    /// choices are given, answer ids collide, the correct-answer count does
    /// not fit the kind, or difficulty/point weight are out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: QuestionId,
        theme: impl Into<String>,
        sub_theme: impl Into<String>,
        prompt: impl Into<String>,
        image: Option<Url>,
        answers: Vec<AnswerChoice>,
        kind: QuestionKind,
        explanation: Option<String>,
        difficulty: Option<u8>,
        point_weight: Option<f64>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if answers.len() < 2 {
            return Err(QuestionError::TooFewAnswers { got: answers.len() });
        }

        let mut seen = BTreeSet::new();
        for answer in &answers {
            if !seen.insert(answer.id) {
                return Err(QuestionError::DuplicateAnswerId(answer.id));
            }
        }

        let correct = answers.iter().filter(|a| a.is_correct).count();
        match kind {
            QuestionKind::Single if correct != 1 => {
                return Err(QuestionError::SingleChoiceCorrectCount { got: correct });
            }
            QuestionKind::Multiple if correct == 0 => {
                return Err(QuestionError::MultipleChoiceWithoutCorrect);
            }
            _ => {}
        }

        if let Some(d) = difficulty {
            if !(1..=5).contains(&d) {
                return Err(QuestionError::InvalidDifficulty { got: d });
            }
        }
        if let Some(w) = point_weight {
            if !w.is_finite() || w <= 0.0 {
                return Err(QuestionError::InvalidPointWeight);
            }
        }

        let explanation = explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Self {
            id,
            theme: theme.into(),
            sub_theme: sub_theme.into(),
            prompt: prompt.trim().to_owned(),
            image,
            answers,
            kind,
            explanation,
            difficulty,
            point_weight,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    #[must_use]
    pub fn sub_theme(&self) -> &str {
        &self.sub_theme
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image(&self) -> Option<&Url> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerChoice] {
        &self.answers
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<u8> {
        self.difficulty
    }

    #[must_use]
    pub fn point_weight(&self) -> Option<f64> {
        self.point_weight
    }

    /// Ids of all correct answers.
    #[must_use]
    pub fn correct_answer_ids(&self) -> BTreeSet<AnswerId> {
        self.answers
            .iter()
            .filter(|a| a.is_correct)
            .map(|a| a.id)
            .collect()
    }

    /// Returns true if `answer_id` names one of this question's choices.
    #[must_use]
    pub fn has_answer(&self, answer_id: AnswerId) -> bool {
        self.answers.iter().any(|a| a.id == answer_id)
    }

    /// Permute the answer choices in place.
    ///
    /// The closure may only reorder the slice; choices cannot be added or
    /// removed, so the validation invariants survive any permutation.
    pub fn reorder_answers_with(&mut self, f: impl FnOnce(&mut [AnswerChoice])) {
        f(&mut self.answers);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

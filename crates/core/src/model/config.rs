use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::QuestionKind;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("session needs at least one theme selection")]
    NoThemes,

    #[error("question count must be > 0")]
    ZeroQuestionCount,

    #[error("seconds per question must be between 5 and 600")]
    InvalidTimerSeconds,

    #[error("scoring table values must be finite")]
    NonFiniteScore,

    #[error("points for a correct answer must be >= 0")]
    NegativeCorrectScore,
}

//
// ─── SCORING TABLE ─────────────────────────────────────────────────────────────
//

/// Configurable point values per answer outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    correct: f64,
    incorrect: f64,
    skipped: f64,
    partial: f64,
}

impl ScoringTable {
    /// Creates a validated scoring table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NonFiniteScore` for NaN/infinite values and
    /// `ConfigError::NegativeCorrectScore` when correct answers would cost
    /// points.
    pub fn new(correct: f64, incorrect: f64, skipped: f64, partial: f64) -> Result<Self, ConfigError> {
        for value in [correct, incorrect, skipped, partial] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteScore);
            }
        }
        if correct < 0.0 {
            return Err(ConfigError::NegativeCorrectScore);
        }

        Ok(Self {
            correct,
            incorrect,
            skipped,
            partial,
        })
    }

    /// The exam preset: 1 point per correct answer, -0.25 per mistake,
    /// half credit for partially correct multiple-choice answers.
    #[must_use]
    pub fn exam_preset() -> Self {
        Self {
            correct: 1.0,
            incorrect: -0.25,
            skipped: 0.0,
            partial: 0.5,
        }
    }

    #[must_use]
    pub fn correct(&self) -> f64 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> f64 {
        self.incorrect
    }

    #[must_use]
    pub fn skipped(&self) -> f64 {
        self.skipped
    }

    #[must_use]
    pub fn partial(&self) -> f64 {
        self.partial
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self::exam_preset()
    }
}

//
// ─── FILTERS ───────────────────────────────────────────────────────────────────
//

/// How many questions a session should run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCount {
    Limited(u32),
    Unlimited,
}

impl QuestionCount {
    /// The cap as an option, `None` meaning unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        match self {
            QuestionCount::Limited(n) => Some(*n),
            QuestionCount::Unlimited => None,
        }
    }
}

/// Restricts a session to one question kind, or allows both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    All,
    SingleOnly,
    MultipleOnly,
}

impl KindFilter {
    #[must_use]
    pub fn matches(&self, kind: QuestionKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::SingleOnly => kind == QuestionKind::Single,
            KindFilter::MultipleOnly => kind == QuestionKind::Multiple,
        }
    }
}

/// One theme picked in the configuration step, with the sub-themes to include
/// and how many questions the backend reports as available for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSelection {
    pub theme: String,
    pub sub_themes: Vec<String>,
    pub available: u32,
}

impl ThemeSelection {
    #[must_use]
    pub fn new(theme: impl Into<String>, sub_themes: Vec<String>, available: u32) -> Self {
        Self {
            theme: theme.into(),
            sub_themes,
            available,
        }
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Immutable configuration of one training session.
///
/// Produced once by the configuration step; the engine reads it and never
/// mutates or re-derives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    themes: Vec<ThemeSelection>,
    count: QuestionCount,
    timer_enabled: bool,
    seconds_per_question: u32,
    scoring: ScoringTable,
    kind_filter: KindFilter,
    review_mode: bool,
}

impl SessionConfig {
    /// Creates a validated session configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when no theme is selected, the question count is
    /// zero, or the timer duration is outside 5..=600 seconds while the timer
    /// is enabled.
    pub fn new(
        themes: Vec<ThemeSelection>,
        count: QuestionCount,
        timer_enabled: bool,
        seconds_per_question: u32,
        scoring: ScoringTable,
        kind_filter: KindFilter,
    ) -> Result<Self, ConfigError> {
        if themes.is_empty() {
            return Err(ConfigError::NoThemes);
        }
        if count == QuestionCount::Limited(0) {
            return Err(ConfigError::ZeroQuestionCount);
        }
        if timer_enabled && !(5..=600).contains(&seconds_per_question) {
            return Err(ConfigError::InvalidTimerSeconds);
        }

        Ok(Self {
            themes,
            count,
            timer_enabled,
            seconds_per_question,
            scoring,
            kind_filter,
            review_mode: false,
        })
    }

    /// Derives the configuration for a "review mistakes" re-run: same themes
    /// and scoring, timer off, free navigation enabled.
    #[must_use]
    pub fn review_variant(&self) -> Self {
        let mut config = self.clone();
        config.timer_enabled = false;
        config.review_mode = true;
        config
    }

    // Accessors
    #[must_use]
    pub fn themes(&self) -> &[ThemeSelection] {
        &self.themes
    }

    #[must_use]
    pub fn count(&self) -> QuestionCount {
        self.count
    }

    #[must_use]
    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled && !self.review_mode
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn scoring(&self) -> &ScoringTable {
        &self.scoring
    }

    #[must_use]
    pub fn kind_filter(&self) -> KindFilter {
        self.kind_filter
    }

    #[must_use]
    pub fn review_mode(&self) -> bool {
        self.review_mode
    }

    /// Whether `other` describes the same run shape: same themes, count and
    /// kind filter. Scoring tweaks do not orphan a resumable session.
    #[must_use]
    pub fn same_shape(&self, other: &SessionConfig) -> bool {
        self.themes == other.themes
            && self.count == other.count
            && self.kind_filter == other.kind_filter
            && self.review_mode == other.review_mode
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

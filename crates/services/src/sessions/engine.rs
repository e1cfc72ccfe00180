use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use drill_core::model::{
    AnswerId, Question, QuestionKind, SessionAnswer, SessionConfig, SessionSnapshot,
};
use drill_core::scoring::{self, ValidationTrigger};
use drill_core::time::seconds_between;

use crate::error::SessionError;
use super::progress::SessionProgress;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Explicit run-time phase of a session.
///
/// Encoding the per-question sub-state in the phase makes invalid transitions
/// (validating twice, advancing before validating) unrepresentable instead of
/// guarded ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active { validated: bool },
    Paused { was_validated: bool },
    Completed,
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// No countdown is running (timer disabled, question validated, paused
    /// or completed).
    Idle,
    /// Seconds left for the current question.
    Running(u32),
    /// The countdown just hit zero; the caller should validate with
    /// `ValidationTrigger::TimedOut`. Returned exactly once per question.
    Expired,
}

//
// ─── TRAINING SESSION ──────────────────────────────────────────────────────────
//

/// The authoritative state of one run through a configured question list.
///
/// Steps through the questions sequentially, classifying each validated
/// selection via the scoring engine and appending one immutable
/// `SessionAnswer` per question.
pub struct TrainingSession {
    config: SessionConfig,
    questions: Vec<Question>,
    current: usize,
    selected: BTreeSet<AnswerId>,
    answers: Vec<SessionAnswer>,
    phase: Phase,
    total_points: f64,
    streak: u32,
    best_streak: u32,
    remaining_secs: Option<u32>,
    question_elapsed_secs: f64,
    question_started_at: Option<DateTime<Utc>>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    abandoned: bool,
}

impl TrainingSession {
    /// Create a session over the provided questions.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic. The list is truncated to the configured count.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided; the
    /// machine refuses to start rather than creating a partial session.
    pub fn new(
        config: SessionConfig,
        mut questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if let Some(limit) = config.count().limit() {
            questions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let remaining_secs = timer_duration(&config);
        Ok(Self {
            config,
            questions,
            current: 0,
            selected: BTreeSet::new(),
            answers: Vec::new(),
            phase: Phase::Active { validated: false },
            total_points: 0.0,
            streak: 0,
            best_streak: 0,
            remaining_secs,
            question_elapsed_secs: 0.0,
            question_started_at: Some(started_at),
            started_at,
            completed_at: None,
            abandoned: false,
        })
    }

    // Accessors
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<AnswerId> {
        &self.selected
    }

    #[must_use]
    pub fn answers(&self) -> &[SessionAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn total_points(&self) -> f64 {
        self.total_points
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed && !self.abandoned
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused { .. })
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Whether the current question has been validated.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        matches!(
            self.phase,
            Phase::Active { validated: true } | Phase::Paused { was_validated: true }
        )
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            remaining: self.questions.len().saturating_sub(self.answers.len()),
            is_complete: self.is_complete(),
            total_points: self.total_points,
            streak: self.streak,
        }
    }

    //
    // ─── SELECTION ─────────────────────────────────────────────────────────
    //

    /// Toggle an answer of the current question.
    ///
    /// Single-choice questions use radio semantics (selecting replaces any
    /// prior selection), multiple-choice questions use checkbox semantics.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyValidated` once the question is
    /// validated; selections become immutable at that point. Also errors
    /// while paused or completed, or for an id the question does not carry.
    pub fn toggle_answer(&mut self, answer_id: AnswerId) -> Result<(), SessionError> {
        self.require_unvalidated()?;

        let question = self
            .current_question()
            .ok_or(SessionError::Completed)?;
        if !question.has_answer(answer_id) {
            return Err(SessionError::UnknownAnswer(answer_id));
        }

        match question.kind() {
            QuestionKind::Single => {
                self.selected.clear();
                self.selected.insert(answer_id);
            }
            QuestionKind::Multiple => {
                if !self.selected.remove(&answer_id) {
                    self.selected.insert(answer_id);
                }
            }
        }
        Ok(())
    }

    //
    // ─── VALIDATE / ADVANCE ────────────────────────────────────────────────
    //

    /// Validate the current question.
    ///
    /// Timeout and skip triggers force an empty selection, which classifies
    /// as skipped. Exactly one `SessionAnswer` is appended per question; a
    /// second validate (double-tap, late timer) fails instead of recording
    /// twice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` for a manual validate without a
    /// selection, `SessionError::AlreadyValidated` for a repeat, and phase
    /// errors while paused or completed.
    pub fn validate(
        &mut self,
        trigger: ValidationTrigger,
        now: DateTime<Utc>,
    ) -> Result<&SessionAnswer, SessionError> {
        self.require_unvalidated()?;
        if self.answers.len() > self.current {
            return Err(SessionError::AlreadyValidated);
        }

        if trigger.forces_empty_selection() {
            self.selected.clear();
        } else if self.selected.is_empty() {
            return Err(SessionError::NoSelection);
        }

        let question = &self.questions[self.current];
        let outcome = scoring::classify(question, &self.selected);

        let time_spent = self.question_elapsed_secs
            + self
                .question_started_at
                .map_or(0.0, |since| seconds_between(since, now));

        let answer =
            SessionAnswer::new(question.id(), self.selected.clone(), time_spent, outcome);

        self.total_points += answer_points(&answer, &self.config);
        if answer.is_correct() {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }

        self.answers.push(answer);
        self.phase = Phase::Active { validated: true };
        self.question_started_at = None;

        self.answers.last().ok_or(SessionError::Completed)
    }

    /// Move past a validated question.
    ///
    /// Returns `true` when the session just completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotValidated` when the current question has
    /// not been validated, and phase errors while paused or completed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        match self.phase {
            Phase::Active { validated: true } => {}
            Phase::Active { validated: false } => return Err(SessionError::NotValidated),
            Phase::Paused { .. } => return Err(SessionError::Paused),
            Phase::Completed => return Err(SessionError::Completed),
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.enter_question(now);
            Ok(false)
        } else {
            self.phase = Phase::Completed;
            self.completed_at = Some(now);
            self.remaining_secs = None;
            Ok(true)
        }
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────
    //

    /// Advance the per-question countdown by one second.
    ///
    /// Ticks are no-ops outside `Active`/unvalidated, so a callback firing
    /// after validation, pause or completion cannot corrupt state.
    pub fn tick(&mut self) -> TimerTick {
        if self.phase != (Phase::Active { validated: false }) {
            return TimerTick::Idle;
        }
        let Some(remaining) = self.remaining_secs else {
            return TimerTick::Idle;
        };
        if remaining == 0 {
            return TimerTick::Idle;
        }

        let remaining = remaining - 1;
        self.remaining_secs = Some(remaining);
        if remaining == 0 {
            TimerTick::Expired
        } else {
            TimerTick::Running(remaining)
        }
    }

    //
    // ─── PAUSE / RESUME / ABANDON ──────────────────────────────────────────
    //

    /// Suspend the session, freezing the countdown and elapsed time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Paused` if already paused or
    /// `SessionError::Completed` after completion.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active { validated } => {
                if let Some(since) = self.question_started_at.take() {
                    self.question_elapsed_secs += seconds_between(since, now);
                }
                self.phase = Phase::Paused {
                    was_validated: validated,
                };
                Ok(())
            }
            Phase::Paused { .. } => Err(SessionError::Paused),
            Phase::Completed => Err(SessionError::Completed),
        }
    }

    /// Return from pause to the exact sub-state the session was in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPaused` unless the session is paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.phase {
            Phase::Paused { was_validated } => {
                self.phase = Phase::Active {
                    validated: was_validated,
                };
                if !was_validated {
                    self.question_started_at = Some(now);
                }
                Ok(())
            }
            _ => Err(SessionError::NotPaused),
        }
    }

    /// Terminate a paused session without producing a report.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPaused` unless the session is paused.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Paused { .. } => {
                self.phase = Phase::Completed;
                self.abandoned = true;
                Ok(())
            }
            _ => Err(SessionError::NotPaused),
        }
    }

    //
    // ─── REVIEW NAVIGATION ─────────────────────────────────────────────────
    //

    /// Jump to a question, available in review mode only.
    ///
    /// Navigation may reach any already-validated question (read-only) and
    /// the first unanswered one; revisited questions keep their recorded
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NavigationUnavailable` outside review mode and
    /// `SessionError::NavigationOutOfRange` past the answered frontier.
    pub fn go_to(&mut self, index: usize, now: DateTime<Utc>) -> Result<(), SessionError> {
        if !self.config.review_mode() {
            return Err(SessionError::NavigationUnavailable);
        }
        match self.phase {
            Phase::Active { .. } => {}
            Phase::Paused { .. } => return Err(SessionError::Paused),
            Phase::Completed => return Err(SessionError::Completed),
        }
        if index >= self.questions.len() || index > self.answers.len() {
            return Err(SessionError::NavigationOutOfRange(index));
        }

        self.current = index;
        self.enter_question(now);
        Ok(())
    }

    //
    // ─── SNAPSHOT ──────────────────────────────────────────────────────────
    //

    /// Capture the resumable state.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot::new(
            self.current,
            self.answers.clone(),
            self.config.clone(),
            self.total_points,
            self.streak,
            now,
        )
    }

    /// Apply a previously captured snapshot onto this freshly started
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SnapshotMismatch` when the snapshot was taken
    /// for a different config shape or does not fit the question list.
    pub fn restore_from(
        &mut self,
        snapshot: &SessionSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if !snapshot.matches_config(&self.config) {
            return Err(SessionError::SnapshotMismatch);
        }
        let index = snapshot.current_index();
        let answered = snapshot.answers().len();
        if index >= self.questions.len() || (answered != index && answered != index + 1) {
            return Err(SessionError::SnapshotMismatch);
        }

        self.current = index;
        self.answers = snapshot.answers().to_vec();
        self.total_points = snapshot.total_points();
        self.streak = snapshot.streak();
        self.best_streak = self.best_streak.max(self.streak);
        self.enter_question(now);
        Ok(())
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────
    //

    /// Sync sub-state, selection and timer after the current index changed.
    fn enter_question(&mut self, now: DateTime<Utc>) {
        let validated = self.answers.len() > self.current;
        self.phase = Phase::Active { validated };
        self.question_elapsed_secs = 0.0;
        if validated {
            self.selected = self.answers[self.current].selected_answer_ids().clone();
            self.question_started_at = None;
            self.remaining_secs = None;
        } else {
            self.selected.clear();
            self.question_started_at = Some(now);
            self.remaining_secs = timer_duration(&self.config);
        }
    }

    fn require_unvalidated(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active { validated: false } => Ok(()),
            Phase::Active { validated: true } => Err(SessionError::AlreadyValidated),
            Phase::Paused { .. } => Err(SessionError::Paused),
            Phase::Completed => Err(SessionError::Completed),
        }
    }
}

fn timer_duration(config: &SessionConfig) -> Option<u32> {
    config.timer_enabled().then(|| config.seconds_per_question())
}

fn answer_points(answer: &SessionAnswer, config: &SessionConfig) -> f64 {
    let scoring = config.scoring();
    if answer.is_skipped() {
        scoring.skipped()
    } else if answer.is_correct() {
        scoring.correct()
    } else if answer.is_partial() {
        scoring.partial()
    } else {
        scoring.incorrect()
    }
}

impl fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("phase", &self.phase)
            .field("total_points", &self.total_points)
            .field("streak", &self.streak)
            .field("remaining_secs", &self.remaining_secs)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

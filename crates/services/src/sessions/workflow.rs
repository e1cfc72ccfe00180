use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use drill_core::model::{
    Question, SessionAnswer, SessionConfig, SessionSnapshot, UserId,
};
use drill_core::report::SessionReport;
use drill_core::scoring::ValidationTrigger;
use drill_core::time::Clock;
use storage::repository::SnapshotRepository;

use crate::error::SessionError;
use crate::questions::QuestionProvider;
use super::engine::TrainingSession;
use super::progress::SessionProgress;

//
// ─── RESULT TYPES ──────────────────────────────────────────────────────────────
//

/// Outcome of starting a session.
///
/// When a fresh snapshot for the same run shape exists, the caller must offer
/// the user the choice: apply it with [`SessionLoopService::accept_resume`]
/// or drop it with [`SessionLoopService::decline_resume`].
pub enum SessionStart {
    Fresh(TrainingSession),
    Resumable {
        session: TrainingSession,
        snapshot: SessionSnapshot,
    },
}

impl SessionStart {
    /// The session regardless of resumability, discarding the offer.
    #[must_use]
    pub fn into_session(self) -> TrainingSession {
        match self {
            SessionStart::Fresh(session) | SessionStart::Resumable { session, .. } => session,
        }
    }
}

/// Result of validating a single question.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub answer: SessionAnswer,
    pub progress: SessionProgress,
}

/// Result of advancing past a validated question.
pub enum SessionAdvance {
    Continued(SessionProgress),
    Completed(CompletedSession),
}

/// The serializable handoff to the results screen.
///
/// Everything the UI needs to render the report, share a summary, or start a
/// "review mistakes" re-run.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedSession {
    pub answers: Vec<SessionAnswer>,
    pub config: SessionConfig,
    pub questions: Vec<Question>,
}

impl CompletedSession {
    /// Build the final report.
    ///
    /// `streak` and `prior_points` are supplied by the caller (streak
    /// tracking and cumulative totals live outside the engine).
    #[must_use]
    pub fn report(&self, streak: u32, prior_points: f64) -> SessionReport {
        SessionReport::build(&self.answers, &self.questions, &self.config, streak, prior_points)
    }

    /// Questions the user did not answer fully correctly.
    #[must_use]
    pub fn mistake_questions(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|question| {
                self.answers
                    .iter()
                    .any(|a| a.question_id() == question.id() && !a.is_correct())
            })
            .cloned()
            .collect()
    }
}

//
// ─── SESSION LOOP ──────────────────────────────────────────────────────────────
//

/// Orchestrates the engine, question provider and snapshot store.
///
/// Snapshots are written after every validated answer and on pause, and
/// nowhere else; writes are best-effort so persistence trouble never blocks
/// the session itself.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    provider: QuestionProvider,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        provider: QuestionProvider,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        Self {
            clock,
            provider,
            snapshots,
        }
    }

    /// Start a session, offering resume when a usable snapshot exists.
    ///
    /// A stale snapshot is proactively cleared and never offered; a snapshot
    /// for a different run shape is left alone. Snapshot-store trouble
    /// degrades to a fresh start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if not even the fallback sample set
    /// yields a question for this configuration.
    pub async fn start(
        &self,
        user: UserId,
        config: SessionConfig,
    ) -> Result<SessionStart, SessionError> {
        let questions = self.provider.fetch(&config).await;
        let now = self.clock.now();
        let session = TrainingSession::new(config.clone(), questions, now)?;

        match self.snapshots.load_snapshot(user).await {
            Ok(Some(snapshot)) if !snapshot.is_fresh(now) => {
                debug!(%user, "clearing expired session snapshot");
                if let Err(err) = self.snapshots.clear_snapshot(user).await {
                    warn!(%user, error = %err, "failed to clear expired snapshot");
                }
                Ok(SessionStart::Fresh(session))
            }
            Ok(Some(snapshot)) if snapshot.matches_config(&config) => {
                Ok(SessionStart::Resumable { session, snapshot })
            }
            Ok(_) => Ok(SessionStart::Fresh(session)),
            Err(err) => {
                warn!(%user, error = %err, "snapshot load failed, starting fresh");
                Ok(SessionStart::Fresh(session))
            }
        }
    }

    /// Apply an offered snapshot onto the freshly started session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SnapshotMismatch` when the snapshot no longer
    /// fits the session.
    pub fn accept_resume(
        &self,
        session: &mut TrainingSession,
        snapshot: &SessionSnapshot,
    ) -> Result<(), SessionError> {
        session.restore_from(snapshot, self.clock.now())
    }

    /// Drop an offered snapshot; declining a resume discards it for good.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the snapshot cannot be deleted.
    pub async fn decline_resume(&self, user: UserId) -> Result<(), SessionError> {
        self.snapshots.clear_snapshot(user).await?;
        Ok(())
    }

    /// Validate the current question from an explicit user answer.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::validate`].
    pub async fn submit_answer(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<SessionAnswerResult, SessionError> {
        self.validate_with(user, session, ValidationTrigger::Answered)
            .await
    }

    /// Validate the current question as explicitly skipped.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::validate`].
    pub async fn skip(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<SessionAnswerResult, SessionError> {
        self.validate_with(user, session, ValidationTrigger::Skipped)
            .await
    }

    /// Validate the current question after its countdown expired.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::validate`].
    pub async fn handle_timeout(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<SessionAnswerResult, SessionError> {
        self.validate_with(user, session, ValidationTrigger::TimedOut)
            .await
    }

    async fn validate_with(
        &self,
        user: UserId,
        session: &mut TrainingSession,
        trigger: ValidationTrigger,
    ) -> Result<SessionAnswerResult, SessionError> {
        let now = self.clock.now();
        let answer = session.validate(trigger, now)?.clone();
        self.persist(user, session).await;
        Ok(SessionAnswerResult {
            answer,
            progress: session.progress(),
        })
    }

    /// Move to the next question, or finish the session.
    ///
    /// Completion clears the stored snapshot and hands back the serializable
    /// results payload.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::advance`].
    pub async fn advance(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<SessionAdvance, SessionError> {
        let completed = session.advance(self.clock.now())?;
        if !completed {
            return Ok(SessionAdvance::Continued(session.progress()));
        }

        if let Err(err) = self.snapshots.clear_snapshot(user).await {
            warn!(%user, error = %err, "failed to clear snapshot after completion");
        }
        Ok(SessionAdvance::Completed(CompletedSession {
            answers: session.answers().to_vec(),
            config: session.config().clone(),
            questions: session.questions().to_vec(),
        }))
    }

    /// Pause the session and persist a snapshot.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::pause`].
    pub async fn pause(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<(), SessionError> {
        session.pause(self.clock.now())?;
        self.persist(user, session).await;
        Ok(())
    }

    /// Resume a paused session in place. No snapshot is written; the paused
    /// one stays valid until the next answer.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; see [`TrainingSession::resume`].
    pub fn resume(&self, session: &mut TrainingSession) -> Result<(), SessionError> {
        session.resume(self.clock.now())
    }

    /// Abandon a paused session: discard the snapshot, produce no report.
    ///
    /// # Errors
    ///
    /// Returns engine errors when the session is not paused, or
    /// `SessionError::Storage` if the snapshot cannot be discarded.
    pub async fn abandon(
        &self,
        user: UserId,
        session: &mut TrainingSession,
    ) -> Result<(), SessionError> {
        session.abandon()?;
        self.snapshots.clear_snapshot(user).await?;
        Ok(())
    }

    /// Re-run the mistakes of a completed session through the engine with
    /// review mode on (timer off, free navigation).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when there are no mistakes to review.
    pub fn start_review_session(
        &self,
        completed: &CompletedSession,
    ) -> Result<TrainingSession, SessionError> {
        TrainingSession::new(
            completed.config.review_variant(),
            completed.mistake_questions(),
            self.clock.now(),
        )
    }

    /// Best-effort snapshot write; storage trouble is logged, never blocks
    /// session progress.
    async fn persist(&self, user: UserId, session: &TrainingSession) {
        let snapshot = session.snapshot(self.clock.now());
        match self.snapshots.save_snapshot(user, &snapshot).await {
            Ok(()) => debug!(%user, index = snapshot.current_index(), "session snapshot saved"),
            Err(err) => warn!(%user, error = %err, "snapshot write failed, continuing without"),
        }
    }
}

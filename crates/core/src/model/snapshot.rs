use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::SessionAnswer;
use crate::model::config::SessionConfig;

/// How long a paused session stays resumable, in hours.
pub const RESUME_WINDOW_HOURS: i64 = 24;

/// How long a paused session stays resumable.
#[must_use]
pub fn resume_window() -> Duration {
    Duration::hours(RESUME_WINDOW_HOURS)
}

/// Serializable resumable state of an in-progress session.
///
/// Written after every validated answer and on pause; deleted on completion
/// or when the user abandons the session. A snapshot older than the resume
/// window must be treated as absent, never silently reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    current_index: usize,
    answers: Vec<SessionAnswer>,
    config: SessionConfig,
    total_points: f64,
    streak: u32,
    saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(
        current_index: usize,
        answers: Vec<SessionAnswer>,
        config: SessionConfig,
        total_points: f64,
        streak: u32,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            current_index,
            answers,
            config,
            total_points,
            streak,
            saved_at,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &[SessionAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
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
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    /// Whether this snapshot is still inside the resume window.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.saved_at) <= resume_window()
    }

    /// Whether this snapshot was taken for the same run shape as `config`.
    #[must_use]
    pub fn matches_config(&self, config: &SessionConfig) -> bool {
        self.config.same_shape(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KindFilter, QuestionCount, ScoringTable, ThemeSelection};
    use crate::time::fixed_now;

    fn config() -> SessionConfig {
        SessionConfig::new(
            vec![ThemeSelection::new("Rescue operations", vec![], 25)],
            QuestionCount::Limited(10),
            false,
            30,
            ScoringTable::exam_preset(),
            KindFilter::All,
        )
        .unwrap()
    }

    fn snapshot_at(saved_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot::new(2, Vec::new(), config(), 1.5, 2, saved_at)
    }

    #[test]
    fn snapshot_is_fresh_within_23_hours() {
        let snap = snapshot_at(fixed_now());
        assert!(snap.is_fresh(fixed_now() + Duration::hours(23)));
    }

    #[test]
    fn snapshot_is_stale_after_25_hours() {
        let snap = snapshot_at(fixed_now());
        assert!(!snap.is_fresh(fixed_now() + Duration::hours(25)));
    }

    #[test]
    fn snapshot_matches_same_shape_config() {
        let snap = snapshot_at(fixed_now());
        assert!(snap.matches_config(&config()));

        let other = SessionConfig::new(
            vec![ThemeSelection::new("Equipment", vec![], 12)],
            QuestionCount::Limited(10),
            false,
            30,
            ScoringTable::exam_preset(),
            KindFilter::All,
        )
        .unwrap();
        assert!(!snap.matches_config(&other));
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let snap = snapshot_at(fixed_now());
        let json = serde_json::to_string(&snap).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}

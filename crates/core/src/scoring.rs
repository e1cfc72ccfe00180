//! Pure scoring: per-question outcome classification and session-level
//! point aggregation with bonus tiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{AnswerId, AnswerOutcome, Question, QuestionKind, ScoringTable, SessionAnswer};

//
// ─── VALIDATION TRIGGER ────────────────────────────────────────────────────────
//

/// What caused a question to be validated.
///
/// Timeouts and explicit skips force an empty selection before
/// classification, so they always classify as skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationTrigger {
    Answered,
    Skipped,
    TimedOut,
}

impl ValidationTrigger {
    #[must_use]
    pub fn forces_empty_selection(self) -> bool {
        matches!(self, ValidationTrigger::Skipped | ValidationTrigger::TimedOut)
    }
}

//
// ─── CLASSIFICATION ────────────────────────────────────────────────────────────
//

/// Classifies a selection against a question.
///
/// - empty selection is always `Skipped`;
/// - single choice: correct iff exactly the one correct id is selected;
/// - multiple choice: correct iff the selected set equals the correct set;
///   partial iff the selection is a non-empty strict subset of the correct
///   set with no wrong id. Any wrong id makes the answer incorrect, never
///   partial.
#[must_use]
pub fn classify(question: &Question, selected: &BTreeSet<AnswerId>) -> AnswerOutcome {
    if selected.is_empty() {
        return AnswerOutcome::Skipped;
    }

    let correct = question.correct_answer_ids();
    match question.kind() {
        QuestionKind::Single => {
            if selected.len() == 1 && selected.iter().all(|id| correct.contains(id)) {
                AnswerOutcome::Correct
            } else {
                AnswerOutcome::Incorrect
            }
        }
        QuestionKind::Multiple => {
            if *selected == correct {
                AnswerOutcome::Correct
            } else if selected.is_subset(&correct) {
                AnswerOutcome::Partial
            } else {
                AnswerOutcome::Incorrect
            }
        }
    }
}

//
// ─── OUTCOME COUNTS ────────────────────────────────────────────────────────────
//

/// Per-outcome tallies over a finished answer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub correct: u32,
    pub partial: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

impl OutcomeCounts {
    #[must_use]
    pub fn from_answers(answers: &[SessionAnswer]) -> Self {
        let mut counts = Self::default();
        for answer in answers {
            match answer.outcome() {
                AnswerOutcome::Correct => counts.correct = counts.correct.saturating_add(1),
                AnswerOutcome::Partial => counts.partial = counts.partial.saturating_add(1),
                AnswerOutcome::Incorrect => counts.incorrect = counts.incorrect.saturating_add(1),
                AnswerOutcome::Skipped => counts.skipped = counts.skipped.saturating_add(1),
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct + self.partial + self.incorrect + self.skipped
    }

    /// Fraction of fully correct answers over all answers, 0.0 when empty.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(total)
    }
}

//
// ─── BASE SCORE ────────────────────────────────────────────────────────────────
//

/// Weighted sum of outcome counts, clamped to a minimum of zero.
#[must_use]
pub fn base_score(counts: OutcomeCounts, scoring: &ScoringTable) -> f64 {
    let sum = f64::from(counts.correct) * scoring.correct()
        + f64::from(counts.partial) * scoring.partial()
        + f64::from(counts.incorrect) * scoring.incorrect()
        + f64::from(counts.skipped) * scoring.skipped();
    sum.max(0.0)
}

//
// ─── BONUSES ───────────────────────────────────────────────────────────────────
//

const PERFORMANCE_HIGH_RATE: f64 = 0.80;
const PERFORMANCE_HIGH_FACTOR: f64 = 0.50;
const PERFORMANCE_MID_RATE: f64 = 0.60;
const PERFORMANCE_MID_FACTOR: f64 = 0.20;

const SPEED_THRESHOLD_SECS: f64 = 5.0;
const SPEED_BONUS_POINTS: f64 = 10.0;

const STREAK_HIGH_TIER: u32 = 7;
const STREAK_HIGH_BONUS: f64 = 15.0;
const STREAK_LOW_TIER: u32 = 3;
const STREAK_LOW_BONUS: f64 = 5.0;

/// Derived point totals for a finished session.
///
/// Always recomputed from the answer list and scoring table; never persisted
/// as the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsBreakdown {
    pub base_points: f64,
    pub performance_bonus: f64,
    pub speed_bonus: f64,
    pub streak_bonus: f64,
    pub total_points: f64,
}

/// Computes the full breakdown over a finished session.
///
/// `streak` is the user's current best correct-answer streak, supplied by an
/// external collaborator (daily streak tracking is not this engine's job).
#[must_use]
pub fn points_breakdown(
    answers: &[SessionAnswer],
    scoring: &ScoringTable,
    streak: u32,
) -> PointsBreakdown {
    let counts = OutcomeCounts::from_answers(answers);
    let base_points = base_score(counts, scoring);

    let rate = counts.success_rate();
    let performance_bonus = if rate >= PERFORMANCE_HIGH_RATE {
        base_points * PERFORMANCE_HIGH_FACTOR
    } else if rate >= PERFORMANCE_MID_RATE {
        base_points * PERFORMANCE_MID_FACTOR
    } else {
        0.0
    };

    let speed_bonus = if answers.is_empty() {
        0.0
    } else {
        let total_time: f64 = answers.iter().map(SessionAnswer::time_spent_secs).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total_time / answers.len() as f64;
        if average < SPEED_THRESHOLD_SECS {
            SPEED_BONUS_POINTS
        } else {
            0.0
        }
    };

    let streak_bonus = if streak >= STREAK_HIGH_TIER {
        STREAK_HIGH_BONUS
    } else if streak >= STREAK_LOW_TIER {
        STREAK_LOW_BONUS
    } else {
        0.0
    };

    let total_points = (base_points + performance_bonus + speed_bonus + streak_bonus).max(0.0);

    PointsBreakdown {
        base_points,
        performance_bonus,
        speed_bonus,
        streak_bonus,
        total_points,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerChoice, QuestionId};

    fn single_question() -> Question {
        Question::new(
            QuestionId::new(1),
            "Fire behavior",
            "Combustion",
            "Which element completes the fire triangle with heat and fuel?",
            None,
            vec![
                AnswerChoice::new(AnswerId::new(1), "Oxygen", true),
                AnswerChoice::new(AnswerId::new(2), "Nitrogen", false),
                AnswerChoice::new(AnswerId::new(3), "Carbon dioxide", false),
            ],
            QuestionKind::Single,
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn multiple_question() -> Question {
        Question::new(
            QuestionId::new(2),
            "Fire behavior",
            "Extinguishing agents",
            "Which agents are suitable for a class B fire?",
            None,
            vec![
                AnswerChoice::new(AnswerId::new(10), "Foam", true),
                AnswerChoice::new(AnswerId::new(11), "Dry powder", true),
                AnswerChoice::new(AnswerId::new(12), "Water jet", false),
            ],
            QuestionKind::Multiple,
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn ids(values: &[u64]) -> BTreeSet<AnswerId> {
        values.iter().map(|v| AnswerId::new(*v)).collect()
    }

    fn answer(outcome: AnswerOutcome, time: f64) -> SessionAnswer {
        SessionAnswer::new(QuestionId::new(1), BTreeSet::new(), time, outcome)
    }

    #[test]
    fn empty_selection_is_skipped() {
        assert_eq!(
            classify(&single_question(), &BTreeSet::new()),
            AnswerOutcome::Skipped
        );
        assert_eq!(
            classify(&multiple_question(), &BTreeSet::new()),
            AnswerOutcome::Skipped
        );
    }

    #[test]
    fn single_choice_matches_unique_correct_id() {
        let question = single_question();
        assert_eq!(classify(&question, &ids(&[1])), AnswerOutcome::Correct);
        assert_eq!(classify(&question, &ids(&[2])), AnswerOutcome::Incorrect);
    }

    #[test]
    fn multiple_choice_exact_set_is_correct() {
        assert_eq!(
            classify(&multiple_question(), &ids(&[10, 11])),
            AnswerOutcome::Correct
        );
    }

    #[test]
    fn multiple_choice_strict_subset_is_partial() {
        assert_eq!(
            classify(&multiple_question(), &ids(&[10])),
            AnswerOutcome::Partial
        );
    }

    #[test]
    fn any_wrong_id_is_incorrect_never_partial() {
        // {10, 12}: one correct, one wrong
        assert_eq!(
            classify(&multiple_question(), &ids(&[10, 12])),
            AnswerOutcome::Incorrect
        );
        // even with all correct ids present
        assert_eq!(
            classify(&multiple_question(), &ids(&[10, 11, 12])),
            AnswerOutcome::Incorrect
        );
    }

    #[test]
    fn base_score_matches_exam_scenario() {
        // 3 single-choice answers: correct, incorrect, skipped
        let answers = vec![
            answer(AnswerOutcome::Correct, 4.0),
            answer(AnswerOutcome::Incorrect, 6.0),
            answer(AnswerOutcome::Skipped, 30.0),
        ];
        let counts = OutcomeCounts::from_answers(&answers);
        let score = base_score(counts, &ScoringTable::exam_preset());
        assert!((score - 0.75).abs() < 1e-9);

        // 33.3% success rate: no performance bonus
        let breakdown = points_breakdown(&answers, &ScoringTable::exam_preset(), 0);
        assert_eq!(breakdown.performance_bonus, 0.0);
    }

    #[test]
    fn base_score_clamps_at_zero() {
        let answers = vec![
            answer(AnswerOutcome::Incorrect, 1.0),
            answer(AnswerOutcome::Incorrect, 1.0),
            answer(AnswerOutcome::Incorrect, 1.0),
        ];
        let counts = OutcomeCounts::from_answers(&answers);
        assert_eq!(base_score(counts, &ScoringTable::exam_preset()), 0.0);

        let breakdown = points_breakdown(&answers, &ScoringTable::exam_preset(), 0);
        assert!(breakdown.total_points >= 0.0);
    }

    #[test]
    fn base_score_is_monotone_in_correct_count() {
        let table = ScoringTable::exam_preset();
        let mut previous = 0.0;
        for correct in 0..10_u32 {
            let counts = OutcomeCounts {
                correct,
                partial: 0,
                incorrect: 2,
                skipped: 1,
            };
            let score = base_score(counts, &table);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn bonuses_match_fast_successful_session() {
        // 5 questions, 4 correct, 1 skipped, avg 3.2s, 10 pts per correct
        let scoring = ScoringTable::new(10.0, 0.0, 0.0, 5.0).unwrap();
        let answers = vec![
            answer(AnswerOutcome::Correct, 3.0),
            answer(AnswerOutcome::Correct, 3.5),
            answer(AnswerOutcome::Correct, 2.8),
            answer(AnswerOutcome::Correct, 3.7),
            answer(AnswerOutcome::Skipped, 3.0),
        ];

        let breakdown = points_breakdown(&answers, &scoring, 0);
        assert!((breakdown.base_points - 40.0).abs() < 1e-9);
        assert!((breakdown.performance_bonus - 20.0).abs() < 1e-9);
        assert!((breakdown.speed_bonus - 10.0).abs() < 1e-9);
        assert_eq!(breakdown.streak_bonus, 0.0);
        assert!((breakdown.total_points - 70.0).abs() < 1e-9);
    }

    #[test]
    fn streak_bonus_tiers() {
        let answers = vec![answer(AnswerOutcome::Correct, 10.0)];
        let table = ScoringTable::exam_preset();

        assert_eq!(points_breakdown(&answers, &table, 0).streak_bonus, 0.0);
        assert_eq!(points_breakdown(&answers, &table, 3).streak_bonus, 5.0);
        assert_eq!(points_breakdown(&answers, &table, 7).streak_bonus, 15.0);
        assert_eq!(points_breakdown(&answers, &table, 30).streak_bonus, 15.0);
    }

    #[test]
    fn speed_bonus_requires_answers() {
        let breakdown = points_breakdown(&[], &ScoringTable::exam_preset(), 0);
        assert_eq!(breakdown.speed_bonus, 0.0);
        assert_eq!(breakdown.total_points, 0.0);
    }
}

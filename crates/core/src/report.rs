//! Final-report aggregation over a finished session.
//!
//! Everything here is a deterministic function of the answer list, the
//! configuration and the question set; nothing reads or writes stored user
//! totals.

use std::collections::BTreeMap;

use crate::grade::Grade;
use crate::model::{Question, QuestionId, SessionAnswer, SessionConfig};
use crate::scoring::{self, OutcomeCounts, PointsBreakdown};

//
// ─── THEME BREAKDOWN ───────────────────────────────────────────────────────────
//

/// Answered/correct tallies for one theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeBreakdown {
    pub theme: String,
    pub answered: u32,
    pub correct: u32,
}

//
// ─── SESSION REPORT ────────────────────────────────────────────────────────────
//

/// Aggregate statistics handed to the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    counts: OutcomeCounts,
    success_rate: f64,
    total_time_secs: f64,
    average_time_secs: f64,
    per_theme: Vec<ThemeBreakdown>,
    breakdown: PointsBreakdown,
    grade_before: &'static Grade,
    grade_after: &'static Grade,
    leveled_up: bool,
}

impl SessionReport {
    /// Builds the report.
    ///
    /// `streak` and `prior_points` are external inputs: the user's current
    /// best streak and their cumulative points before this session. Calling
    /// this twice with the same inputs yields an identical report.
    #[must_use]
    pub fn build(
        answers: &[SessionAnswer],
        questions: &[Question],
        config: &SessionConfig,
        streak: u32,
        prior_points: f64,
    ) -> Self {
        let counts = OutcomeCounts::from_answers(answers);
        let total_time_secs: f64 = answers.iter().map(SessionAnswer::time_spent_secs).sum();
        let average_time_secs = if answers.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                total_time_secs / answers.len() as f64
            }
        };

        let breakdown = scoring::points_breakdown(answers, config.scoring(), streak);

        let themes: BTreeMap<QuestionId, &str> = questions
            .iter()
            .map(|q| (q.id(), q.theme()))
            .collect();
        let mut per_theme: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        for answer in answers {
            let Some(&theme) = themes.get(&answer.question_id()) else {
                continue;
            };
            let entry = per_theme.entry(theme).or_default();
            entry.0 += 1;
            if answer.is_correct() {
                entry.1 += 1;
            }
        }
        let per_theme = per_theme
            .into_iter()
            .map(|(theme, (answered, correct))| ThemeBreakdown {
                theme: theme.to_owned(),
                answered,
                correct,
            })
            .collect();

        let grade_before = Grade::for_points(prior_points);
        let grade_after = Grade::for_points(prior_points + breakdown.total_points);

        Self {
            counts,
            success_rate: counts.success_rate(),
            total_time_secs,
            average_time_secs,
            per_theme,
            breakdown,
            grade_before,
            grade_after,
            leveled_up: grade_after.min_points > grade_before.min_points,
        }
    }

    // Accessors
    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    #[must_use]
    pub fn total_time_secs(&self) -> f64 {
        self.total_time_secs
    }

    #[must_use]
    pub fn average_time_secs(&self) -> f64 {
        self.average_time_secs
    }

    #[must_use]
    pub fn per_theme(&self) -> &[ThemeBreakdown] {
        &self.per_theme
    }

    #[must_use]
    pub fn breakdown(&self) -> PointsBreakdown {
        self.breakdown
    }

    #[must_use]
    pub fn grade_before(&self) -> &'static Grade {
        self.grade_before
    }

    #[must_use]
    pub fn grade_after(&self) -> &'static Grade {
        self.grade_after
    }

    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.leveled_up
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnswerChoice, AnswerId, AnswerOutcome, KindFilter, QuestionCount, QuestionKind,
        ScoringTable, ThemeSelection,
    };
    use std::collections::BTreeSet;

    fn question(id: u64, theme: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            theme,
            "General",
            format!("Q{id}"),
            None,
            vec![
                AnswerChoice::new(AnswerId::new(1), "right", true),
                AnswerChoice::new(AnswerId::new(2), "wrong", false),
            ],
            QuestionKind::Single,
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn config() -> SessionConfig {
        SessionConfig::new(
            vec![ThemeSelection::new("Fire behavior", vec![], 20)],
            QuestionCount::Limited(10),
            false,
            30,
            ScoringTable::new(10.0, 0.0, 0.0, 5.0).unwrap(),
            KindFilter::All,
        )
        .unwrap()
    }

    fn answered(id: u64, outcome: AnswerOutcome, time: f64) -> SessionAnswer {
        let selected = if outcome == AnswerOutcome::Skipped {
            BTreeSet::new()
        } else {
            [AnswerId::new(1)].into_iter().collect()
        };
        SessionAnswer::new(QuestionId::new(id), selected, time, outcome)
    }

    fn fixture() -> (Vec<SessionAnswer>, Vec<Question>) {
        let questions = vec![
            question(1, "Fire behavior"),
            question(2, "Fire behavior"),
            question(3, "Rescue operations"),
            question(4, "Rescue operations"),
            question(5, "Equipment"),
        ];
        let answers = vec![
            answered(1, AnswerOutcome::Correct, 3.0),
            answered(2, AnswerOutcome::Correct, 3.5),
            answered(3, AnswerOutcome::Correct, 2.8),
            answered(4, AnswerOutcome::Correct, 3.7),
            answered(5, AnswerOutcome::Skipped, 3.0),
        ];
        (answers, questions)
    }

    #[test]
    fn report_aggregates_counts_times_and_bonuses() {
        let (answers, questions) = fixture();
        let report = SessionReport::build(&answers, &questions, &config(), 0, 0.0);

        assert_eq!(report.counts().correct, 4);
        assert_eq!(report.counts().skipped, 1);
        assert!((report.success_rate() - 0.8).abs() < 1e-9);
        assert!((report.total_time_secs() - 16.0).abs() < 1e-9);
        assert!((report.average_time_secs() - 3.2).abs() < 1e-9);
        assert!((report.breakdown().total_points - 70.0).abs() < 1e-9);
    }

    #[test]
    fn report_groups_by_theme() {
        let (answers, questions) = fixture();
        let report = SessionReport::build(&answers, &questions, &config(), 0, 0.0);

        let equipment = report
            .per_theme()
            .iter()
            .find(|t| t.theme == "Equipment")
            .unwrap();
        assert_eq!(equipment.answered, 1);
        assert_eq!(equipment.correct, 0);

        let rescue = report
            .per_theme()
            .iter()
            .find(|t| t.theme == "Rescue operations")
            .unwrap();
        assert_eq!(rescue.answered, 2);
        assert_eq!(rescue.correct, 2);
    }

    #[test]
    fn report_is_deterministic() {
        let (answers, questions) = fixture();
        let a = SessionReport::build(&answers, &questions, &config(), 4, 80.0);
        let b = SessionReport::build(&answers, &questions, &config(), 4, 80.0);
        assert_eq!(a, b);
    }

    #[test]
    fn level_up_is_flagged_when_a_threshold_is_crossed() {
        let (answers, questions) = fixture();
        // 70 session points on top of 80 prior points crosses the 100 mark
        let report = SessionReport::build(&answers, &questions, &config(), 0, 80.0);
        assert!(report.leveled_up());
        assert_eq!(report.grade_before().name, "Recruit");
        assert_eq!(report.grade_after().name, "Probationary firefighter");
    }

    #[test]
    fn no_level_up_without_crossing() {
        let (answers, questions) = fixture();
        let report = SessionReport::build(&answers, &questions, &config(), 0, 0.0);
        assert!(!report.leveled_up());
    }
}

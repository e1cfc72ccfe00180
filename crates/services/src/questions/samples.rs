//! Built-in fallback question set.
//!
//! Served when the question store is unreachable or returns no matches, so a
//! session can always start.

use drill_core::model::{
    AnswerChoice, AnswerId, Question, QuestionId, QuestionKind, SessionConfig,
};

// Ids far above anything the backing store assigns.
const SAMPLE_ID_BASE: u64 = 9_000_000;

fn choice(id: u64, text: &str, is_correct: bool) -> AnswerChoice {
    AnswerChoice::new(AnswerId::new(id), text, is_correct)
}

/// The full sample set.
///
/// # Panics
///
/// Panics if a built-in sample fails validation, which would be a programming
/// error caught by the tests below.
#[must_use]
pub fn sample_set() -> Vec<Question> {
    let drafts = vec![
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 1),
            "Fire behavior",
            "Combustion",
            "Which element completes the fire triangle together with heat and fuel?",
            None,
            vec![
                choice(1, "Oxygen", true),
                choice(2, "Nitrogen", false),
                choice(3, "Carbon dioxide", false),
                choice(4, "Water vapor", false),
            ],
            QuestionKind::Single,
            Some("Combustion requires heat, fuel and an oxidizer, usually oxygen.".into()),
            Some(1),
            None,
        ),
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 2),
            "Fire behavior",
            "Extinguishing agents",
            "Which agents are suitable against a hydrocarbon (class B) fire?",
            None,
            vec![
                choice(1, "Foam", true),
                choice(2, "Dry chemical powder", true),
                choice(3, "Straight water jet", false),
                choice(4, "Carbon dioxide", true),
            ],
            QuestionKind::Multiple,
            Some("A straight water jet spreads burning liquids instead of smothering them.".into()),
            Some(3),
            None,
        ),
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 3),
            "Rescue operations",
            "Victim assessment",
            "What is the first step when assessing an unresponsive victim?",
            None,
            vec![
                choice(1, "Check for danger to yourself and the victim", true),
                choice(2, "Start chest compressions immediately", false),
                choice(3, "Move the victim to a stretcher", false),
            ],
            QuestionKind::Single,
            Some("Scene safety always comes before casualty care.".into()),
            Some(2),
            None,
        ),
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 4),
            "Rescue operations",
            "Protective equipment",
            "Which items belong to the standard structural firefighting kit?",
            None,
            vec![
                choice(1, "Helmet with neck curtain", true),
                choice(2, "Fire-resistant gloves", true),
                choice(3, "High-visibility office vest", false),
                choice(4, "Self-contained breathing apparatus", true),
            ],
            QuestionKind::Multiple,
            None,
            Some(2),
            None,
        ),
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 5),
            "Equipment",
            "Hoses and nozzles",
            "What is the usual diameter of an attack hose for interior operations?",
            None,
            vec![
                choice(1, "45 mm", true),
                choice(2, "110 mm", false),
                choice(3, "22 mm", false),
            ],
            QuestionKind::Single,
            None,
            Some(2),
            None,
        ),
        Question::new(
            QuestionId::new(SAMPLE_ID_BASE + 6),
            "Equipment",
            "Ladders",
            "Before raising an extension ladder you must check that...",
            None,
            vec![
                choice(1, "the ground is stable and level", true),
                choice(2, "overhead power lines are clear", true),
                choice(3, "the paint is undamaged", false),
            ],
            QuestionKind::Multiple,
            None,
            Some(1),
            None,
        ),
    ];

    drafts
        .into_iter()
        .map(|q| q.expect("built-in sample question is valid"))
        .collect()
}

/// Sample questions filtered and capped to a session configuration.
#[must_use]
pub fn builtin_questions(config: &SessionConfig) -> Vec<Question> {
    let mut questions: Vec<Question> = sample_set()
        .into_iter()
        .filter(|q| config.kind_filter().matches(q.kind()))
        .collect();
    if let Some(limit) = config.count().limit() {
        questions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{KindFilter, QuestionCount, ScoringTable, ThemeSelection};

    fn config(count: QuestionCount, kinds: KindFilter) -> SessionConfig {
        SessionConfig::new(
            vec![ThemeSelection::new("Fire behavior", vec![], 10)],
            count,
            false,
            30,
            ScoringTable::exam_preset(),
            kinds,
        )
        .unwrap()
    }

    #[test]
    fn sample_set_is_valid_and_mixed() {
        let set = sample_set();
        assert!(set.len() >= 4);
        assert!(set.iter().any(|q| q.kind() == QuestionKind::Single));
        assert!(set.iter().any(|q| q.kind() == QuestionKind::Multiple));
    }

    #[test]
    fn builtin_questions_respect_kind_filter() {
        let singles = builtin_questions(&config(QuestionCount::Unlimited, KindFilter::SingleOnly));
        assert!(singles.iter().all(|q| q.kind() == QuestionKind::Single));
        assert!(!singles.is_empty());
    }

    #[test]
    fn builtin_questions_respect_count() {
        let capped = builtin_questions(&config(QuestionCount::Limited(2), KindFilter::All));
        assert_eq!(capped.len(), 2);
    }
}

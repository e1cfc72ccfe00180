use std::sync::Arc;

use tracing::warn;

use drill_core::model::{Question, SessionConfig};
use storage::repository::QuestionRepository;

use crate::shuffle::ShuffleStrategy;
use super::samples;

/// Fetches the question list for a session.
///
/// Wraps the question store and falls back to the built-in sample set when
/// the store errors or matches nothing, so starting a session never fails on
/// backend degradation. The fallback is logged for operators.
#[derive(Clone)]
pub struct QuestionProvider {
    repo: Arc<dyn QuestionRepository>,
    shuffle: ShuffleStrategy,
}

impl QuestionProvider {
    #[must_use]
    pub fn new(repo: Arc<dyn QuestionRepository>) -> Self {
        Self {
            repo,
            shuffle: ShuffleStrategy::Live,
        }
    }

    /// Replace the answer-order shuffle strategy (daily challenges use the
    /// seeded one).
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: ShuffleStrategy) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fetch questions for `config`, shuffling each question's answers.
    ///
    /// Never fails: store errors and empty results both degrade to the
    /// sample set.
    pub async fn fetch(&self, config: &SessionConfig) -> Vec<Question> {
        let mut questions = match self
            .repo
            .fetch_questions(config.themes(), config.count(), config.kind_filter())
            .await
        {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                warn!("question store returned no matches, falling back to built-in samples");
                samples::builtin_questions(config)
            }
            Err(err) => {
                warn!(error = %err, "question store unavailable, falling back to built-in samples");
                samples::builtin_questions(config)
            }
        };

        for question in &mut questions {
            let salt = question.id().value();
            question.reorder_answers_with(|answers| self.shuffle.shuffle(answers, salt));
        }
        questions
    }
}

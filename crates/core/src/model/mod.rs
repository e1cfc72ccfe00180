mod answer;
mod config;
mod ids;
mod question;
mod snapshot;

pub use answer::{AnswerOutcome, SessionAnswer};
pub use config::{
    ConfigError, KindFilter, QuestionCount, ScoringTable, SessionConfig, ThemeSelection,
};
pub use ids::{AnswerId, ParseIdError, QuestionId, ThemeId, UserId};
pub use question::{AnswerChoice, Question, QuestionError, QuestionKind};
pub use snapshot::{resume_window, SessionSnapshot, RESUME_WINDOW_HOURS};

mod engine;
mod progress;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use engine::{TimerTick, TrainingSession};
pub use progress::SessionProgress;
pub use workflow::{
    CompletedSession, SessionAdvance, SessionAnswerResult, SessionLoopService, SessionStart,
};

#![forbid(unsafe_code)]

pub mod error;
pub mod questions;
pub mod remote;
pub mod sessions;
pub mod shuffle;

pub use drill_core::Clock;

pub use error::SessionError;
pub use questions::QuestionProvider;
pub use remote::{RemoteSnapshotClient, RemoteSyncConfig};
pub use sessions::{
    CompletedSession, SessionAdvance, SessionAnswerResult, SessionLoopService, SessionProgress,
    SessionStart, TimerTick, TrainingSession,
};
pub use shuffle::ShuffleStrategy;

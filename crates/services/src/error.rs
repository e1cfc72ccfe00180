//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::{AnswerId, ConfigError};
use storage::repository::StorageError;

/// Errors emitted by the session engine and its orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session already completed")]
    Completed,

    #[error("current question is already validated")]
    AlreadyValidated,

    #[error("current question is not validated yet")]
    NotValidated,

    #[error("validation requires at least one selected answer")]
    NoSelection,

    #[error("answer {0} does not belong to the current question")]
    UnknownAnswer(AnswerId),

    #[error("session is paused")]
    Paused,

    #[error("session is not paused")]
    NotPaused,

    #[error("free navigation is only available in review mode")]
    NavigationUnavailable,

    #[error("navigation target {0} is out of range")]
    NavigationOutOfRange(usize),

    #[error("snapshot does not match this session")]
    SnapshotMismatch,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

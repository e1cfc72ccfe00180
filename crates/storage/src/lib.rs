#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionRepository, SnapshotRecord, SnapshotRepository, Storage,
    StorageError, SyncedSnapshotStore,
};
pub use sqlite::{SqliteInitError, SqliteRepository};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drill_core::model::{
    KindFilter, Question, QuestionCount, SessionSnapshot, ThemeSelection, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a session snapshot.
///
/// The snapshot travels as a JSON payload; `saved_at` is duplicated into its
/// own column so freshness ordering never requires deserializing the payload.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub user_id: UserId,
    pub payload: String,
    pub saved_at: DateTime<Utc>,
}

impl SnapshotRecord {
    /// Serialize a domain snapshot for storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the snapshot cannot be
    /// encoded.
    pub fn from_snapshot(
        user_id: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<Self, StorageError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            user_id,
            payload,
            saved_at: snapshot.saved_at(),
        })
    }

    /// Decode the stored payload back into a domain snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on a malformed payload. Load
    /// paths treat that as "no snapshot" rather than failing the caller.
    pub fn into_snapshot(self) -> Result<SessionSnapshot, StorageError> {
        serde_json::from_str(&self.payload)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for resumable session snapshots, scoped by user.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Persist or overwrite the user's snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError>;

    /// Fetch the user's snapshot, `None` when absent or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for backend failures; a missing or
    /// corrupted snapshot is `Ok(None)`.
    async fn load_snapshot(&self, user: UserId) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Delete the user's snapshot. Deleting a missing snapshot is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion cannot be executed.
    async fn clear_snapshot(&self, user: UserId) -> Result<(), StorageError>;
}

/// Repository contract for the question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question with its answer choices.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch questions matching the theme selections, capped by `count` and
    /// restricted by `kinds`.
    ///
    /// Returns an empty list, never an error, when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn fetch_questions(
        &self,
        themes: &[ThemeSelection],
        count: QuestionCount,
        kinds: KindFilter,
    ) -> Result<Vec<Question>, StorageError>;
}

//
// ─── IN-MEMORY REPOSITORY ──────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<UserId, SessionSnapshot>>>,
    questions: Arc<Mutex<Vec<Question>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn save_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user, snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, user: UserId) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&user).cloned())
    }

    async fn clear_snapshot(&self, user: UserId) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&user);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(existing) = guard.iter_mut().find(|q| q.id() == question.id()) {
            *existing = question.clone();
        } else {
            guard.push(question.clone());
        }
        Ok(())
    }

    async fn fetch_questions(
        &self,
        themes: &[ThemeSelection],
        count: QuestionCount,
        kinds: KindFilter,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut matching: Vec<Question> = guard
            .iter()
            .filter(|q| kinds.matches(q.kind()))
            .filter(|q| {
                themes.iter().any(|selection| {
                    selection.theme == q.theme()
                        && (selection.sub_themes.is_empty()
                            || selection.sub_themes.iter().any(|s| s == q.sub_theme()))
                })
            })
            .cloned()
            .collect();
        matching.sort_by_key(|q| q.id().value());

        if let Some(limit) = count.limit() {
            matching.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(matching)
    }
}

//
// ─── SYNCED SNAPSHOT STORE ─────────────────────────────────────────────────────
//

/// Combines a local cache with a best-effort remote mirror.
///
/// Writes land locally first and are mirrored to the remote when one is
/// configured; remote failures degrade to local-only and are logged, never
/// propagated. Reads prefer the remote copy when it is present and not older
/// than the local one, so a session paused on another device wins.
#[derive(Clone)]
pub struct SyncedSnapshotStore {
    local: Arc<dyn SnapshotRepository>,
    remote: Option<Arc<dyn SnapshotRepository>>,
}

impl SyncedSnapshotStore {
    #[must_use]
    pub fn new(local: Arc<dyn SnapshotRepository>) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn SnapshotRepository>) -> Self {
        self.remote = Some(remote);
        self
    }
}

#[async_trait]
impl SnapshotRepository for SyncedSnapshotStore {
    async fn save_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        self.local.save_snapshot(user, snapshot).await?;
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.save_snapshot(user, snapshot).await {
                warn!(%user, error = %err, "remote snapshot write failed, keeping local copy");
            }
        }
        Ok(())
    }

    async fn load_snapshot(&self, user: UserId) -> Result<Option<SessionSnapshot>, StorageError> {
        let local = self.local.load_snapshot(user).await?;
        let remote = match &self.remote {
            Some(remote) => match remote.load_snapshot(user).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(%user, error = %err, "remote snapshot read failed, falling back to local");
                    None
                }
            },
            None => None,
        };

        Ok(match (local, remote) {
            (Some(local), Some(remote)) => {
                if remote.saved_at() >= local.saved_at() {
                    Some(remote)
                } else {
                    Some(local)
                }
            }
            (None, remote @ Some(_)) => remote,
            (local, None) => local,
        })
    }

    async fn clear_snapshot(&self, user: UserId) -> Result<(), StorageError> {
        self.local.clear_snapshot(user).await?;
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.clear_snapshot(user).await {
                warn!(%user, error = %err, "remote snapshot clear failed");
            }
        }
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self {
            snapshots,
            questions,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

//! HTTP mirror for session snapshots.
//!
//! Lets a user pause on one device and resume on another. The client is
//! optional: without configuration the snapshot store runs local-only.

use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use drill_core::model::{SessionSnapshot, UserId};
use storage::repository::{SnapshotRepository, StorageError};

#[derive(Clone, Debug)]
pub struct RemoteSyncConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl RemoteSyncConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("DRILL_SYNC_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("DRILL_SYNC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

#[derive(Clone)]
pub struct RemoteSnapshotClient {
    client: Client,
    config: RemoteSyncConfig,
}

impl RemoteSnapshotClient {
    #[must_use]
    pub fn new(config: RemoteSyncConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build a client from the environment, `None` when sync is not
    /// configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        RemoteSyncConfig::from_env().map(Self::new)
    }

    fn endpoint(&self, user: UserId) -> String {
        format!(
            "{}/users/{}/session-snapshot",
            self.config.base_url.trim_end_matches('/'),
            user
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

fn connection(err: reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

fn status_error(status: StatusCode) -> StorageError {
    StorageError::Connection(format!("unexpected status {status}"))
}

#[async_trait]
impl SnapshotRepository for RemoteSnapshotClient {
    async fn save_snapshot(
        &self,
        user: UserId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.put(self.endpoint(user)).json(snapshot))
            .send()
            .await
            .map_err(connection)?;

        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        Ok(())
    }

    async fn load_snapshot(&self, user: UserId) -> Result<Option<SessionSnapshot>, StorageError> {
        let response = self
            .authorize(self.client.get(self.endpoint(user)))
            .send()
            .await
            .map_err(connection)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let snapshot = response
            .json::<SessionSnapshot>()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(snapshot))
    }

    async fn clear_snapshot(&self, user: UserId) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.delete(self.endpoint(user)))
            .send()
            .await
            .map_err(connection)?;

        // clearing an absent snapshot is not an error
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(status_error(response.status()))
    }
}

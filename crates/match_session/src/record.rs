//! Persisted match records and the storage seam.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::protocol::Winner;

/// What the storage collaborator keeps about one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    /// Canonical move notations, oldest first
    pub history: Vec<String>,
    /// Hosting player, who moves first
    pub white: String,
    pub black: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result: Option<Winner>,
    /// True if the result is a timeout forfeit
    #[serde(default)]
    pub out_of_time: bool,
    /// True while both players are seated and the game is running
    #[serde(default)]
    pub alive: bool,
}

impl MatchRecord {
    pub fn new(id: Uuid, white: impl Into<String>) -> Self {
        Self {
            id,
            history: Vec::new(),
            white: white.into(),
            black: None,
            started_at: Utc::now(),
            ended_at: None,
            result: None,
            out_of_time: false,
            alive: false,
        }
    }

    /// Save the record to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a record from a JSON file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Storage collaborator owning match records.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// `Ok(None)` when the record does not exist (or was deleted).
    async fn load(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError>;

    /// Writes the whole record. Must be durable once this returns `Ok`.
    async fn save(&self, record: &MatchRecord) -> Result<(), StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Uuid, MatchRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn load(&self, id: Uuid) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&self, record: &MatchRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;

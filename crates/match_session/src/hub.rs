use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::actor::{SessionActor, SessionHandle};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::record::{MatchRecord, MatchStore};
use crate::session::Session;

/// Runs sessions over a shared store, at most one actor per match.
pub struct SessionHub {
    store: Arc<dyn MatchStore>,
    config: SessionConfig,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionHub {
    pub fn new(store: Arc<dyn MatchStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a pending match hosted by `white` and starts its session.
    pub async fn host(&self, white: &str) -> Result<SessionHandle, SessionError> {
        let id = Uuid::new_v4();
        let session = Session::new(id, white);
        let mut record = MatchRecord::new(id, white);
        session.write_record(&mut record);
        self.store.save(&record).await?;
        info!(%id, white, "match hosted");

        let handle = SessionActor::spawn(session, record, self.store.clone(), self.config.clone());
        self.sessions.lock().await.insert(id, handle.clone());
        Ok(handle)
    }

    /// Returns the running session for `id`, starting it from the stored
    /// record if needed.
    pub async fn open(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(&id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        let record = self
            .store
            .load(id)
            .await?
            .ok_or(SessionError::NotFound(id))?;
        let session = Session::from_record(&record)?;
        info!(%id, moves = record.history.len(), "match reopened");

        let handle = SessionActor::spawn(session, record, self.store.clone(), self.config.clone());
        sessions.insert(id, handle.clone());
        Ok(handle)
    }

    /// Deletes the match record. A running session broadcasts the removal
    /// and stops. Returns whether a record existed.
    pub async fn remove(&self, id: Uuid) -> Result<bool, SessionError> {
        let existed = self.store.delete(id).await?;
        if let Some(handle) = self.sessions.lock().await.remove(&id) {
            // Already stopped is fine.
            let _ = handle.notify_removed().await;
        }
        info!(%id, existed, "match removed");
        Ok(existed)
    }

    /// Stops every running session. Records stay in the store.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }
}

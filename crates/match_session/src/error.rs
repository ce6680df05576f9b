use std::path::PathBuf;

use chess_core::ChessError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("failed to read or write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed match record")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] ChessError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error("session has shut down")]
    Closed,
    #[error("stored history has {stored} moves but {applied} are already applied")]
    HistoryDiverged { stored: usize, applied: usize },
}

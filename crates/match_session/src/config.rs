//! Session configuration, read from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables shared by every session a hub runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds a player has to move before forfeiting
    pub turn_timeout_secs: u64,
    /// Capacity of each session's inbound command queue
    pub command_buffer: usize,
    /// Capacity of each session's broadcast channel
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 600,
            command_buffer: 32,
            event_buffer: 64,
        }
    }
}

impl SessionConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "turn_timeout_secs",
            });
        }
        // Channel constructors panic on zero capacity.
        if self.command_buffer == 0 {
            return Err(ConfigError::Zero {
                field: "command_buffer",
            });
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::Zero {
                field: "event_buffer",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

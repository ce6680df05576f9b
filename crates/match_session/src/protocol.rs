//! Messages exchanged with session participants.
//!
//! Every message is a JSON object tagged by `type`. Inbound messages that
//! arrive out of turn or in the wrong session state are dropped without a
//! reply; only a refused move notation is answered, and only to its sender.

use chess_core::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl From<Color> for Winner {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Winner::White,
            Color::Black => Winner::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move {
        #[serde(rename = "move")]
        notation: String,
        #[serde(default)]
        request_draw: bool,
    },
    AcceptDraw,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameStart {
        opponent: String,
    },
    Move {
        #[serde(rename = "move")]
        notation: String,
        draw_requested: bool,
    },
    GameEnd {
        winner: Winner,
        out_of_time: bool,
    },
    GameStatus {
        status: StatusReport,
    },
    SessionRemoved,
    /// Sent to the submitter only.
    Rejected {
        reason: String,
    },
}

/// Snapshot of a session as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub white: String,
    pub black: Option<String>,
    /// The viewer's side, absent for spectators.
    pub whoami: Option<Side>,
    /// Absent unless the session is active.
    pub turn: Option<Side>,
    /// Absent until the session has ended.
    pub victory: Option<Winner>,
    pub moves: Vec<String>,
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server messages always serialize")
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;

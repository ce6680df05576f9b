use thiserror::Error;

use crate::square::SquareParseError;

/// Error when a move notation cannot even be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("move notation must be 4 or 5 characters, got {0}")]
    BadLength(usize),
    #[error("bad square in move notation: {0}")]
    BadSquare(#[from] SquareParseError),
    #[error("unknown promotion letter {0:?}")]
    BadPromotion(char),
}

/// Domain errors of the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("malformed move {notation:?}: {source}")]
    Malformed {
        notation: String,
        #[source]
        source: NotationError,
    },

    /// Unmatched and illegal moves are deliberately not told apart.
    #[error("illegal move {0}")]
    IllegalMove(String),

    #[error("no moves to undo")]
    NothingToUndo,

    #[error("invalid setup: {0}")]
    InvalidSetup(String),

    #[error("stored move {index} ({notation}) cannot be replayed")]
    Replay { index: usize, notation: String },

    #[error("stored history has {stored} moves but {applied} are already applied")]
    HistoryBehind { stored: usize, applied: usize },
}

//! Rules engine for two-player chess on a padded mailbox board.
//!
//! - [`square`]: addressing on a 15x15 grid whose border cells are sentinels
//! - [`board`]: placement with per-side occupancy and king caches
//! - [`rules`]: per-piece attack tests and pseudo-legal generation
//! - [`moves`]: move categories, each applied with an exact inverse
//! - [`game`]: turn order, legality, terminal states and the undo log
//! - [`notation`]: the `e2e4` / `a7a8Q` move notation

pub mod board;
pub mod error;
pub mod game;
pub mod moves;
pub mod notation;
pub mod perft;
pub mod rules;
pub mod square;
pub mod square_set;
pub mod types;

pub use board::*;
pub use error::*;
pub use game::*;
pub use moves::*;
pub use notation::*;
pub use perft::perft;
pub use square::{SquareParseError, Square};
pub use square_set::*;
pub use types::*;

//! Live two-player match sessions on top of `chess_core`.
//!
//! - [`session`]: the I/O-free state machine (seating, turns, draw offers,
//!   timeout guard, catch-up)
//! - [`actor`]: one tokio task per session with turn timers and ordered
//!   broadcast
//! - [`hub`]: hosts, reopens and removes sessions over a [`MatchStore`]
//! - [`protocol`]: the JSON messages exchanged with participants
//! - [`record`]: persisted match records and the storage seam

pub mod actor;
pub mod config;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod record;
pub mod session;

pub use actor::SessionHandle;
pub use config::SessionConfig;
pub use error::*;
pub use hub::SessionHub;
pub use protocol::*;
pub use record::*;
pub use session::*;

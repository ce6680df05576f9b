//! The session state machine, free of I/O.
//!
//! A [`Session`] wraps a [`Game`] with seating, turn gating, the draw-offer
//! handshake and the timeout guard. The actor feeds it commands one at a
//! time and takes care of persistence, broadcast and timers.

use chess_core::{ChessError, Color, Game, GameStatus};
use uuid::Uuid;

use crate::error::SessionError;
use crate::protocol::{Side, StatusReport, Winner};
use crate::record::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    DrawAgreed,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEnd {
    pub winner: Winner,
    pub reason: EndReason,
}

impl GameEnd {
    pub fn out_of_time(self) -> bool {
        self.reason == EndReason::Timeout
    }

    fn from_status(status: GameStatus) -> Option<GameEnd> {
        match status {
            GameStatus::InProgress { .. } => None,
            GameStatus::Checkmate { winner } => Some(GameEnd {
                winner: winner.into(),
                reason: EndReason::Checkmate,
            }),
            GameStatus::Stalemate => Some(GameEnd {
                winner: Winner::Draw,
                reason: EndReason::Stalemate,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Only the host is seated.
    Pending,
    Active,
    Ended(GameEnd),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMove {
    /// Canonical notation of the applied move
    pub notation: String,
    /// Whether the move carries a live draw offer
    pub draw_offered: bool,
    /// Move count after this move; tags the next turn timer
    pub move_count: u64,
    pub end: Option<GameEnd>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Out of turn or wrong session state; nothing changed.
    Ignored,
    /// The notation was malformed or illegal; nothing changed.
    Rejected(ChessError),
    Accepted(AcceptedMove),
}

/// Saved session state for rolling back a mutation whose write failed.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    phase: Phase,
    black: Option<String>,
    draw_offer: Option<Color>,
    move_count: u64,
    ply: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    white: String,
    black: Option<String>,
    game: Game,
    phase: Phase,
    /// Side an open offer is directed at. Only valid on that side's turn.
    draw_offer: Option<Color>,
    move_count: u64,
}

impl Session {
    pub fn new(id: Uuid, host: impl Into<String>) -> Self {
        Self {
            id,
            white: host.into(),
            black: None,
            game: Game::new(),
            phase: Phase::Pending,
            draw_offer: None,
            move_count: 0,
        }
    }

    /// Rebuilds a session from its stored record, replaying the history.
    pub fn from_record(record: &MatchRecord) -> Result<Self, SessionError> {
        let game = Game::replay(&record.history)?;
        let mut session = Self {
            id: record.id,
            white: record.white.clone(),
            black: None,
            game,
            phase: Phase::Pending,
            draw_offer: None,
            move_count: record.history.len() as u64,
        };
        session.adopt_seating_and_result(record);
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn white(&self) -> &str {
        &self.white
    }

    pub fn black(&self) -> Option<&str> {
        self.black.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    pub fn turn(&self) -> Color {
        self.game.turn()
    }

    pub fn pending_draw_offer(&self) -> Option<Color> {
        self.draw_offer
    }

    pub fn side_of(&self, player: &str) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if self.black.as_deref() == Some(player) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Seats the second player. Returns true if that activated the session;
    /// the caller then arms a turn timer for white.
    pub fn join(&mut self, player: &str) -> bool {
        if self.phase != Phase::Pending || player == self.white {
            return false;
        }
        self.black = Some(player.to_string());
        self.phase = Phase::Active;
        true
    }

    pub fn submit_move(&mut self, player: &str, notation: &str, request_draw: bool) -> MoveOutcome {
        if self.phase != Phase::Active || self.side_of(player) != Some(self.game.turn()) {
            return MoveOutcome::Ignored;
        }
        if let Err(e) = self.game.make_move(notation) {
            return MoveOutcome::Rejected(e);
        }

        self.move_count += 1;
        let notation = self
            .game
            .last_move()
            .map(|m| m.to_string())
            .unwrap_or_else(|| notation.to_string());

        // Moving instead of accepting drops whatever offer was open.
        self.draw_offer = None;
        let end = GameEnd::from_status(self.game.status());
        let draw_offered = match end {
            Some(end) => {
                self.phase = Phase::Ended(end);
                false
            }
            None if request_draw => {
                self.draw_offer = Some(self.game.turn());
                true
            }
            None => false,
        };

        MoveOutcome::Accepted(AcceptedMove {
            notation,
            draw_offered,
            move_count: self.move_count,
            end,
        })
    }

    /// Accepts the open offer if it is directed at `player` and it is their turn.
    pub fn accept_draw(&mut self, player: &str) -> Option<GameEnd> {
        if self.phase != Phase::Active {
            return None;
        }
        let side = self.side_of(player)?;
        if side != self.game.turn() || self.draw_offer != Some(side) {
            return None;
        }
        let end = GameEnd {
            winner: Winner::Draw,
            reason: EndReason::DrawAgreed,
        };
        self.draw_offer = None;
        self.phase = Phase::Ended(end);
        Some(end)
    }

    /// A turn timer armed at `armed_at` fired. Stale timers do nothing.
    pub fn timer_fired(&mut self, armed_at: u64) -> Option<GameEnd> {
        if self.phase != Phase::Active || armed_at != self.move_count {
            return None;
        }
        let end = GameEnd {
            winner: self.game.turn().other().into(),
            reason: EndReason::Timeout,
        };
        self.draw_offer = None;
        self.phase = Phase::Ended(end);
        Some(end)
    }

    /// Applies moves the stored history has beyond what this session has
    /// seen and adopts seating and results recorded elsewhere. Returns the
    /// number of moves applied.
    pub fn catch_up(&mut self, record: &MatchRecord) -> Result<usize, SessionError> {
        let applied = self.game.ply();
        let diverged = || SessionError::HistoryDiverged {
            stored: record.history.len(),
            applied,
        };
        if record.history.len() < applied || record.history[..applied] != self.game.history()[..] {
            return Err(diverged());
        }
        let added = self.game.catch_up(&record.history)?;
        if added > 0 {
            self.move_count += added as u64;
            // The offer, if any, rode on a move this session never saw.
            self.draw_offer = None;
        }
        self.adopt_seating_and_result(record);
        Ok(added)
    }

    fn adopt_seating_and_result(&mut self, record: &MatchRecord) {
        if self.black.is_none() {
            self.black = record.black.clone();
        }
        if matches!(self.phase, Phase::Ended(_)) {
            return;
        }
        let end = match record.result {
            Some(winner) if record.out_of_time => Some(GameEnd {
                winner,
                reason: EndReason::Timeout,
            }),
            Some(winner) => GameEnd::from_status(self.game.status()).or(Some(GameEnd {
                winner,
                reason: match winner {
                    Winner::Draw => EndReason::DrawAgreed,
                    _ => EndReason::Timeout,
                },
            })),
            None => GameEnd::from_status(self.game.status()),
        };
        self.phase = match (end, &self.black) {
            (Some(end), _) => Phase::Ended(end),
            (None, Some(_)) => Phase::Active,
            (None, None) => Phase::Pending,
        };
    }

    /// Writes the session's view of the match into `record`.
    pub fn write_record(&self, record: &mut MatchRecord) {
        record.history = self.game.history();
        record.black = self.black.clone();
        match self.phase {
            Phase::Ended(end) => {
                record.result = Some(end.winner);
                record.out_of_time = end.out_of_time();
                record.alive = false;
                if record.ended_at.is_none() {
                    record.ended_at = Some(chrono::Utc::now());
                }
            }
            Phase::Active => {
                record.result = None;
                record.out_of_time = false;
                record.alive = true;
            }
            Phase::Pending => {
                record.result = None;
                record.alive = false;
            }
        }
    }

    pub fn status(&self, viewer: &str) -> StatusReport {
        StatusReport {
            white: self.white.clone(),
            black: self.black.clone(),
            whoami: self.side_of(viewer).map(Side::from),
            turn: match self.phase {
                Phase::Active => Some(self.game.turn().into()),
                _ => None,
            },
            victory: match self.phase {
                Phase::Ended(end) => Some(end.winner),
                _ => None,
            },
            moves: self.game.history(),
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            phase: self.phase,
            black: self.black.clone(),
            draw_offer: self.draw_offer,
            move_count: self.move_count,
            ply: self.game.ply(),
        }
    }

    /// Rolls back to `checkpoint`, unmaking moves applied since.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        while self.game.ply() > checkpoint.ply {
            if self.game.unmake_move().is_err() {
                break;
            }
        }
        self.phase = checkpoint.phase;
        self.black = checkpoint.black;
        self.draw_offer = checkpoint.draw_offer;
        self.move_count = checkpoint.move_count;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;

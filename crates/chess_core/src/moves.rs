//! Move categories and their exact inverses.
//!
//! Applying a [`Move`] to a [`Board`] returns an [`AntiMove`]; replaying that
//! anti-move restores the board cell for cell, including the occupancy and
//! king indexes. An anti-move can only be obtained from an application.

use std::fmt;

use crate::board::Board;
use crate::square::{NORTH, SOUTH, Square};
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Quiet,
    Capture,
    /// Pawn advance of two ranks from its starting rank.
    DoubleStep,
    /// Pawn capture of a pawn that is not on the destination square.
    EnPassant,
    Promotion(PieceKind),
    PromotionCapture(PieceKind),
    CastleKingSide,
    CastleQueenSide,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
}

impl Move {
    pub fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self { from, to, kind }
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        match self.kind {
            MoveKind::Promotion(k) | MoveKind::PromotionCapture(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(
            self.kind,
            MoveKind::Capture | MoveKind::EnPassant | MoveKind::PromotionCapture(_)
        )
    }

    /// Mutates the board and returns the inverse mutation.
    pub fn apply(self, board: &mut Board) -> AntiMove {
        let Move { from, to, kind } = self;
        let anti = match kind {
            MoveKind::Quiet => {
                board.move_piece(from, to);
                AntiKind::Quiet
            }
            MoveKind::DoubleStep => {
                board.move_piece(from, to);
                AntiKind::DoubleStep
            }
            MoveKind::Capture => {
                let captured = board
                    .move_piece(from, to)
                    .unwrap_or_else(|| panic!("capture {from}{to} onto an empty square"));
                AntiKind::Capture { captured }
            }
            MoveKind::EnPassant => {
                // The pawn passes through the victim's square on its way.
                let at = en_passant_victim(from, to);
                let captured = board
                    .move_piece(from, at)
                    .unwrap_or_else(|| panic!("en passant {from}{to} without a victim on {at}"));
                board.move_piece(at, to);
                AntiKind::EnPassant { captured, at }
            }
            MoveKind::Promotion(kind) => {
                let pawn = board.remove_piece(from);
                board.add_piece(Piece::new(pawn.color, kind), to);
                AntiKind::Promotion { pawn }
            }
            MoveKind::PromotionCapture(kind) => {
                let captured = board
                    .move_piece(from, to)
                    .unwrap_or_else(|| panic!("promotion capture {from}{to} onto an empty square"));
                let pawn = board.remove_piece(to);
                board.add_piece(Piece::new(pawn.color, kind), to);
                AntiKind::PromotionCapture { pawn, captured }
            }
            MoveKind::CastleKingSide => {
                board.move_piece(from, to);
                board.move_piece(to + 1, from + 1);
                AntiKind::CastleKingSide
            }
            MoveKind::CastleQueenSide => {
                board.move_piece(from, to);
                board.move_piece(to + (-2), to + 1);
                AntiKind::CastleQueenSide
            }
        };
        AntiMove {
            from: to,
            to: from,
            kind: anti,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(k) = self.promotion() {
            write!(f, "{}", k.letter())?;
        }
        Ok(())
    }
}

/// Square of the pawn taken by an en-passant capture from `from` to `to`.
pub(crate) fn en_passant_victim(from: Square, to: Square) -> Square {
    let forward = if to < from { NORTH } else { SOUTH };
    from + (to - from - forward)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AntiKind {
    Quiet,
    DoubleStep,
    Capture { captured: Piece },
    EnPassant { captured: Piece, at: Square },
    Promotion { pawn: Piece },
    PromotionCapture { pawn: Piece, captured: Piece },
    CastleKingSide,
    CastleQueenSide,
}

/// Inverse of an applied move: origin and destination swapped, plus whatever
/// must be put back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AntiMove {
    from: Square,
    to: Square,
    kind: AntiKind,
}

impl AntiMove {
    /// The piece the forward move captured and the square it stood on.
    pub fn captured(&self) -> Option<(Piece, Square)> {
        match self.kind {
            AntiKind::Capture { captured } | AntiKind::PromotionCapture { captured, .. } => {
                Some((captured, self.from))
            }
            AntiKind::EnPassant { captured, at } => Some((captured, at)),
            _ => None,
        }
    }

    /// Undoes the forward move on the same board it was applied to.
    pub fn replay(self, board: &mut Board) {
        let AntiMove { from, to, kind } = self;
        match kind {
            AntiKind::Quiet | AntiKind::DoubleStep => {
                board.move_piece(from, to);
            }
            AntiKind::Capture { captured } => {
                board.move_piece(from, to);
                board.add_piece(captured, from);
            }
            AntiKind::EnPassant { captured, at } => {
                board.move_piece(from, to);
                board.add_piece(captured, at);
            }
            AntiKind::Promotion { pawn } => {
                board.remove_piece(from);
                board.add_piece(pawn, to);
            }
            AntiKind::PromotionCapture { pawn, captured } => {
                board.remove_piece(from);
                board.add_piece(captured, from);
                board.add_piece(pawn, to);
            }
            AntiKind::CastleKingSide => {
                board.move_piece(from, to);
                board.move_piece(to + 1, from + 1);
            }
            AntiKind::CastleQueenSide => {
                board.move_piece(from, to);
                board.move_piece(to + (-1), from + (-2));
            }
        }
    }
}

#[cfg(test)]
#[path = "moves_tests.rs"]
mod moves_tests;

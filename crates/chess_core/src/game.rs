//! Match engine: turn order, legality by simulate-and-revert, terminal
//! states and a replayable move log.

use crate::board::Board;
use crate::error::ChessError;
use crate::moves::{AntiMove, Move, MoveKind};
use crate::notation::parse_notation;
use crate::square::Square;
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub queen_side: bool,
    pub king_side: bool,
}

impl CastlingRights {
    pub const BOTH: CastlingRights = CastlingRights {
        queen_side: true,
        king_side: true,
    };
    pub const NONE: CastlingRights = CastlingRights {
        queen_side: false,
        king_side: false,
    };
}

/// Position facts that the piece placement alone does not carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    /// Indexed by [`Color::idx`].
    pub castling: [CastlingRights; 2],
    /// Square a pawn lands on when capturing en passant. Only set for the
    /// move right after a double step.
    pub en_passant: Option<Square>,
}

impl Context {
    pub fn initial() -> Self {
        Context {
            castling: [CastlingRights::BOTH; 2],
            en_passant: None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::initial()
    }
}

/// Undo record pushed for every applied move.
#[derive(Clone, Copy, Debug)]
struct Snapshot {
    mv: Move,
    turn: Color,
    castling: [CastlingRights; 2],
    en_passant: Option<Square>,
    anti: AntiMove,
}

/// A piece removed by a move and the square it was taken on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Captured {
    pub piece: Piece,
    pub square: Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress { check: bool },
    Checkmate { winner: Color },
    Stalemate,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::InProgress { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    context: Context,
    turn: Color,
    history: Vec<Snapshot>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// The standard initial position, white to move.
    pub fn new() -> Self {
        Game {
            board: Board::startpos(),
            context: Context::initial(),
            turn: Color::White,
            history: Vec::new(),
        }
    }

    /// Starts a game from an arbitrary position. Each side needs exactly one king.
    pub fn from_parts(board: Board, context: Context, turn: Color) -> Result<Self, ChessError> {
        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces(color)
                .filter(|(_, p)| p.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(ChessError::InvalidSetup(format!(
                    "{color} has {kings} kings"
                )));
            }
        }
        if let Some(ep) = context.en_passant {
            if !ep.is_valid() {
                return Err(ChessError::InvalidSetup(format!(
                    "en passant square {ep} is off the board"
                )));
            }
        }
        Ok(Game {
            board,
            context,
            turn,
            history: Vec::new(),
        })
    }

    /// Rebuilds a game from a stored list of move notations.
    pub fn replay<I, S>(moves: I) -> Result<Self, ChessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut game = Game::new();
        for (index, notation) in moves.into_iter().enumerate() {
            let notation = notation.as_ref();
            game.make_move(notation).map_err(|_| ChessError::Replay {
                index,
                notation: notation.to_string(),
            })?;
        }
        Ok(game)
    }

    /// Applies the part of `stored` beyond the moves already applied and
    /// returns how many moves were added. On error nothing is applied.
    pub fn catch_up<S: AsRef<str>>(&mut self, stored: &[S]) -> Result<usize, ChessError> {
        let applied = self.ply();
        if stored.len() < applied {
            return Err(ChessError::HistoryBehind {
                stored: stored.len(),
                applied,
            });
        }
        for (index, notation) in stored.iter().enumerate().skip(applied) {
            let notation = notation.as_ref();
            if self.make_move(notation).is_err() {
                while self.ply() > applied {
                    self.unmake_move()?;
                }
                return Err(ChessError::Replay {
                    index,
                    notation: notation.to_string(),
                });
            }
        }
        Ok(stored.len() - applied)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Number of moves applied beyond the starting position.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.piece_at(sq)
    }

    /// Applied moves, oldest first.
    pub fn moves_played(&self) -> impl Iterator<Item = Move> + '_ {
        self.history.iter().map(|s| s.mv)
    }

    /// Applied moves as canonical notations, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.moves_played().map(|m| m.to_string()).collect()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|s| s.mv)
    }

    /// True if the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.board.in_check(self.turn)
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut tmp = self.clone();
        let mut out = Vec::with_capacity(64);
        tmp.legal_moves_into(&mut out);
        out
    }

    /// Legal moves of the side to move from one square. Empty unless the
    /// square holds one of that side's pieces.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        let mut tmp = self.clone();
        let mut out = Vec::new();
        tmp.legal_moves_from_into(from, &mut out);
        out
    }

    /// Legal moves for the side to move, reusing `out`.
    pub fn legal_moves_into(&mut self, out: &mut Vec<Move>) {
        out.clear();
        let mover = self.turn;
        for (from, piece) in self.board.pieces(mover) {
            piece.pseudo_legal_moves_into(from, &self.board, &self.context, out);
        }
        self.retain_legal(out);
    }

    fn legal_moves_from_into(&mut self, from: Square, out: &mut Vec<Move>) {
        out.clear();
        match self.board.piece_at(from) {
            Some(piece) if piece.color == self.turn => {
                piece.pseudo_legal_moves_into(from, &self.board, &self.context, out);
            }
            _ => return,
        }
        self.retain_legal(out);
    }

    /// Drops candidates whose application leaves the mover's king attacked.
    fn retain_legal(&mut self, out: &mut Vec<Move>) {
        let mover = self.turn;
        let board = &mut self.board;
        out.retain(|&mv| {
            let anti = mv.apply(board);
            let illegal = board.in_check(mover);
            anti.replay(board);
            !illegal
        });
    }

    pub fn has_legal_move(&self) -> bool {
        let mut tmp = self.clone();
        let mover = tmp.turn;
        let mut buf = Vec::with_capacity(32);
        let pieces: Vec<(Square, Piece)> = tmp.board.pieces(mover).collect();
        for (from, piece) in pieces {
            buf.clear();
            piece.pseudo_legal_moves_into(from, &tmp.board, &tmp.context, &mut buf);
            tmp.retain_legal(&mut buf);
            if !buf.is_empty() {
                return true;
            }
        }
        false
    }

    pub fn checkmate(&self) -> bool {
        self.in_check() && !self.has_legal_move()
    }

    pub fn stalemate(&self) -> bool {
        !self.in_check() && !self.has_legal_move()
    }

    pub fn status(&self) -> GameStatus {
        let check = self.in_check();
        if self.has_legal_move() {
            GameStatus::InProgress { check }
        } else if check {
            GameStatus::Checkmate {
                winner: self.turn.other(),
            }
        } else {
            GameStatus::Stalemate
        }
    }

    /// Resolves a notation against the mover's pseudo-legal candidates.
    /// The first match wins.
    pub fn resolve(&self, notation: &str) -> Result<Move, ChessError> {
        let parsed = parse_notation(notation).map_err(|source| ChessError::Malformed {
            notation: notation.to_string(),
            source,
        })?;
        let illegal = || ChessError::IllegalMove(notation.to_string());
        let piece = match self.board.piece_at(parsed.from) {
            Some(p) if p.color == self.turn => p,
            _ => return Err(illegal()),
        };
        piece
            .pseudo_legal_moves(parsed.from, &self.board, &self.context)
            .into_iter()
            .find(|m| m.to == parsed.to && m.promotion() == parsed.promotion)
            .ok_or_else(illegal)
    }

    /// Plays a move given in notation and returns what it captured.
    pub fn make_move(&mut self, notation: &str) -> Result<Option<Captured>, ChessError> {
        let mv = self.resolve(notation)?;
        self.play(mv)
    }

    /// Plays a concrete move. It must be one of the mover's candidates.
    pub fn make(&mut self, mv: Move) -> Result<Option<Captured>, ChessError> {
        let known = match self.board.piece_at(mv.from) {
            Some(p) if p.color == self.turn => p
                .pseudo_legal_moves(mv.from, &self.board, &self.context)
                .contains(&mv),
            _ => false,
        };
        if !known {
            return Err(ChessError::IllegalMove(mv.to_string()));
        }
        self.play(mv)
    }

    /// Applies a candidate, reverting it if it exposes the mover's king.
    pub(crate) fn play(&mut self, mv: Move) -> Result<Option<Captured>, ChessError> {
        let mover = self.turn;
        let anti = mv.apply(&mut self.board);
        if self.board.in_check(mover) || !self.board.cell(mv.to).is_color(mover) {
            anti.replay(&mut self.board);
            return Err(ChessError::IllegalMove(mv.to_string()));
        }

        self.history.push(Snapshot {
            mv,
            turn: mover,
            castling: self.context.castling,
            en_passant: self.context.en_passant,
            anti,
        });

        self.update_castling(mv, mover, anti);
        self.context.en_passant = match mv.kind {
            MoveKind::DoubleStep => Square::from_index((mv.from.index() + mv.to.index()) / 2),
            _ => None,
        };
        self.turn = mover.other();

        Ok(anti.captured().map(|(piece, square)| Captured { piece, square }))
    }

    fn update_castling(&mut self, mv: Move, mover: Color, anti: AntiMove) {
        let home = mover.home_rank();
        let rights = &mut self.context.castling[mover.idx()];
        if self.board.piece_at(mv.to).map(|p| p.kind) == Some(PieceKind::King) {
            *rights = CastlingRights::NONE;
        } else if mv.from == Square::at(0, home) {
            rights.queen_side = false;
        } else if mv.from == Square::at(7, home) {
            rights.king_side = false;
        }

        // Taking a rook on its home square ends the owner's right on that wing.
        if let Some((captured, at)) = anti.captured() {
            if captured.kind == PieceKind::Rook {
                let victim = captured.color;
                let rights = &mut self.context.castling[victim.idx()];
                if at == Square::at(0, victim.home_rank()) {
                    rights.queen_side = false;
                } else if at == Square::at(7, victim.home_rank()) {
                    rights.king_side = false;
                }
            }
        }
    }

    /// Takes back the latest move.
    pub fn unmake_move(&mut self) -> Result<Move, ChessError> {
        let last = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        last.anti.replay(&mut self.board);
        self.context.castling = last.castling;
        self.context.en_passant = last.en_passant;
        self.turn = last.turn;
        Ok(last.mv)
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;

use std::fmt;

use crate::error::ChessError;
use crate::square::{CELLS, Square};
use crate::square_set::SquareSet;
use crate::types::*;

/// Piece placement on the padded grid plus the indexes derived from it.
///
/// The cell array, the per-side occupancy sets and the king squares change
/// together inside the mutation primitives; nothing outside this crate can
/// touch one without the others.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; CELLS],
    occupied: [SquareSet; 2],
    kings: [Option<Square>; 2],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// A board with no pieces: real squares empty, padding off-board.
    pub fn empty() -> Self {
        let mut cells = [Cell::OffBoard; CELLS];
        for sq in Square::all() {
            cells[sq.index()] = Cell::Empty;
        }
        Board {
            cells,
            occupied: [SquareSet::EMPTY; 2],
            kings: [None; 2],
        }
    }

    pub fn startpos() -> Self {
        let mut b = Board::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            b.add_piece(Piece::new(Color::White, kind), Square::at(file, 1));
            b.add_piece(Piece::new(Color::White, PieceKind::Pawn), Square::at(file, 2));
            b.add_piece(Piece::new(Color::Black, PieceKind::Pawn), Square::at(file, 7));
            b.add_piece(Piece::new(Color::Black, kind), Square::at(file, 8));
        }
        b
    }

    /// Builds a board from explicit placements. Squares must be real and distinct.
    pub fn from_pieces<I>(pieces: I) -> Result<Self, ChessError>
    where
        I: IntoIterator<Item = (Square, Piece)>,
    {
        let mut b = Board::empty();
        for (sq, piece) in pieces {
            match b.cell(sq) {
                Cell::Empty => b.add_piece(piece, sq),
                Cell::OffBoard => {
                    return Err(ChessError::InvalidSetup(format!(
                        "{sq} is not a board square"
                    )));
                }
                Cell::Occupied(_) => {
                    return Err(ChessError::InvalidSetup(format!("{sq} is occupied twice")));
                }
            }
        }
        Ok(b)
    }

    /// Setup helper for tests and benches: eight rows, rank 8 first, one
    /// character per file (`.` for empty, `KQRBNP` white, `kqrbnp` black).
    pub fn from_diagram(rows: [&str; 8]) -> Result<Self, ChessError> {
        let mut pieces = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let rank = 8 - i as u8;
            let chars: Vec<char> = row.chars().collect();
            if chars.len() != 8 {
                return Err(ChessError::InvalidSetup(format!(
                    "rank {rank} must have 8 cells, got {:?}",
                    row
                )));
            }
            for (file, &c) in chars.iter().enumerate() {
                if c == '.' {
                    continue;
                }
                let piece = Piece::from_symbol(c).ok_or_else(|| {
                    ChessError::InvalidSetup(format!("unknown piece symbol {c:?}"))
                })?;
                pieces.push((Square::at(file as u8, rank), piece));
            }
        }
        Board::from_pieces(pieces)
    }

    #[inline(always)]
    pub fn cell(&self, sq: Square) -> Cell {
        self.cells[sq.index()]
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()].piece()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.kings[color.idx()]
    }

    pub fn occupied(&self, color: Color) -> SquareSet {
        self.occupied[color.idx()]
    }

    /// Pieces of one side with their squares, in index order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied(color)
            .filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// True iff some piece of `by` has a pseudo-legal attack on `target`.
    /// Whether making that capture would expose the attacker's king is ignored.
    pub fn is_attacked(&self, target: Square, by: Color) -> bool {
        self.pieces(by)
            .any(|(from, piece)| piece.attacks(from, target, self))
    }

    /// True if the side's king exists and is attacked by the other side.
    pub fn in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(k) => self.is_attacked(k, color.other()),
            None => false,
        }
    }

    /// Recomputes the derived indexes from the cells and compares.
    pub fn is_consistent(&self) -> bool {
        let mut occupied = [SquareSet::EMPTY; 2];
        let mut kings = [None; 2];
        for (i, cell) in self.cells.iter().enumerate() {
            let Some(sq) = Square::from_index(i) else {
                return false;
            };
            match cell {
                Cell::OffBoard if sq.is_valid() => return false,
                Cell::Empty if !sq.is_valid() => return false,
                Cell::Occupied(p) => {
                    if !sq.is_valid() {
                        return false;
                    }
                    occupied[p.color.idx()].insert(sq);
                    if p.kind == PieceKind::King {
                        kings[p.color.idx()] = Some(sq);
                    }
                }
                _ => {}
            }
        }
        occupied == self.occupied && kings == self.kings
    }

    /// Relocates the piece on `from` to `to` and returns what stood on `to`.
    /// No legality checking.
    pub(crate) fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self
            .piece_at(from)
            .unwrap_or_else(|| panic!("move_piece from empty square {from}"));
        let displaced = self.piece_at(to);
        if displaced.is_some() {
            self.remove_piece(to);
        }
        self.cells[from.index()] = Cell::Empty;
        self.cells[to.index()] = Cell::Occupied(piece);
        let side = &mut self.occupied[piece.color.idx()];
        side.remove(from);
        side.insert(to);
        if piece.kind == PieceKind::King {
            self.kings[piece.color.idx()] = Some(to);
        }
        displaced
    }

    /// Places a piece on a real square, replacing whatever was there.
    pub(crate) fn add_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert!(sq.is_valid(), "add_piece on sentinel {sq}");
        if self.piece_at(sq).is_some() {
            self.remove_piece(sq);
        }
        self.cells[sq.index()] = Cell::Occupied(piece);
        self.occupied[piece.color.idx()].insert(sq);
        if piece.kind == PieceKind::King {
            self.kings[piece.color.idx()] = Some(sq);
        }
    }

    pub(crate) fn remove_piece(&mut self, sq: Square) -> Piece {
        let piece = self
            .piece_at(sq)
            .unwrap_or_else(|| panic!("remove_piece from empty square {sq}"));
        self.cells[sq.index()] = Cell::Empty;
        self.occupied[piece.color.idx()].remove(sq);
        if piece.kind == PieceKind::King && self.kings[piece.color.idx()] == Some(sq) {
            self.kings[piece.color.idx()] = None;
        }
        piece
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (1..=8u8).rev() {
            for file in 0..8u8 {
                let c = match self.piece_at(Square::at(file, rank)) {
                    Some(p) => p.symbol(),
                    None => '.',
                };
                write!(f, "{c}")?;
            }
            writeln!(f, " {rank}")?;
        }
        write!(f, "abcdefgh")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board")?;
        write!(f, "{self}")
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;

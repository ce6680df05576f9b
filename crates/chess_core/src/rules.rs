//! Per-piece movement rules.
//!
//! Every rule is a match on [`PieceKind`] against fixed offset tables. Leapers
//! test each offset against the destination cell; sliders step along a
//! direction until the first non-empty cell, which is either a sentinel, a
//! friendly piece or the one capture on that line.

use crate::board::Board;
use crate::game::Context;
use crate::moves::{Move, MoveKind, en_passant_victim};
use crate::square::*;
use crate::types::*;

pub const KNIGHT_OFFSETS: [i16; 8] = [
    2 * NORTH + WEST,
    2 * NORTH + EAST,
    NORTH + 2 * WEST,
    NORTH + 2 * EAST,
    SOUTH + 2 * WEST,
    SOUTH + 2 * EAST,
    2 * SOUTH + WEST,
    2 * SOUTH + EAST,
];

pub const KING_OFFSETS: [i16; 8] = [
    WEST, NORTH_WEST, NORTH, NORTH_EAST, EAST, SOUTH_EAST, SOUTH, SOUTH_WEST,
];

pub const ORTHOGONALS: [i16; 4] = [WEST, NORTH, EAST, SOUTH];
pub const DIAGONALS: [i16; 4] = [NORTH_WEST, NORTH_EAST, SOUTH_EAST, SOUTH_WEST];

/// Largest index distance between two real squares.
const RAY_CENTER: i16 = 7 * WIDTH + 7;
const RAY_LEN: usize = 2 * RAY_CENTER as usize + 1;

/// Step that leads from one real square to another `delta` away along a
/// line, or 0 when they do not share one. Indexed by `delta + RAY_CENTER`.
const fn ray_table(diagonal: bool) -> [i16; RAY_LEN] {
    let mut table = [0i16; RAY_LEN];
    let mut i = 0;
    while i < RAY_LEN {
        let delta = i as i16 - RAY_CENTER;
        let dc = (delta + 7).rem_euclid(WIDTH) - 7;
        let dr = (delta - dc) / WIDTH;
        let aligned = if diagonal {
            dr != 0 && dr.abs() == dc.abs()
        } else {
            (dr == 0) != (dc == 0)
        };
        if aligned {
            table[i] = dr.signum() * WIDTH + dc.signum();
        }
        i += 1;
    }
    table
}

static ORTHOGONAL_RAYS: [i16; RAY_LEN] = ray_table(false);
static DIAGONAL_RAYS: [i16; RAY_LEN] = ray_table(true);

fn pawn_forward(color: Color) -> i16 {
    match color {
        Color::White => NORTH,
        Color::Black => SOUTH,
    }
}

fn pawn_attack_offsets(color: Color) -> [i16; 2] {
    match color {
        Color::White => [NORTH_WEST, NORTH_EAST],
        Color::Black => [SOUTH_WEST, SOUTH_EAST],
    }
}

/// True if a slider on `from` reaches `to` along `rays` over empty cells.
fn slides_to(rays: &[i16; RAY_LEN], from: Square, to: Square, board: &Board) -> bool {
    let delta = to - from;
    if delta.abs() > RAY_CENTER {
        return false;
    }
    let step = rays[(delta + RAY_CENTER) as usize];
    if step == 0 {
        return false;
    }
    let mut sq = from + step;
    while sq != to {
        if !board.cell(sq).is_empty() {
            return false;
        }
        sq += step;
    }
    true
}

impl Piece {
    /// Whether this piece, standing on `from`, attacks `to`.
    pub fn attacks(self, from: Square, to: Square, board: &Board) -> bool {
        let delta = to - from;
        match self.kind {
            PieceKind::Pawn => pawn_attack_offsets(self.color).contains(&delta),
            PieceKind::Knight => KNIGHT_OFFSETS.contains(&delta),
            PieceKind::King => KING_OFFSETS.contains(&delta),
            PieceKind::Bishop => slides_to(&DIAGONAL_RAYS, from, to, board),
            PieceKind::Rook => slides_to(&ORTHOGONAL_RAYS, from, to, board),
            PieceKind::Queen => {
                slides_to(&ORTHOGONAL_RAYS, from, to, board)
                    || slides_to(&DIAGONAL_RAYS, from, to, board)
            }
        }
    }

    /// Candidate moves for this piece on `from`. They obey movement rules
    /// but may leave the mover's king attacked.
    pub fn pseudo_legal_moves(self, from: Square, board: &Board, ctx: &Context) -> Vec<Move> {
        let mut out = Vec::with_capacity(32);
        self.pseudo_legal_moves_into(from, board, ctx, &mut out);
        out
    }

    /// Appends candidate moves to `out` without clearing it.
    pub fn pseudo_legal_moves_into(
        self,
        from: Square,
        board: &Board,
        ctx: &Context,
        out: &mut Vec<Move>,
    ) {
        match self.kind {
            PieceKind::Pawn => gen_pawn(board, from, self.color, ctx, out),
            PieceKind::Knight => gen_leaper(board, from, self.color, &KNIGHT_OFFSETS, out),
            PieceKind::Bishop => gen_slider(board, from, self.color, &DIAGONALS, out),
            PieceKind::Rook => gen_slider(board, from, self.color, &ORTHOGONALS, out),
            PieceKind::Queen => {
                gen_slider(board, from, self.color, &ORTHOGONALS, out);
                gen_slider(board, from, self.color, &DIAGONALS, out);
            }
            PieceKind::King => {
                gen_leaper(board, from, self.color, &KING_OFFSETS, out);
                gen_castle(board, from, self.color, ctx, out);
            }
        }
    }
}

fn gen_leaper(board: &Board, from: Square, c: Color, offsets: &[i16], out: &mut Vec<Move>) {
    for &off in offsets {
        let to = from + off;
        match board.cell(to) {
            Cell::Empty => out.push(Move::new(from, to, MoveKind::Quiet)),
            Cell::Occupied(pc) if pc.color != c => out.push(Move::new(from, to, MoveKind::Capture)),
            _ => {}
        }
    }
}

fn gen_slider(board: &Board, from: Square, c: Color, dirs: &[i16], out: &mut Vec<Move>) {
    for &dir in dirs {
        let mut to = from + dir;
        loop {
            match board.cell(to) {
                Cell::Empty => out.push(Move::new(from, to, MoveKind::Quiet)),
                Cell::Occupied(pc) if pc.color != c => {
                    out.push(Move::new(from, to, MoveKind::Capture));
                    break;
                }
                _ => break,
            }
            to += dir;
        }
    }
}

fn gen_pawn(board: &Board, from: Square, c: Color, ctx: &Context, out: &mut Vec<Move>) {
    let forward = pawn_forward(c);
    // One step short of the far rank.
    let promoting = from.rank() == c.other().pawn_rank();

    let one = from + forward;
    if board.cell(one).is_empty() {
        if promoting {
            for kind in PieceKind::PROMOTIONS {
                out.push(Move::new(from, one, MoveKind::Promotion(kind)));
            }
        } else {
            out.push(Move::new(from, one, MoveKind::Quiet));
            let two = one + forward;
            if from.rank() == c.pawn_rank() && board.cell(two).is_empty() {
                out.push(Move::new(from, two, MoveKind::DoubleStep));
            }
        }
    }

    let attacks = pawn_attack_offsets(c);
    for off in attacks {
        let to = from + off;
        if let Cell::Occupied(pc) = board.cell(to) {
            if pc.color == c {
                continue;
            }
            if promoting {
                for kind in PieceKind::PROMOTIONS {
                    out.push(Move::new(from, to, MoveKind::PromotionCapture(kind)));
                }
            } else {
                out.push(Move::new(from, to, MoveKind::Capture));
            }
        }
    }

    if let Some(ep) = ctx.en_passant {
        if attacks.contains(&(ep - from)) && board.cell(ep).is_empty() {
            let victim = board.piece_at(en_passant_victim(from, ep));
            if victim == Some(Piece::new(c.other(), PieceKind::Pawn)) {
                out.push(Move::new(from, ep, MoveKind::EnPassant));
            }
        }
    }
}

fn gen_castle(board: &Board, from: Square, c: Color, ctx: &Context, out: &mut Vec<Move>) {
    if from != Square::at(4, c.home_rank()) {
        return;
    }
    let rights = ctx.castling[c.idx()];
    let enemy = c.other();
    let rook = Some(Piece::new(c, PieceKind::Rook));
    let empty = |offs: &[i16]| offs.iter().all(|&o| board.cell(from + o).is_empty());
    let safe = |offs: &[i16]| offs.iter().all(|&o| !board.is_attacked(from + o, enemy));

    if rights.queen_side
        && board.piece_at(from + 4 * WEST) == rook
        && empty(&[WEST, 2 * WEST, 3 * WEST])
        && safe(&[0, WEST, 2 * WEST])
    {
        out.push(Move::new(from, from + 2 * WEST, MoveKind::CastleQueenSide));
    }
    if rights.king_side
        && board.piece_at(from + 3 * EAST) == rook
        && empty(&[EAST, 2 * EAST])
        && safe(&[0, EAST, 2 * EAST])
    {
        out.push(Move::new(from, from + 2 * EAST, MoveKind::CastleKingSide));
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;

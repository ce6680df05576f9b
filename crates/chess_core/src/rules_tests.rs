use super::*;
use crate::game::CastlingRights;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn board(rows: [&str; 8]) -> Board {
    Board::from_diagram(rows).unwrap()
}

fn targets(moves: &[Move]) -> Vec<String> {
    let mut out: Vec<String> = moves.iter().map(|m| m.to.to_string()).collect();
    out.sort();
    out
}

fn moves_of(b: &Board, from: &str, ctx: &Context) -> Vec<Move> {
    let from = sq(from);
    let piece = b.piece_at(from).expect("no piece on origin square");
    piece.pseudo_legal_moves(from, b, ctx)
}

const CASTLE_BASE: [&str; 8] = [
    "....k...", "........", "........", "........", "........", "........", "........",
    "R...K..R",
];

fn castles(b: &Board, ctx: &Context) -> Vec<MoveKind> {
    moves_of(b, "e1", ctx)
        .into_iter()
        .map(|m| m.kind)
        .filter(|k| matches!(k, MoveKind::CastleKingSide | MoveKind::CastleQueenSide))
        .collect()
}

#[test]
fn test_ray_tables_only_mark_lines() {
    let ortho = |d: i16| ORTHOGONAL_RAYS[(d + RAY_CENTER) as usize];
    let diag = |d: i16| DIAGONAL_RAYS[(d + RAY_CENTER) as usize];

    assert_eq!(ortho(3 * NORTH), NORTH);
    assert_eq!(ortho(7 * WEST), WEST);
    assert_eq!(ortho(NORTH_EAST), 0);
    assert_eq!(diag(5 * SOUTH_WEST), SOUTH_WEST);
    assert_eq!(diag(2 * NORTH), 0);
    assert_eq!(diag(KNIGHT_OFFSETS[0]), 0);
    assert_eq!(ortho(0), 0);
    assert_eq!(diag(0), 0);
}

#[test]
fn test_knight_in_corner() {
    let b = board([
        "....k...", "........", "........", "........", "........", "........", "........",
        "N...K...",
    ]);
    let moves = moves_of(&b, "a1", &Context::initial());
    assert_eq!(targets(&moves), vec!["b3", "c2"]);
    assert!(moves.iter().all(|m| m.kind == MoveKind::Quiet));
}

#[test]
fn test_slider_stops_at_first_piece() {
    let b = board([
        "....k...", "........", "........", "........", "...p....", "........", "...P....",
        "...RK...",
    ]);
    // Own pawn on d2 blocks the file, the king blocks the rank.
    let moves = moves_of(&b, "d1", &Context::initial());
    assert_eq!(targets(&moves), vec!["a1", "b1", "c1"]);

    let b = board([
        "....k...", "........", "........", "........", "...p....", "........", "........",
        "...RK...",
    ]);
    let moves = moves_of(&b, "d1", &Context::initial());
    assert_eq!(
        targets(&moves),
        vec!["a1", "b1", "c1", "d2", "d3", "d4"]
    );
    let capture: Vec<_> = moves.iter().filter(|m| m.is_capture()).collect();
    assert_eq!(capture.len(), 1);
    assert_eq!(capture[0].to, sq("d4"));
}

#[test]
fn test_attacks_respect_blockers() {
    let b = board([
        "....k...", "........", "........", "........", "........", "..n.....", "........",
        "B...K..R",
    ]);
    let bishop = Piece::new(Color::White, PieceKind::Bishop);
    let rook = Piece::new(Color::White, PieceKind::Rook);
    assert!(bishop.attacks(sq("a1"), sq("b2"), &b));
    assert!(bishop.attacks(sq("a1"), sq("c3"), &b));
    assert!(!bishop.attacks(sq("a1"), sq("d4"), &b));
    assert!(!bishop.attacks(sq("a1"), sq("a2"), &b));
    assert!(rook.attacks(sq("h1"), sq("f1"), &b));
    assert!(!rook.attacks(sq("h1"), sq("d1"), &b));
    assert!(rook.attacks(sq("h1"), sq("h8"), &b));
    assert!(!rook.attacks(sq("h1"), sq("a8"), &b));
}

#[test]
fn test_pawn_attacks_depend_on_color() {
    let b = Board::empty();
    let white = Piece::new(Color::White, PieceKind::Pawn);
    let black = Piece::new(Color::Black, PieceKind::Pawn);
    assert!(white.attacks(sq("e4"), sq("d5"), &b));
    assert!(white.attacks(sq("e4"), sq("f5"), &b));
    assert!(!white.attacks(sq("e4"), sq("e5"), &b));
    assert!(!white.attacks(sq("e4"), sq("d3"), &b));
    assert!(black.attacks(sq("e4"), sq("d3"), &b));
    assert!(!black.attacks(sq("e4"), sq("f5"), &b));
}

#[test]
fn test_pawn_steps_from_start() {
    let b = Board::startpos();
    let moves = moves_of(&b, "e2", &Context::initial());
    assert_eq!(
        moves,
        vec![
            Move::new(sq("e2"), sq("e3"), MoveKind::Quiet),
            Move::new(sq("e2"), sq("e4"), MoveKind::DoubleStep),
        ]
    );

    // A blocked first step also blocks the double step.
    let b = board([
        "....k...", "........", "........", "........", "........", "....n...", "....P...",
        "....K...",
    ]);
    assert!(moves_of(&b, "e2", &Context::initial()).is_empty());
}

#[test]
fn test_promotions_come_in_fours() {
    let b = board([
        ".r..k...", "P.......", "........", "........", "........", "........", "........",
        "....K...",
    ]);
    let moves = moves_of(&b, "a7", &Context::initial());
    assert_eq!(moves.len(), 8);
    let quiet: Vec<_> = moves
        .iter()
        .filter(|m| matches!(m.kind, MoveKind::Promotion(_)))
        .map(|m| m.promotion())
        .collect();
    assert_eq!(
        quiet,
        PieceKind::PROMOTIONS.iter().copied().map(Some).collect::<Vec<_>>()
    );
    assert_eq!(
        moves
            .iter()
            .filter(|m| matches!(m.kind, MoveKind::PromotionCapture(_)))
            .count(),
        4
    );
}

#[test]
fn test_en_passant_needs_target_and_victim() {
    let b = board([
        "....k...", "........", "........", "...pP...", "........", "........", "........",
        "....K...",
    ]);
    let mut ctx = Context::initial();
    assert!(
        moves_of(&b, "e5", &ctx)
            .iter()
            .all(|m| m.kind != MoveKind::EnPassant)
    );

    ctx.en_passant = Some(sq("d6"));
    let ep: Vec<_> = moves_of(&b, "e5", &ctx)
        .into_iter()
        .filter(|m| m.kind == MoveKind::EnPassant)
        .collect();
    assert_eq!(ep, vec![Move::new(sq("e5"), sq("d6"), MoveKind::EnPassant)]);

    // Target set but the pawn beside is missing.
    let b = board([
        "....k...", "........", "........", "....P...", "........", "........", "........",
        "....K...",
    ]);
    assert!(
        moves_of(&b, "e5", &ctx)
            .iter()
            .all(|m| m.kind != MoveKind::EnPassant)
    );
}

#[test]
fn test_castling_both_wings_when_clear() {
    let b = board(CASTLE_BASE);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleQueenSide, MoveKind::CastleKingSide]
    );
}

#[test]
fn test_castling_needs_rights() {
    let b = board(CASTLE_BASE);
    let mut ctx = Context::initial();
    ctx.castling[Color::White.idx()].king_side = false;
    assert_eq!(castles(&b, &ctx), vec![MoveKind::CastleQueenSide]);
    ctx.castling[Color::White.idx()] = CastlingRights::NONE;
    assert!(castles(&b, &ctx).is_empty());
}

#[test]
fn test_castling_needs_empty_transit() {
    let b = board([
        "....k...", "........", "........", "........", "........", "........", "........",
        "RN..K..R",
    ]);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleKingSide]
    );
    let b = board([
        "....k...", "........", "........", "........", "........", "........", "........",
        "R...KB.R",
    ]);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleQueenSide]
    );
}

#[test]
fn test_castling_needs_rook_at_home() {
    let b = board([
        "....k...", "........", "........", "........", "........", "........", "........",
        "....K..N",
    ]);
    assert!(castles(&b, &Context::initial()).is_empty());
}

#[test]
fn test_castling_not_out_of_or_through_check() {
    // In check: no castling at all.
    let b = board([
        "....k...", "........", "........", "....r...", "........", "........", "........",
        "R...K..R",
    ]);
    assert!(castles(&b, &Context::initial()).is_empty());

    // f1 attacked: king side gone.
    let b = board([
        "....k...", "........", "........", ".....r..", "........", "........", "........",
        "R...K..R",
    ]);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleQueenSide]
    );

    // Destination g1 attacked.
    let b = board([
        "....k...", "........", "........", "......r.", "........", "........", "........",
        "R...K..R",
    ]);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleQueenSide]
    );

    // b1 attacked does not matter, d1 does.
    let b = board([
        "....k...", "........", "........", ".r......", "........", "........", "........",
        "R...K..R",
    ]);
    assert_eq!(castles(&b, &Context::initial()).len(), 2);
    let b = board([
        "....k...", "........", "........", "...r....", "........", "........", "........",
        "R...K..R",
    ]);
    assert_eq!(
        castles(&b, &Context::initial()),
        vec![MoveKind::CastleKingSide]
    );
}

#[test]
fn test_king_off_home_square_never_castles() {
    let b = board([
        "....k...", "........", "........", "........", "........", "........", "........",
        "R..K...R",
    ]);
    let moves = moves_of(&b, "d1", &Context::initial());
    assert!(
        moves
            .iter()
            .all(|m| !matches!(m.kind, MoveKind::CastleKingSide | MoveKind::CastleQueenSide))
    );
}

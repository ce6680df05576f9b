//! Perft benchmark for profiling with cargo-flamegraph.
//!
//! Usage:
//!   cargo flamegraph --example perft_bench -p chess_core -- [depth] [moves...]
//!
//! Examples:
//!   # Default: depth 4 over the bundled positions
//!   cargo flamegraph --example perft_bench -p chess_core
//!
//!   # Custom depth
//!   cargo flamegraph --example perft_bench -p chess_core -- 5
//!
//!   # Position reached by playing moves from the start
//!   cargo flamegraph --example perft_bench -p chess_core -- 4 e2e4 e7e5 g1f3

use chess_core::{Board, CastlingRights, Color, Context, Game, perft};
use std::env;
use std::time::Instant;

/// Standard test positions, rank 8 first.
const TEST_POSITIONS: &[(&str, [&str; 8], [CastlingRights; 2])] = &[
    (
        "Starting position",
        [
            "rnbqkbnr", "pppppppp", "........", "........", "........", "........",
            "PPPPPPPP", "RNBQKBNR",
        ],
        [CastlingRights::BOTH; 2],
    ),
    (
        "Kiwipete",
        [
            "r...k..r", "p.ppqpb.", "bn..pnp.", "...PN...", ".p..P...", "..N..Q.p",
            "PPPBBPPP", "R...K..R",
        ],
        [CastlingRights::BOTH; 2],
    ),
    (
        "Position 3",
        [
            "........", "..p.....", "...p....", "KP.....r", ".R...p.k", "........",
            "....P.P.", "........",
        ],
        [CastlingRights::NONE; 2],
    ),
    (
        "Position 4",
        [
            "r...k..r", "Pppp.ppp", ".b...nbN", "nP......", "BBP.P...", "q....N..",
            "Pp.P..PP", "R..Q.RK.",
        ],
        [CastlingRights::NONE, CastlingRights::BOTH],
    ),
];

fn main() {
    let args: Vec<String> = env::args().collect();

    let depth: u8 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4);

    if args.len() > 2 {
        run_from_moves(&args[2..], depth);
    } else {
        run_all_positions(depth);
    }
}

fn run_from_moves(moves: &[String], depth: u8) {
    let mut game = match Game::replay(moves) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("cannot set up position: {e}");
            std::process::exit(1);
        }
    };

    println!("{}", game.board());
    println!("Depth: {depth}");
    println!();

    // Warm-up run at lower depth
    if depth > 2 {
        let _ = perft(&mut game, depth.saturating_sub(2));
    }

    let start = Instant::now();
    let nodes = perft(&mut game, depth);
    let elapsed = start.elapsed();

    println!("Nodes: {nodes}");
    println!("Time: {elapsed:.3?}");
    println!("NPS: {:.0}", nps(nodes, elapsed.as_secs_f64()));
}

fn run_all_positions(depth: u8) {
    println!("=== Perft Benchmark Suite ===");
    println!("Depth: {depth}");
    println!();

    let mut total_nodes = 0u64;
    let mut total_time = std::time::Duration::ZERO;

    for (name, rows, castling) in TEST_POSITIONS {
        let ctx = Context {
            castling: *castling,
            en_passant: None,
        };
        let board = Board::from_diagram(*rows).expect("bundled diagram");
        let mut game = Game::from_parts(board, ctx, Color::White).expect("bundled position");

        print!("{name:.<30}");

        let start = Instant::now();
        let nodes = perft(&mut game, depth);
        let elapsed = start.elapsed();

        total_nodes += nodes;
        total_time += elapsed;

        println!(
            " {nodes:>12} nodes in {elapsed:>8.3?} ({:>10.0} nps)",
            nps(nodes, elapsed.as_secs_f64())
        );
    }

    println!();
    println!("{:=<70}", "");
    println!(
        "TOTAL: {total_nodes} nodes in {total_time:.3?} ({:.0} nps)",
        nps(total_nodes, total_time.as_secs_f64())
    );
}

fn nps(nodes: u64, secs: f64) -> f64 {
    if secs > 0.0 { nodes as f64 / secs } else { 0.0 }
}

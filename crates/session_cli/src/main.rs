//! Session CLI
//!
//! Replays stored matches and drives scripted sessions in-process.

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use chess_core::{Game, GameStatus};
use match_session::{
    InMemoryStore, MatchRecord, ServerMessage, SessionConfig, SessionHub,
};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCRIPT: &[&str] = &["e2e4", "e7e5", "g1f3", "b8c6"];

fn print_usage() {
    println!("Chess session runner");
    println!();
    println!("Usage:");
    println!("  chess_session replay <move>...");
    println!("  chess_session replay --record <file.json>");
    println!("  chess_session demo [--config <file.toml>] [--draw] [<move>...]");
    println!();
    println!("Moves use origin and destination squares, with an optional");
    println!("promotion letter: e2e4, a7a8Q.");
    println!();
    println!("Examples:");
    println!("  chess_session replay f2f3 e7e5 g2g4 d8h4");
    println!("  chess_session demo --draw e2e4 e7e5 g1f3");
}

fn run_replay(args: &[String]) -> Result<()> {
    let moves: Vec<String> = match args {
        [flag, path] if flag == "--record" => {
            let record = MatchRecord::load(Path::new(path))
                .with_context(|| format!("loading match record {path}"))?;
            let black = record.black.as_deref().unwrap_or("-");
            println!("Match {} ({} vs {black})", record.id, record.white);
            record.history
        }
        [] => bail!("replay needs moves or --record <file>"),
        moves => moves.to_vec(),
    };

    let game = Game::replay(&moves).context("replaying move list")?;
    println!("{}", game.board());
    println!("Moves: {}", game.history().join(" "));
    match game.status() {
        GameStatus::InProgress { check } => {
            let suffix = if check { " (in check)" } else { "" };
            println!("In progress, {} to move{suffix}", game.turn());
        }
        GameStatus::Checkmate { winner } => println!("Checkmate, {winner} wins"),
        GameStatus::Stalemate => println!("Stalemate"),
    }
    Ok(())
}

async fn run_demo(args: &[String]) -> Result<()> {
    let mut config = SessionConfig::default();
    let mut offer_draw = false;
    let mut script: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config needs a path");
                };
                config = SessionConfig::load(path)
                    .with_context(|| format!("loading config {path}"))?;
                i += 1;
            }
            "--draw" => offer_draw = true,
            mv => script.push(mv.to_string()),
        }
        i += 1;
    }
    if script.is_empty() {
        script = DEFAULT_SCRIPT.iter().map(|s| s.to_string()).collect();
    }

    let hub = SessionHub::new(Arc::new(InMemoryStore::new()), config);
    let handle = hub.host("white").await?;
    let mut events = handle.subscribe();
    handle.join("black").await?;
    info!(id = %handle.id(), moves = script.len(), "demo session started");

    let players = ["white", "black"];
    let last = script.len() - 1;
    for (ply, mv) in script.iter().enumerate() {
        let player = players[ply % 2];
        let request_draw = offer_draw && ply == last;
        if let Some(reply) = handle.submit_move(player, mv, request_draw).await? {
            println!("to {player}: {}", reply.to_json());
        }
    }
    if offer_draw {
        handle.accept_draw(players[script.len() % 2]).await?;
    }

    loop {
        match events.try_recv() {
            Ok(msg) => print_event(&msg),
            Err(TryRecvError::Lagged(n)) => println!("({n} events dropped)"),
            Err(_) => break,
        }
    }

    let status = handle.status("white").await?;
    println!("status: {}", serde_json::to_string(&status)?);
    hub.shutdown().await;
    Ok(())
}

fn print_event(msg: &ServerMessage) {
    println!("broadcast: {}", msg.to_json());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "replay" => run_replay(&args[2..]),
        "demo" => run_demo(&args[2..]).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            Ok(())
        }
    }
}

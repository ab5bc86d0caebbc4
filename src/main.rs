//! Strictly Gomoku - terminal front end
//!
//! Plays games through the same dispatcher a chat front end would use and
//! reads rankings from the SQLite record store.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, REPL_HELP, ReplInput, parse_input};
use std::io::{BufRead, Write};
use std::sync::Arc;
use strictly_gomoku::{
    BoardSnapshot, CommandKind, Dispatcher, EngineConfig, HeuristicEvaluator, Phase, RecordStore,
    Reply, RetryingRecordStore, SqliteRecordStore, Stone,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

/// Context id used for the single terminal game.
const TERMINAL_CONTEXT: &str = "terminal";

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_gomoku=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.db_path)?;
    let dispatcher = build_dispatcher(config)?;

    match cli.command {
        Command::Play {
            hotseat,
            black,
            white,
        } => run_play(&dispatcher, hotseat, &black, &white),
        Command::Leaderboard => run_leaderboard(&dispatcher),
        Command::Stats { player } => run_stats(&dispatcher, &player),
    }
}

/// Loads the config file if given, then applies command-line overrides.
#[instrument]
fn load_config(path: Option<&std::path::Path>, db_path: Option<String>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    Ok(match db_path {
        Some(db_path) => config.with_db_path(db_path),
        None => config,
    })
}

/// Opens the record store and wires up the dispatcher.
#[instrument(skip(config), fields(db_path = %config.db_path()))]
fn build_dispatcher(config: EngineConfig) -> Result<Dispatcher> {
    let store = SqliteRecordStore::open(config.db_path().clone())
        .with_context(|| format!("opening records at {}", config.db_path()))?;
    let records: Arc<dyn RecordStore> = Arc::new(RetryingRecordStore::new(
        store,
        *config.record_retry_attempts(),
        config.record_retry_backoff(),
    ));
    info!("Record store ready");
    Ok(Dispatcher::new(config, Arc::new(HeuristicEvaluator::new()), records))
}

/// Runs an interactive game on stdin/stdout.
#[instrument(skip(dispatcher))]
fn run_play(dispatcher: &Dispatcher, hotseat: bool, black: &str, white: &str) -> Result<()> {
    let start = dispatcher.dispatch(strictly_gomoku::Command::new(
        TERMINAL_CONTEXT,
        black,
        CommandKind::NewGame {
            vs_ai: !hotseat,
            force: true,
        },
    ))?;
    let mut reply = start.reply;
    if hotseat {
        reply = dispatcher
            .dispatch(strictly_gomoku::Command::new(TERMINAL_CONTEXT, white, CommandKind::Join))?
            .reply;
    }
    let Reply::Board(mut board) = reply else {
        anyhow::bail!("unexpected reply when starting a game");
    };

    println!("{}", REPL_HELP);
    println!("{}", board.render());
    let size = board.size;
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next().transpose()? else {
            break;
        };
        let kind = match parse_input(&line, size) {
            Ok(ReplInput::Command(kind)) => kind,
            Ok(ReplInput::Help) => {
                println!("{}", REPL_HELP);
                continue;
            }
            Ok(ReplInput::Quit) => break,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        let actor = if hotseat {
            hotseat_actor(&board, &kind).unwrap_or(black).to_string()
        } else {
            black.to_string()
        };
        match dispatcher.dispatch(strictly_gomoku::Command::new(TERMINAL_CONTEXT, actor, kind)) {
            Ok(dispatched) => {
                if let Reply::Board(snapshot) = dispatched.reply {
                    board = snapshot;
                    println!("{}", board.render());
                }
                if let Some(outcome) = dispatched.outcome {
                    println!("{}", outcome);
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Command rejected");
                println!("{}", e);
            }
        }
    }
    Ok(())
}

/// Which hotseat player a command speaks for.
fn hotseat_actor<'a>(board: &'a BoardSnapshot, kind: &CommandKind) -> Option<&'a str> {
    let stone = match (kind, board.phase) {
        (CommandKind::Undo, _) => board.last_move.map(|m| m.stone)?,
        (CommandKind::RespondDraw { .. }, Phase::DrawOffered { by }) => by.opponent(),
        _ => board.to_move?,
    };
    match stone {
        Stone::Black => board.black_id.as_deref(),
        Stone::White => board.white_id.as_deref(),
    }
}

/// Prints the leaderboard.
#[instrument(skip(dispatcher))]
fn run_leaderboard(dispatcher: &Dispatcher) -> Result<()> {
    let reply = dispatcher
        .dispatch(strictly_gomoku::Command::new(TERMINAL_CONTEXT, "", CommandKind::Leaderboard))?
        .reply;
    let Reply::Leaderboard(entries) = reply else {
        anyhow::bail!("unexpected reply to leaderboard request");
    };
    if entries.is_empty() {
        println!("No games recorded yet.");
        return Ok(());
    }
    println!("{:>4}  {:<20} {:>5} {:>6} {:>5}", "Rank", "Player", "Wins", "Losses", "Draws");
    for entry in entries {
        println!(
            "{:>4}  {:<20} {:>5} {:>6} {:>5}",
            entry.rank, entry.player_id, entry.wins, entry.losses, entry.draws
        );
    }
    Ok(())
}

/// Prints one player's record.
#[instrument(skip(dispatcher))]
fn run_stats(dispatcher: &Dispatcher, player: &str) -> Result<()> {
    let reply = dispatcher
        .dispatch(strictly_gomoku::Command::new(
            TERMINAL_CONTEXT,
            player,
            CommandKind::Stats(player.to_string()),
        ))?
        .reply;
    let Reply::Stats(stats) = reply else {
        anyhow::bail!("unexpected reply to stats request");
    };
    let record = &stats.record;
    println!("{}", record.player_id());
    println!(
        "  {} games: {} wins, {} losses, {} draws",
        stats.games,
        record.wins(),
        record.losses(),
        record.draws()
    );
    println!("  win rate {:.1}%, streak {}", stats.win_rate, record.streak());
    Ok(())
}

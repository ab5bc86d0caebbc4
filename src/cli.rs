//! Command-line interface for strictly_gomoku.

use clap::{Parser, Subcommand};
use strictly_gomoku::{CommandKind, Position};

/// Strictly Gomoku - five in a row against a friend or the built-in AI
#[derive(Parser, Debug)]
#[command(name = "strictly_gomoku")]
#[command(about = "Multi-session gomoku engine with persistent rankings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Path to the records database (overrides the config file)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal
    Play {
        /// Two humans share the terminal instead of playing the AI
        #[arg(long)]
        hotseat: bool,

        /// Player id for Black (you, against the AI)
        #[arg(long, default_value = "black")]
        black: String,

        /// Player id for White in hotseat games
        #[arg(long, default_value = "white")]
        white: String,
    },

    /// Show the leaderboard
    Leaderboard,

    /// Show one player's record
    Stats {
        /// Player id
        player: String,
    },
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    /// Forward to the dispatcher.
    Command(CommandKind),
    /// Print the command summary.
    Help,
    /// Leave the game.
    Quit,
}

/// Help text for the REPL.
pub const REPL_HELP: &str = "\
Enter a coordinate such as H8 to place a stone, or one of:
  undo       take back your last move
  draw       offer a draw
  accept     accept a draw offer
  decline    decline a draw offer
  surrender  resign the game
  board      show the board
  quit       leave";

/// Parses a REPL line for a board of edge `size`.
///
/// # Errors
///
/// Returns a message describing unrecognised input.
pub fn parse_input(line: &str, size: usize) -> Result<ReplInput, String> {
    let word = line.trim().to_ascii_lowercase();
    let kind = match word.as_str() {
        "" => return Err("Empty input".to_string()),
        "help" | "?" => return Ok(ReplInput::Help),
        "quit" | "exit" => return Ok(ReplInput::Quit),
        "undo" => CommandKind::Undo,
        "draw" => CommandKind::OfferDraw,
        "accept" => CommandKind::RespondDraw { accept: true },
        "decline" => CommandKind::RespondDraw { accept: false },
        "surrender" | "resign" => CommandKind::Surrender,
        "board" => CommandKind::ViewBoard,
        other => match Position::from_label(other, size) {
            Some(pos) => CommandKind::Place(pos),
            None => return Err(format!("Unrecognised input '{}'. Type help for commands.", line.trim())),
        },
    };
    Ok(ReplInput::Command(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(
            parse_input("H8", 15),
            Ok(ReplInput::Command(CommandKind::Place(Position::new(7, 7))))
        );
        assert_eq!(
            parse_input(" a1 ", 15),
            Ok(ReplInput::Command(CommandKind::Place(Position::new(0, 0))))
        );
        assert!(parse_input("P1", 15).is_err());
        assert!(parse_input("H16", 15).is_err());
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_input("UNDO", 15), Ok(ReplInput::Command(CommandKind::Undo)));
        assert_eq!(
            parse_input("decline", 15),
            Ok(ReplInput::Command(CommandKind::RespondDraw { accept: false }))
        );
        assert_eq!(parse_input("quit", 15), Ok(ReplInput::Quit));
        assert!(parse_input("", 15).is_err());
    }

    #[test]
    fn test_cli_parses_play() {
        let cli = Cli::try_parse_from(["strictly_gomoku", "play", "--hotseat", "--black", "ann"])
            .expect("valid args");
        match cli.command {
            Command::Play { hotseat, black, white } => {
                assert!(hotseat);
                assert_eq!(black, "ann");
                assert_eq!(white, "white");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

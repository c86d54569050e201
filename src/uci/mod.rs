//! Universal Chess Interface (UCI) protocol implementation.
//!
//! Handles communication with chess GUIs following the UCI specification.

use std::fmt;

use crate::board::{Board, FenError, Move, MoveParseError};

pub mod command;
pub mod options;
pub mod print;
pub mod report;
pub mod time;

/// Error type for UCI position command parsing
#[derive(Debug, Clone)]
pub enum UciError {
    /// Invalid FEN string
    InvalidFen(FenError),
    /// Invalid move in the move list
    InvalidMove { move_str: String, error: MoveParseError },
    /// Missing required parts in the command
    MissingParts,
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::InvalidFen(e) => write!(f, "Invalid FEN: {e}"),
            UciError::InvalidMove { move_str, error } => {
                write!(f, "Invalid move '{move_str}': {error}")
            }
            UciError::MissingParts => write!(f, "Missing required parts in position command"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::InvalidFen(e)
    }
}

/// Parse a move in UCI format (e.g., "e2e4", "e7e8q").
///
/// Delegates to `Board::parse_move`. Returns `None` if the move is invalid.
#[must_use]
pub fn parse_uci_move(board: &mut Board, uci_string: &str) -> Option<Move> {
    board.parse_move(uci_string).ok()
}

/// Parse a UCI position command, returning an error on failure.
///
/// Supports both "position startpos" and "position fen <fen>" formats,
/// optionally followed by "moves <move1> <move2> ...".
pub fn try_parse_position_command(board: &mut Board, parts: &[&str]) -> Result<(), UciError> {
    let mut i = 1;

    if i >= parts.len() {
        return Err(UciError::MissingParts);
    }

    if parts[i] == "startpos" {
        *board = Board::new();
        i += 1;
    } else if parts[i] == "fen" {
        if i + 6 >= parts.len() {
            return Err(UciError::MissingParts);
        }
        let fen = parts[i + 1..i + 7].join(" ");
        *board = Board::try_from_fen(&fen)?;
        i += 7;
    } else {
        return Err(UciError::MissingParts);
    }

    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            let mv = board.parse_move(parts[i]).map_err(|e| UciError::InvalidMove {
                move_str: parts[i].to_string(),
                error: e,
            })?;
            board.make_move(mv);
            i += 1;
        }
    }

    Ok(())
}

/// Parse a UCI position command, printing errors to stderr on failure.
///
/// This is a convenience wrapper around `try_parse_position_command` for
/// use in the main UCI loop where errors should be logged but not propagated.
pub fn parse_position_command(board: &mut Board, parts: &[&str]) {
    if let Err(e) = try_parse_position_command(board, parts) {
        eprintln!("Error: {e}");
    }
}

#[must_use]
pub fn format_uci_move(mv: &Move) -> String {
    mv.to_string()
}

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::board::DEFAULT_TT_MB;
use crate::engine::time::{build_search_request, TimeConfig, TimeControl};
use crate::engine::{EngineController, SearchParams as EngineSearchParams};

use command::{parse_go_params, parse_uci_command, GoParams, UciCommand};
use options::{parse_setoption, UciOptionAction, UciOptions};
use print::print_perft_info;
use report::{print_bestmove, print_ready};

/// Build the time control for a `go` command from the board's side to move.
fn time_control_for_go(white_to_move: bool, go: &GoParams) -> TimeControl {
    if let Some(ms) = go.movetime {
        return TimeControl::move_time_ms(ms);
    }
    if go.infinite || go.ponder {
        return TimeControl::default();
    }

    let (time_ms, inc_ms) = if white_to_move {
        (go.wtime, go.winc.unwrap_or(0))
    } else {
        (go.btime, go.binc.unwrap_or(0))
    };

    match time_ms {
        Some(ms) => TimeControl::incremental(
            Duration::from_millis(ms),
            Duration::from_millis(inc_ms),
            go.movestogo,
        ),
        None => TimeControl::default(),
    }
}

/// Run the blocking UCI stdin/stdout loop.
///
/// Reads commands until `quit` (or EOF), driving an `EngineController` for
/// search, pondering and time management.
pub fn run_uci_loop() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut controller = EngineController::new(DEFAULT_TT_MB);
    let mut ui_options = UciOptions::new(DEFAULT_TT_MB);
    let time_config = TimeConfig::default();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(cmd) = parse_uci_command(&line) else {
            continue;
        };

        match cmd {
            UciCommand::Uci => {
                let params = controller
                    .with_search_state_ref(|state| state.params().clone())
                    .unwrap_or_default();
                ui_options.print(&params);
            }
            UciCommand::IsReady => print_ready(),
            UciCommand::UciNewGame => controller.new_game(),
            UciCommand::Position(parts) => {
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                parse_position_command(controller.board_mut(), &refs);
            }
            UciCommand::SetOption(parts) => {
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                if let Some((name, value)) = parse_setoption(&refs) {
                    let action = controller.with_search_state(|state| {
                        ui_options.apply_setoption(&name, value.as_deref(), state)
                    });
                    match action.flatten() {
                        Some(UciOptionAction::ReinitHash(mb)) => controller.resize_hash(mb),
                        Some(UciOptionAction::SetThreads(threads)) => {
                            controller.set_threads(threads);
                        }
                        None => {}
                    }
                }
            }
            UciCommand::Debug(mode) => {
                let trace = matches!(mode.as_deref(), Some("on"));
                controller.with_search_state(|state| state.set_trace(trace));
            }
            UciCommand::Perft(depth) => {
                let mut board = controller.board().clone();
                let start = std::time::Instant::now();
                let nodes = board.perft(depth);
                print_perft_info(depth, nodes, start.elapsed());
            }
            UciCommand::Go(parts) => {
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                let go = parse_go_params(&refs);
                let white_to_move = controller.board().white_to_move();
                let time_control = time_control_for_go(white_to_move, &go);

                let (request, _) = build_search_request(
                    time_control,
                    go.depth,
                    go.nodes,
                    go.ponder,
                    go.infinite,
                    &time_config,
                );

                let params = EngineSearchParams {
                    depth: request.depth,
                    soft_time_ms: request.soft_time_ms,
                    hard_time_ms: request.hard_time_ms,
                    ponder: request.ponder,
                    infinite: request.infinite,
                    multi_pv: ui_options.multi_pv,
                };

                controller.start_search(params, |result| {
                    print_bestmove(result.best_move);
                    if let Some(ponder) = result.ponder_move {
                        println!("info string ponder {}", format_uci_move(&ponder));
                    }
                });
            }
            UciCommand::Stop => controller.stop_search(),
            UciCommand::PonderHit => controller.ponderhit(),
            UciCommand::Quit => break,
            UciCommand::Unknown(_) => {}
        }

        let _ = stdout.flush();
    }

    controller.stop_search();
}

//! # Concurrent MCTS Self-Play
//!
//! Plays a game of tic-tac-toe between two copies of the engine sharing one
//! search tree. Background workers search continuously; before each move the
//! controller pauses them, picks the most visited move, re-roots the tree on
//! it and lets the workers continue from the new position.
//!
//! ## Usage
//! Run with `cargo run --release -- --workers 8 --think-ms 500`.
//! Set `RUST_LOG=debug` to see root shifts as they happen.

use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use mcts::games::tictactoe::TicTacToeState;
use mcts::{spawn_workers, stop_workers, PauseBarrier, SearchConfig, SearchEngine, SearchError, SearchableState};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of background search workers (default: number of CPUs)
    #[arg(long)]
    workers: Option<usize>,

    /// Thinking time per move in milliseconds
    #[arg(long, default_value_t = 1000)]
    think_ms: u64,

    /// Seed for the engine's random source
    #[arg(long)]
    seed: Option<u64>,

    /// Search on the main thread instead of using background workers
    #[arg(long, default_value_t = false)]
    single_threaded: bool,

    /// Print per-move search statistics
    #[arg(long, default_value_t = false)]
    stats: bool,
}

impl Args {
    fn to_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            think_time: Duration::from_millis(self.think_ms),
            seed: self.seed,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SearchError> {
    let config = args.to_config();
    config.validate()?;

    let initial = TicTacToeState::new();
    let engine = Arc::new(match config.seed {
        Some(seed) => SearchEngine::with_seed(initial.clone(), seed)?,
        None => SearchEngine::new(initial.clone())?,
    });

    println!("{}", "Concurrent MCTS - Tic-Tac-Toe Self-Play".bold());
    println!("====================================");
    if args.single_threaded {
        println!("Workers: none (single-threaded)");
    } else {
        println!("Workers: {}", config.workers);
    }
    println!("Think time: {:?}", config.think_time);
    println!("------------------------------------");
    print_board(&initial);

    #[cfg(debug_assertions)]
    println!("WARNING: Running in debug mode. Search will be significantly slower.\n");

    let final_state = if args.single_threaded {
        play_game(&engine, None, &config, args.stats)?
    } else {
        let barrier = Arc::new(PauseBarrier::new(config.workers));
        let workers = spawn_workers(&engine, &barrier, config.workers)?;
        let result = play_game(&engine, Some(&barrier), &config, args.stats);
        let total = stop_workers(workers)?;
        log::info!("workers completed {} simulations in total", total);
        result?
    };

    let outcome = match final_state.get_winner() {
        Some(1) => "X wins".red().bold(),
        Some(_) => "O wins".blue().bold(),
        None => "Draw".yellow().bold(),
    };
    println!("Game over: {}", outcome);
    Ok(())
}

/// Plays the game to the end, one engine move per turn.
///
/// With a barrier the workers search while this thread sleeps, and every root
/// shift happens inside a pause. Without one, this thread does the searching.
fn play_game(
    engine: &SearchEngine<TicTacToeState>,
    barrier: Option<&PauseBarrier>,
    config: &SearchConfig,
    show_stats: bool,
) -> Result<TicTacToeState, SearchError> {
    let mut state = engine.root_state();
    let mut move_number = 1;
    while !state.is_terminal() {
        match barrier {
            Some(barrier) => {
                thread::sleep(config.think_time);
                barrier.pause()?;
                let next = choose_and_shift(engine, show_stats);
                barrier.resume();
                state = next?;
            }
            None => {
                engine.simulate_for(config.think_time)?;
                state = choose_and_shift(engine, show_stats)?;
            }
        }

        let mover = if state.get_current_player() == 1 { "O".blue() } else { "X".red() };
        let played = state.label();
        println!("{}. {} plays {}", move_number, mover, played.bold());
        print_board(&state);
        move_number += 1;
    }
    Ok(state)
}

/// Picks the engine's move and makes it the new root.
fn choose_and_shift(engine: &SearchEngine<TicTacToeState>, show_stats: bool) -> Result<TicTacToeState, SearchError> {
    let next = engine.get_next_state()?;
    if show_stats {
        println!(
            "{}",
            format!("root visits: {}, tree size: {}", engine.root_visits(), engine.tree_size()).dimmed()
        );
        print!("{}", engine.diagnostic_summary().dimmed());
    }
    engine.shift_root(&next)?;
    Ok(next)
}

fn print_board(state: &TicTacToeState) {
    for row in state.board().chunks(3) {
        let cells: Vec<String> = row
            .iter()
            .map(|&cell| match cell {
                1 => "X".red().to_string(),
                -1 => "O".blue().to_string(),
                _ => ".".dimmed().to_string(),
            })
            .collect();
        println!("  {}", cells.join(" "));
    }
    println!();
}

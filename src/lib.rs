//! # Concurrent Monte Carlo Tree Search
//!
//! A generic MCTS engine for two-player, perfect-information games. Any state
//! type implementing [`SearchableState`] can be searched, either directly on
//! the calling thread with [`SearchEngine::simulate`] or by a pool of
//! background [`Worker`]s that keep growing one shared tree.
//!
//! Every tree node has its own lock, so workers only contend when they touch
//! the same node. A [`PauseBarrier`] lets a controller park all workers, move
//! the root after a real move has been played, and let them carry on:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mcts::games::tictactoe::TicTacToeState;
//! use mcts::{spawn_workers, stop_workers, PauseBarrier, SearchEngine};
//!
//! # fn main() -> Result<(), mcts::SearchError> {
//! let engine = Arc::new(SearchEngine::new(TicTacToeState::new())?);
//! let barrier = Arc::new(PauseBarrier::new(4));
//! let workers = spawn_workers(&engine, &barrier, 4)?;
//!
//! std::thread::sleep(Duration::from_millis(200));
//! barrier.pause()?;
//! let next = engine.get_next_state()?;
//! engine.shift_root(&next)?;
//! barrier.resume();
//!
//! stop_workers(workers)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod games;
pub mod node;
pub mod pause;
pub mod worker;

pub use config::SearchConfig;
pub use engine::{uct, Budget, ChildStats, SearchEngine, EXPLORATION};
pub use error::SearchError;
pub use node::Node;
pub use pause::PauseBarrier;
pub use worker::{spawn_workers, stop_workers, Worker, WorkerHandle};

/// A game position the engine can search.
///
/// Positions are immutable values: the engine never changes one, it only asks
/// for successors. Equality must compare positions, not the move history that
/// led to them, since root shifting finds the matching child by equality.
/// `Send` and `Sync` are required for parallel processing.
pub trait SearchableState: Clone + PartialEq + Send + Sync + 'static {
    /// Returns true if the game is over.
    fn is_terminal(&self) -> bool;

    /// The player to move, as one of two sides.
    fn current_player(&self) -> bool;

    /// Every position reachable in one legal move. Order does not matter, but
    /// the list must not be empty for a non-terminal position.
    fn legal_successors(&self) -> Vec<Self>;

    /// Plays the game to the end with the state's own fallback policy and
    /// scores the result for `perspective`: 1.0 for a win, 0.5 for a draw and
    /// 0.0 for a loss. Intermediate values in `[0, 1]` are allowed.
    fn rollout_score(&self, perspective: bool) -> f64;

    /// Short label for diagnostics.
    fn label(&self) -> String;
}

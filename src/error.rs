//! Error types shared by the search engine, its workers and the pause barrier.

use thiserror::Error;

/// Errors that can occur while building or driving a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The requested operation does not fit the current root, e.g. shifting to a
    /// state that is not a legal successor, shifting a terminal root, or asking
    /// for a move before the root has been expanded.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A configuration value or the initial state was rejected up front.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The state type broke its contract in the middle of a search. This is a
    /// defect in the game implementation, not something the engine can recover from.
    #[error("State contract violated: {0}")]
    ContractViolation(String),

    /// The pause barrier was closed while a caller was waiting on it.
    #[error("Pause barrier closed while waiting")]
    BarrierClosed,

    /// The operating system refused to spawn a worker thread.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

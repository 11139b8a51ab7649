//! # Search Configuration
//!
//! Knobs for a search session: how many background workers grow the tree,
//! how long the controller lets them think per move, and an optional seed for
//! the engine-wide random source. The exploration constant is not
//! configurable; selection always uses UCT with `c = sqrt(2)`.

use crate::SearchError;
use std::time::Duration;

/// Smallest allowed number of background workers.
pub const MIN_WORKERS: usize = 1;
/// Largest allowed number of background workers.
pub const MAX_WORKERS: usize = 64;
/// Shortest allowed thinking time per move.
pub const MIN_THINK_TIME: Duration = Duration::from_millis(1);
/// Longest allowed thinking time per move.
pub const MAX_THINK_TIME: Duration = Duration::from_secs(3600);

/// Settings for a search session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of background workers sharing the tree
    pub workers: usize,
    /// Wall-clock time the controller lets the workers search before each move
    pub think_time: Duration,
    /// Seed for the engine-wide random source; `None` seeds from the thread RNG
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(MIN_WORKERS, MAX_WORKERS),
            think_time: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Returns
    /// `Ok(())` if the configuration is usable, otherwise a
    /// [`SearchError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(SearchError::Configuration(format!(
                "workers must be between {} and {}, got {}",
                MIN_WORKERS, MAX_WORKERS, self.workers
            )));
        }
        if self.think_time < MIN_THINK_TIME || self.think_time > MAX_THINK_TIME {
            return Err(SearchError::Configuration(format!(
                "think time must be between {:?} and {:?}, got {:?}",
                MIN_THINK_TIME, MAX_THINK_TIME, self.think_time
            )));
        }
        Ok(())
    }
}

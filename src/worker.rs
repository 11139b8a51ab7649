//! # Background Search Workers
//!
//! A [`Worker`] runs the engine's four-phase loop on its own thread until
//! asked to stop. Workers share the tree with no coordination beyond the
//! per-node locks. When a [`PauseBarrier`] is attached, each iteration starts
//! with a checkpoint so a controller can park every worker before touching
//! the tree.

use crate::{PauseBarrier, SearchEngine, SearchError, SearchableState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A search worker that has not been started yet.
pub struct Worker<S: SearchableState> {
    /// The shared engine to search with
    engine: Arc<SearchEngine<S>>,
    /// Barrier to check in with between iterations, if any
    barrier: Option<Arc<PauseBarrier>>,
    /// Cooperative stop signal, observed between iterations
    stop: Arc<AtomicBool>,
    /// Index used in the thread name and log lines
    id: usize,
}

/// A running worker.
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<Result<u64, SearchError>>,
    id: usize,
}

impl<S: SearchableState> Worker<S> {
    /// Creates a worker for `engine`.
    ///
    /// # Arguments
    /// * `engine` - The engine whose tree this worker grows
    /// * `barrier` - Pause barrier to honor, sized to include this worker
    /// * `id` - Index used to name the worker thread
    pub fn new(engine: Arc<SearchEngine<S>>, barrier: Option<Arc<PauseBarrier>>, id: usize) -> Self {
        Worker {
            engine,
            barrier,
            stop: Arc::new(AtomicBool::new(false)),
            id,
        }
    }

    /// Spawns the worker thread.
    pub fn start(self) -> Result<WorkerHandle, SearchError> {
        let stop = self.stop.clone();
        let id = self.id;
        let thread = thread::Builder::new()
            .name(format!("mcts-worker-{}", id))
            .spawn(move || self.run())?;
        Ok(WorkerHandle { stop, thread, id })
    }

    /// Worker loop. Leaves the barrier's quorum on every exit path.
    fn run(self) -> Result<u64, SearchError> {
        let _retire = self.barrier.as_deref().map(RetireOnDrop);
        log::info!("worker {} started", self.id);

        let mut iterations = 0;
        while !self.stop.load(Ordering::Acquire) {
            if let Some(barrier) = &self.barrier {
                if !barrier.checkpoint() {
                    break;
                }
                // A stop requested during the pause takes effect before searching again.
                if self.stop.load(Ordering::Acquire) {
                    break;
                }
            }
            if let Err(e) = self.engine.run_simulation() {
                log::error!("worker {} aborted after {} iterations: {}", self.id, iterations, e);
                return Err(e);
            }
            iterations += 1;
        }

        log::info!("worker {} stopped after {} iterations", self.id, iterations);
        Ok(iterations)
    }
}

impl WorkerHandle {
    /// Asks the worker to stop once its current iteration finishes.
    ///
    /// A worker parked in a pause stays parked until the pause is resumed or
    /// the barrier is closed.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns true once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker to exit.
    ///
    /// # Returns
    /// The number of simulations it completed, or the error that ended it.
    /// A panic inside the state implementation is re-raised here.
    pub fn join(self) -> Result<u64, SearchError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => {
                log::error!("worker {} panicked", self.id);
                std::panic::resume_unwind(panic)
            }
        }
    }
}

/// Removes a worker from the barrier's quorum when dropped.
struct RetireOnDrop<'a>(&'a PauseBarrier);

impl Drop for RetireOnDrop<'_> {
    fn drop(&mut self) {
        self.0.retire();
    }
}

/// Creates and starts `count` workers sharing `engine` and `barrier`.
///
/// # Returns
/// The running workers, [`SearchError::Configuration`] if the barrier was not
/// sized for exactly `count` workers, or the spawn error. If a spawn fails,
/// the workers already started are stopped and joined first.
pub fn spawn_workers<S: SearchableState>(
    engine: &Arc<SearchEngine<S>>,
    barrier: &Arc<PauseBarrier>,
    count: usize,
) -> Result<Vec<WorkerHandle>, SearchError> {
    let quorum = barrier.workers();
    if quorum != count {
        return Err(SearchError::Configuration(format!(
            "pause barrier expects {} workers but {} were requested",
            quorum, count
        )));
    }
    start_all(barrier, count, |id| {
        Worker::new(engine.clone(), Some(barrier.clone()), id).start()
    })
}

/// Starts workers `0..count` with `start`, unwinding on the first failure.
fn start_all(
    barrier: &PauseBarrier,
    count: usize,
    mut start: impl FnMut(usize) -> Result<WorkerHandle, SearchError>,
) -> Result<Vec<WorkerHandle>, SearchError> {
    let mut workers = Vec::with_capacity(count);
    for id in 0..count {
        match start(id) {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                // Workers that never ran leave the quorum here; started ones retire on exit.
                for _ in id..count {
                    barrier.retire();
                }
                if let Err(stop_error) = stop_workers(workers) {
                    log::warn!("worker failed while unwinding a failed spawn: {}", stop_error);
                }
                return Err(e);
            }
        }
    }
    Ok(workers)
}

/// Stops every worker and waits for all of them.
///
/// # Returns
/// The total number of simulations completed, or the first worker error.
pub fn stop_workers(workers: Vec<WorkerHandle>) -> Result<u64, SearchError> {
    for worker in &workers {
        worker.request_stop();
    }
    let mut total = 0;
    let mut first_error = None;
    for worker in workers {
        match worker.join() {
            Ok(iterations) => total += iterations,
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(total),
    }
}

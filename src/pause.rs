//! # Pause Barrier
//!
//! A two-phase rendezvous between a fixed set of search workers and a single
//! controller. The controller calls [`PauseBarrier::pause`] and blocks until
//! every worker has parked in [`PauseBarrier::checkpoint`]; it may then mutate
//! the shared tree freely (re-root it, read diagnostics) before calling
//! [`PauseBarrier::resume`], which wakes everyone.
//!
//! Workers call `checkpoint()` once per loop iteration, at a point where they
//! hold no node lock. Outside a pause the call is a single atomic load.
//!
//! ```text
//! Running --pause()--> PauseRequested --N checked in--> Paused --resume()--> Running
//! ```

use crate::SearchError;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Barrier state, guarded by the barrier's mutex.
#[derive(Debug)]
struct BarrierState {
    /// Workers still taking part in the rendezvous
    workers: usize,
    /// Workers currently parked in `checkpoint()`
    checked_in: usize,
    /// Whether a pause is requested or in effect
    paused: bool,
    /// Bumped by every `resume()`, so parked workers can tell a new pause from the one they joined
    generation: u64,
    /// Set by `close()`; all waits return immediately afterwards
    closed: bool,
}

/// Rendezvous gate between `N` workers and one controller.
#[derive(Debug)]
pub struct PauseBarrier {
    state: Mutex<BarrierState>,
    /// Lock-free mirror of `BarrierState::paused` for the checkpoint fast path
    pause_flag: AtomicBool,
    /// Signaled when the checked-in count reaches the quorum
    all_parked: Condvar,
    /// Signaled when the pause ends
    released: Condvar,
}

impl PauseBarrier {
    /// Creates a barrier sized for `workers` participants.
    pub fn new(workers: usize) -> Self {
        PauseBarrier {
            state: Mutex::new(BarrierState {
                workers,
                checked_in: 0,
                paused: false,
                generation: 0,
                closed: false,
            }),
            pause_flag: AtomicBool::new(false),
            all_parked: Condvar::new(),
            released: Condvar::new(),
        }
    }

    /// Returns true while a pause is requested or in effect.
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Number of workers the controller currently waits for.
    pub fn workers(&self) -> usize {
        self.state.lock().workers
    }

    /// Requests a pause and blocks until every worker has checked in.
    ///
    /// Must only be called by the single controller, and not again before the
    /// matching [`resume`](Self::resume).
    ///
    /// # Returns
    /// `Ok(())` once all workers are parked, or [`SearchError::BarrierClosed`]
    /// if the barrier was closed before the quorum was reached.
    pub fn pause(&self) -> Result<(), SearchError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SearchError::BarrierClosed);
        }
        state.paused = true;
        self.pause_flag.store(true, Ordering::Release);
        while state.checked_in < state.workers && !state.closed {
            self.all_parked.wait(&mut state);
        }
        if state.closed {
            return Err(SearchError::BarrierClosed);
        }
        log::trace!("pause reached quorum of {} workers", state.workers);
        Ok(())
    }

    /// Ends the pause and wakes all parked workers.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        state.checked_in = 0;
        state.generation = state.generation.wrapping_add(1);
        self.pause_flag.store(false, Ordering::Release);
        self.all_parked.notify_all();
        self.released.notify_all();
    }

    /// Called by a worker between iterations. Returns at once unless a pause
    /// is requested, in which case the worker checks in and parks until
    /// [`resume`](Self::resume).
    ///
    /// The caller must not hold any node lock.
    ///
    /// # Returns
    /// `true` if the worker should keep going, `false` if the barrier has been
    /// closed and the worker should stop.
    pub fn checkpoint(&self) -> bool {
        if !self.pause_flag.load(Ordering::Acquire) {
            return true;
        }
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        if !state.paused {
            return true;
        }
        state.checked_in += 1;
        if state.checked_in >= state.workers {
            self.all_parked.notify_all();
        }
        let generation = state.generation;
        while state.generation == generation && !state.closed {
            self.released.wait(&mut state);
        }
        !state.closed
    }

    /// Removes one worker from the quorum for good.
    ///
    /// Called by a worker that is about to exit, so a pending or future
    /// `pause()` does not wait for a thread that will never check in.
    pub fn retire(&self) {
        let mut state = self.state.lock();
        state.workers = state.workers.saturating_sub(1);
        if state.paused && state.checked_in >= state.workers {
            self.all_parked.notify_all();
        }
    }

    /// Closes the barrier. Every current and future wait returns: parked workers
    /// are told to stop and a waiting controller gets [`SearchError::BarrierClosed`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.paused = false;
        self.pause_flag.store(true, Ordering::Release);
        self.all_parked.notify_all();
        self.released.notify_all();
    }
}

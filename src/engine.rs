//! # Search Engine
//!
//! [`SearchEngine`] owns the root of a shared search tree and runs the four
//! MCTS phases against it:
//!
//! 1. **Selection**: descend from the root, picking the child with the highest
//!    UCT value at each level, until a node without children is reached.
//! 2. **Expansion**: install every legal successor of that node at once.
//! 3. **Simulation**: roll out a random child (or the node itself when terminal).
//! 4. **Back-propagation**: walk the parent links back to the root, updating
//!    each node's counters under that node's own lock.
//!
//! All methods take `&self`, so an `Arc<SearchEngine<_>>` can be shared by any
//! number of [`Worker`](crate::Worker)s. Only one node lock is ever held at a
//! time, and traversal always runs root to leaf, so no lock-ordering cycle exists.

use crate::node::Node;
use crate::{SearchError, SearchableState};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Exploration constant for UCT.
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// How much searching a call to [`SearchEngine::simulate`] should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Run exactly this many simulations
    Iterations(u64),
    /// Keep starting simulations until this much wall-clock time has passed
    Time(Duration),
}

/// Statistics for one child of the root, as reported by [`SearchEngine::child_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStats {
    /// Debug label of the child's state
    pub label: String,
    /// Visit count of the child
    pub visits: u64,
    /// Accumulated score of the child
    pub score: f64,
    /// UCT value of the child as seen from the root
    pub uct: f64,
    /// Number of nodes in the child's subtree
    pub subtree_size: usize,
}

/// Upper Confidence bound applied to Trees.
///
/// Unvisited children score `+inf` so they are always tried first.
///
/// # Arguments
/// * `parent_visits` - Visit count of the parent node
/// * `score` - Accumulated score of the child
/// * `visits` - Visit count of the child
pub fn uct(parent_visits: u64, score: f64, visits: u64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    // A peer may have bumped the child but not yet the parent.
    let parent_visits = parent_visits.max(visits).max(1) as f64;
    let visits = visits as f64;
    score / visits + EXPLORATION * (parent_visits.ln() / visits).sqrt()
}

/// Concurrent Monte Carlo Tree Search over states of type `S`.
pub struct SearchEngine<S: SearchableState> {
    /// Current root. Replaced wholesale by `shift_root`
    root: Mutex<Arc<Node<S>>>,
    /// Engine-wide random source used to pick rollout children
    rng: Mutex<Xoshiro256PlusPlus>,
}

impl<S: SearchableState> SearchEngine<S> {
    /// Creates an engine rooted at `initial`, seeding the random source from the thread RNG.
    ///
    /// # Returns
    /// The engine, or [`SearchError::Configuration`] if `initial` is not
    /// terminal yet has no legal successors.
    pub fn new(initial: S) -> Result<Self, SearchError> {
        let rng = Xoshiro256PlusPlus::from_rng(&mut rand::rng());
        Self::with_rng(initial, rng)
    }

    /// Creates an engine whose rollout-child choices are reproducible for a given seed.
    pub fn with_seed(initial: S, seed: u64) -> Result<Self, SearchError> {
        Self::with_rng(initial, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng(initial: S, rng: Xoshiro256PlusPlus) -> Result<Self, SearchError> {
        if !initial.is_terminal() && initial.legal_successors().is_empty() {
            return Err(SearchError::Configuration(format!(
                "initial state {} is not terminal but has no legal successors",
                initial.label()
            )));
        }
        Ok(SearchEngine {
            root: Mutex::new(Node::new_root(initial)),
            rng: Mutex::new(rng),
        })
    }

    /// Current root node.
    pub fn root(&self) -> Arc<Node<S>> {
        self.root.lock().clone()
    }

    /// State held by the current root.
    pub fn root_state(&self) -> S {
        self.root.lock().state().clone()
    }

    /// Visit count of the current root.
    pub fn root_visits(&self) -> u64 {
        self.root().visits()
    }

    /// Number of nodes reachable from the current root. Walks the whole tree.
    pub fn tree_size(&self) -> usize {
        self.root().subtree_size()
    }

    /// Runs simulations until the budget is used up.
    ///
    /// A time budget is checked between simulations only; a simulation that
    /// has started always finishes.
    ///
    /// # Returns
    /// The number of simulations completed.
    pub fn simulate(&self, budget: Budget) -> Result<u64, SearchError> {
        let mut completed = 0;
        match budget {
            Budget::Iterations(count) => {
                while completed < count {
                    self.run_simulation()?;
                    completed += 1;
                }
            }
            Budget::Time(duration) => {
                // A deadline too far out to represent means "run until an error".
                let deadline = Instant::now().checked_add(duration);
                while deadline.map_or(true, |deadline| Instant::now() < deadline) {
                    self.run_simulation()?;
                    completed += 1;
                }
            }
        }
        Ok(completed)
    }

    /// Runs simulations for `duration` of wall-clock time.
    pub fn simulate_for(&self, duration: Duration) -> Result<u64, SearchError> {
        self.simulate(Budget::Time(duration))
    }

    /// Runs exactly `count` simulations.
    pub fn simulate_count(&self, count: u64) -> Result<u64, SearchError> {
        self.simulate(Budget::Iterations(count))
    }

    /// Runs `iterations` simulations spread across a dedicated thread pool.
    ///
    /// # Arguments
    /// * `iterations` - Total number of simulations to run
    /// * `threads` - Size of the thread pool. If 0, rayon picks the default
    pub fn simulate_parallel(&self, iterations: u64, threads: usize) -> Result<u64, SearchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("mcts-search-{}", index))
            .build()
            .map_err(|e| SearchError::Configuration(format!("failed to build thread pool: {}", e)))?;

        pool.install(|| {
            (0..iterations)
                .into_par_iter()
                .try_for_each(|_| self.run_simulation())
        })?;
        Ok(iterations)
    }

    /// Runs one selection / expansion / simulation / back-propagation cycle.
    pub fn run_simulation(&self) -> Result<(), SearchError> {
        let leaf = self.select();
        leaf.expand()?;
        let explored = {
            let mut rng = self.rng.lock();
            leaf.random_child(&mut *rng)
        }
        .unwrap_or(leaf);

        // Read once per simulation. A concurrent root shift may make this stale
        // for the rollout in flight; that rollout is then credited approximately.
        let reference_player = self.root.lock().state().current_player();
        let score = explored.state().rollout_score(reference_player);
        if !(0.0..=1.0).contains(&score) {
            return Err(SearchError::ContractViolation(format!(
                "rollout from {} scored {}, expected a value in [0, 1]",
                explored.state().label(),
                score
            )));
        }
        self.backpropagate(&explored, reference_player, score);
        Ok(())
    }

    /// Descends from the root to a node with no children, one lock at a time.
    fn select(&self) -> Arc<Node<S>> {
        let mut node = self.root();
        loop {
            let (children, parent_visits) = node.children_with_visits();
            match Self::best_child(&children, parent_visits) {
                Some(child) => node = child,
                None => return node,
            }
        }
    }

    /// Picks the child with the highest UCT value; the first one wins ties.
    fn best_child(children: &[Arc<Node<S>>], parent_visits: u64) -> Option<Arc<Node<S>>> {
        let mut best: Option<(&Arc<Node<S>>, f64)> = None;
        for child in children {
            let (visits, score) = child.counters();
            let value = uct(parent_visits, score, visits);
            let better = match best {
                Some((_, best_value)) => value > best_value,
                None => true,
            };
            if better {
                best = Some((child, value));
            }
        }
        best.map(|(child, _)| child.clone())
    }

    /// Credits a rollout to `node` and each of its ancestors.
    ///
    /// A node whose player to move differs from `reference_player` was chosen
    /// by the reference player, so it receives `score`; every other node
    /// receives `1 - score`.
    fn backpropagate(&self, node: &Arc<Node<S>>, reference_player: bool, score: f64) {
        let mut current = Some(node.clone());
        while let Some(node) = current {
            let reward = if node.state().current_player() != reference_player {
                score
            } else {
                1.0 - score
            };
            node.record(reward);
            current = node.parent();
        }
    }

    /// Returns the state of the root's most visited child.
    ///
    /// # Returns
    /// The chosen state, or [`SearchError::InvalidState`] if the root has not
    /// been expanded yet.
    pub fn get_next_state(&self) -> Result<S, SearchError> {
        let root = self.root();
        root.most_visited_child()
            .map(|child| child.state().clone())
            .ok_or_else(|| {
                SearchError::InvalidState(format!(
                    "root {} has no children to choose from",
                    root.state().label()
                ))
            })
    }

    /// Makes `state` the new root, keeping the statistics gathered for it.
    ///
    /// If the root already has a child for `state`, that child and its whole
    /// subtree become the new tree; otherwise a fresh node is created. All
    /// other subtrees are dropped. Call this only while background workers are
    /// paused.
    ///
    /// # Returns
    /// `Ok(())`, or [`SearchError::InvalidState`] if the root is terminal or
    /// `state` is not one of its legal successors.
    pub fn shift_root(&self, state: &S) -> Result<(), SearchError> {
        let mut root = self.root.lock();
        if root.state().is_terminal() {
            return Err(SearchError::InvalidState(format!(
                "cannot shift past terminal root {}",
                root.state().label()
            )));
        }
        if !root.state().legal_successors().iter().any(|s| s == state) {
            return Err(SearchError::InvalidState(format!(
                "{} is not reachable from root {}",
                state.label(),
                root.state().label()
            )));
        }

        let next = match root.find_child(state) {
            Some(child) => {
                child.detach();
                log::debug!(
                    "shifted root to {} reusing {} visits",
                    state.label(),
                    child.visits()
                );
                child
            }
            None => {
                log::debug!("shifted root to unexplored {}", state.label());
                Node::new_root(state.clone())
            }
        };
        *root = next;
        Ok(())
    }

    /// Per-child statistics of the current root, in child order.
    pub fn child_stats(&self) -> Vec<ChildStats> {
        let root = self.root();
        let (children, root_visits) = root.children_with_visits();
        children
            .iter()
            .map(|child| {
                let (visits, score) = child.counters();
                ChildStats {
                    label: child.state().label(),
                    visits,
                    score,
                    uct: uct(root_visits, score, visits),
                    subtree_size: child.subtree_size(),
                }
            })
            .collect()
    }

    /// Human-readable summary of the root's children, one line each.
    pub fn diagnostic_summary(&self) -> String {
        let mut summary = String::new();
        for stats in self.child_stats() {
            let _ = writeln!(
                summary,
                "{}: {:.1}/{} -- {} Nodes ** {:.4} UCT",
                stats.label, stats.score, stats.visits, stats.subtree_size, stats.uct
            );
        }
        summary
    }
}

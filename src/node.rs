//! # Search Tree Nodes
//!
//! A [`Node`] pairs an immutable game state with the mutable search statistics
//! gathered for it. Each node carries its own lock, and that lock guards only
//! that node's fields: its parent link, its child list and its counters.
//! Code in this crate never holds two node locks at once.
//!
//! Children are owned by their parent through `Arc`; the parent link is a
//! `Weak` handle used only to walk upwards during back-propagation, so a
//! discarded subtree is freed as soon as the last strong handle goes away.

use crate::{SearchError, SearchableState};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::{Arc, Weak};

/// Mutable part of a node, guarded by the node's own lock.
struct NodeStats<S: SearchableState> {
    /// Non-owning link to the parent; empty for the root
    parent: Weak<Node<S>>,
    /// Child nodes, one per legal successor. Empty until expanded, and empty forever for terminal states
    children: Vec<Arc<Node<S>>>,
    /// Number of rollouts that passed through this node
    visits: u64,
    /// Sum of rewards credited to this node, always within `0..=visits`
    score: f64,
}

/// A vertex of the search tree.
pub struct Node<S: SearchableState> {
    state: S,
    stats: Mutex<NodeStats<S>>,
}

impl<S: SearchableState> Node<S> {
    /// Creates an unexpanded node with no statistics.
    ///
    /// # Arguments
    /// * `state` - The game position this node represents
    /// * `parent` - Link to the parent node, or `Weak::new()` for a root
    pub(crate) fn new(state: S, parent: Weak<Node<S>>) -> Self {
        Node {
            state,
            stats: Mutex::new(NodeStats {
                parent,
                children: Vec::new(),
                visits: 0,
                score: 0.0,
            }),
        }
    }

    /// Creates a detached root node for `state`.
    pub(crate) fn new_root(state: S) -> Arc<Self> {
        Arc::new(Node::new(state, Weak::new()))
    }

    /// The game position stored in this node.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Number of rollouts that have been propagated through this node.
    pub fn visits(&self) -> u64 {
        self.stats.lock().visits
    }

    /// Accumulated reward for this node.
    pub fn score(&self) -> f64 {
        self.stats.lock().score
    }

    /// Reads `(visits, score)` together under a single acquisition of the lock.
    pub fn counters(&self) -> (u64, f64) {
        let stats = self.stats.lock();
        (stats.visits, stats.score)
    }

    /// Returns a snapshot of the child list.
    pub fn children(&self) -> Vec<Arc<Node<S>>> {
        self.stats.lock().children.clone()
    }

    /// Snapshot of the child list together with this node's visit count, read atomically.
    pub(crate) fn children_with_visits(&self) -> (Vec<Arc<Node<S>>>, u64) {
        let stats = self.stats.lock();
        (stats.children.clone(), stats.visits)
    }

    /// The parent node, if this node is not a root and the parent is still alive.
    pub fn parent(&self) -> Option<Arc<Node<S>>> {
        self.stats.lock().parent.upgrade()
    }

    /// Returns true once the child list has been installed.
    pub fn is_expanded(&self) -> bool {
        !self.stats.lock().children.is_empty()
    }

    /// Installs one child per legal successor, unless the node is terminal or
    /// already expanded.
    ///
    /// The whole list is built and assigned while holding this node's lock, so
    /// a concurrent selector sees either no children or all of them.
    ///
    /// # Returns
    /// `Ok(true)` if this call installed the children, `Ok(false)` if there was
    /// nothing to do, or [`SearchError::ContractViolation`] if a non-terminal
    /// state reported no successors.
    pub(crate) fn expand(self: &Arc<Self>) -> Result<bool, SearchError> {
        if self.state.is_terminal() {
            return Ok(false);
        }
        let mut stats = self.stats.lock();
        if !stats.children.is_empty() {
            return Ok(false);
        }
        let successors = self.state.legal_successors();
        if successors.is_empty() {
            return Err(SearchError::ContractViolation(format!(
                "non-terminal state {} has no legal successors",
                self.state.label()
            )));
        }
        log::trace!(
            "expanding {} into {} children",
            self.state.label(),
            successors.len()
        );
        let parent = Arc::downgrade(self);
        stats.children = successors
            .into_iter()
            .map(|state| Arc::new(Node::new(state, parent.clone())))
            .collect();
        Ok(true)
    }

    /// Adds one visit and `reward` to this node's counters.
    pub(crate) fn record(&self, reward: f64) {
        let mut stats = self.stats.lock();
        stats.visits += 1;
        stats.score += reward;
    }

    /// Clears the parent link, making this node a root.
    pub(crate) fn detach(&self) {
        self.stats.lock().parent = Weak::new();
    }

    /// Finds the child whose state equals `state`.
    pub(crate) fn find_child(&self, state: &S) -> Option<Arc<Node<S>>> {
        self.stats
            .lock()
            .children
            .iter()
            .find(|child| child.state == *state)
            .cloned()
    }

    /// Returns the child with the highest visit count.
    ///
    /// Ties are broken in favor of the child that comes first in the child
    /// list, so the result is deterministic for a given tree.
    pub fn most_visited_child(&self) -> Option<Arc<Node<S>>> {
        let mut best: Option<(Arc<Node<S>>, u64)> = None;
        for child in self.children() {
            let visits = child.visits();
            let better = match &best {
                Some((_, best_visits)) => visits > *best_visits,
                None => true,
            };
            if better {
                best = Some((child, visits));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Picks a child uniformly at random.
    pub fn random_child<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Node<S>>> {
        let stats = self.stats.lock();
        if stats.children.is_empty() {
            return None;
        }
        let index = rng.random_range(0..stats.children.len());
        Some(stats.children[index].clone())
    }

    /// Number of nodes in the subtree rooted here, this node included.
    ///
    /// Walks the whole subtree; meant for diagnostics only.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.subtree_size())
            .sum::<usize>()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    /// A counting game: players alternately add 1 or 2, and reaching `limit` ends the game.
    #[derive(Clone, Debug, PartialEq)]
    pub(crate) struct CountTo {
        pub total: u32,
        pub limit: u32,
        pub first_player: bool,
    }

    impl CountTo {
        pub(crate) fn new(limit: u32) -> Self {
            CountTo { total: 0, limit, first_player: true }
        }
    }

    impl SearchableState for CountTo {
        fn is_terminal(&self) -> bool {
            self.total >= self.limit
        }

        fn current_player(&self) -> bool {
            self.first_player
        }

        fn legal_successors(&self) -> Vec<Self> {
            if self.is_terminal() {
                return Vec::new();
            }
            (1..=2)
                .map(|step| CountTo {
                    total: (self.total + step).min(self.limit),
                    limit: self.limit,
                    first_player: !self.first_player,
                })
                .collect()
        }

        fn rollout_score(&self, perspective: bool) -> f64 {
            let mut rng = rand::rng();
            let mut state = self.clone();
            while !state.is_terminal() {
                state.total = (state.total + rng.random_range(1..=2)).min(state.limit);
                state.first_player = !state.first_player;
            }
            // Whoever reached the limit moved last, so the player to move has lost.
            if state.first_player == perspective {
                0.0
            } else {
                1.0
            }
        }

        fn label(&self) -> String {
            self.total.to_string()
        }
    }

    #[test]
    fn test_new_node_is_empty() {
        let root = Node::new_root(CountTo::new(5));
        assert_eq!(root.counters(), (0, 0.0));
        assert!(!root.is_expanded());
        assert!(root.parent().is_none());
        assert_eq!(root.subtree_size(), 1);
    }

    #[test]
    fn test_expand_installs_all_successors() {
        let root = Node::new_root(CountTo::new(5));
        assert!(root.expand().unwrap());
        assert!(!root.expand().unwrap());

        let children = root.children();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert!(Arc::ptr_eq(&child.parent().unwrap(), &root));
        }
        assert_eq!(root.subtree_size(), 3);
    }

    #[test]
    fn test_terminal_node_never_expands() {
        let mut state = CountTo::new(3);
        state.total = 3;
        let node = Node::new_root(state);
        assert!(!node.expand().unwrap());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_most_visited_child_prefers_first_on_tie() {
        let root = Node::new_root(CountTo::new(5));
        root.expand().unwrap();
        let children = root.children();

        assert!(Arc::ptr_eq(&root.most_visited_child().unwrap(), &children[0]));

        children[1].record(1.0);
        assert!(Arc::ptr_eq(&root.most_visited_child().unwrap(), &children[1]));

        children[0].record(0.0);
        assert!(Arc::ptr_eq(&root.most_visited_child().unwrap(), &children[0]));
    }

    #[test]
    fn test_random_child_covers_all_children() {
        let root = Node::new_root(CountTo::new(5));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        assert!(root.random_child(&mut rng).is_none());

        root.expand().unwrap();
        let children = root.children();
        let mut seen = [false; 2];
        for _ in 0..64 {
            let picked = root.random_child(&mut rng).unwrap();
            let index = children.iter().position(|c| Arc::ptr_eq(c, &picked)).unwrap();
            seen[index] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_detach_clears_parent() {
        let root = Node::new_root(CountTo::new(5));
        root.expand().unwrap();
        let child = root.children()[0].clone();
        child.detach();
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_find_child_matches_by_state() {
        let root = Node::new_root(CountTo::new(5));
        root.expand().unwrap();
        let mut target = CountTo::new(5);
        target.total = 2;
        target.first_player = false;
        let found = root.find_child(&target).unwrap();
        assert_eq!(found.state().total, 2);

        target.total = 4;
        assert!(root.find_child(&target).is_none());
    }
}

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use mcts::{Node, SearchableState};
use rand::Rng;
use std::sync::Arc;

/// A two-ply game: the first player picks one of two openings, the second
/// player answers with one of two replies, and the game ends. Opening 0 wins
/// for the first player whatever the reply; opening 1 loses.
#[derive(Clone, Debug, PartialEq)]
pub struct TwoPly {
    pub moves: Vec<u8>,
}

impl TwoPly {
    pub fn new() -> Self {
        TwoPly { moves: Vec::new() }
    }

    pub fn after(moves: &[u8]) -> Self {
        TwoPly { moves: moves.to_vec() }
    }

    fn first_player_wins(&self) -> bool {
        self.moves.first() == Some(&0)
    }
}

impl SearchableState for TwoPly {
    fn is_terminal(&self) -> bool {
        self.moves.len() == 2
    }

    fn current_player(&self) -> bool {
        self.moves.len() % 2 == 0
    }

    fn legal_successors(&self) -> Vec<Self> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..2)
            .map(|m| {
                let mut next = self.clone();
                next.moves.push(m);
                next
            })
            .collect()
    }

    fn rollout_score(&self, perspective: bool) -> f64 {
        let mut rng = rand::rng();
        let mut state = self.clone();
        while !state.is_terminal() {
            state.moves.push(rng.random_range(0..2));
        }
        if state.first_player_wins() == perspective {
            1.0
        } else {
            0.0
        }
    }

    fn label(&self) -> String {
        format!("{:?}", self.moves)
    }
}

/// Visit counts of every node in the tree, in depth-first order.
pub fn visit_snapshot<S: SearchableState>(node: &Arc<Node<S>>) -> Vec<u64> {
    let mut visits = vec![node.visits()];
    for child in node.children() {
        visits.extend(visit_snapshot(&child));
    }
    visits
}

/// Asserts `0 <= score <= visits` for every node in the tree.
pub fn assert_scores_bounded<S: SearchableState>(node: &Arc<Node<S>>) {
    let (visits, score) = node.counters();
    assert!(
        score >= 0.0 && score <= visits as f64 + 1e-9,
        "node {} has score {} over {} visits",
        node.state().label(),
        score,
        visits
    );
    for child in node.children() {
        assert_scores_bounded(&child);
    }
}

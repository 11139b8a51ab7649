//! No lost updates: every rollout reaches the root exactly once, whatever the
//! number of threads sharing the tree.

mod common;

use common::{assert_scores_bounded, TwoPly};
use mcts::games::tictactoe::TicTacToeState;
use mcts::{spawn_workers, stop_workers, PauseBarrier, SearchEngine};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_parallel_rollouts_are_all_counted() {
    for threads in [1, 4, 16] {
        let engine = SearchEngine::with_seed(TicTacToeState::new(), threads as u64).unwrap();
        let completed = engine.simulate_parallel(3000, threads).unwrap();
        assert_eq!(completed, 3000);
        assert_eq!(engine.root_visits(), 3000, "{} threads lost updates", threads);
        assert_scores_bounded(&engine.root());
    }
}

#[test]
fn test_worker_iterations_match_root_visits() {
    for workers in [1, 4, 16] {
        let engine = Arc::new(SearchEngine::with_seed(TicTacToeState::new(), 42).unwrap());
        let barrier = Arc::new(PauseBarrier::new(workers));
        let handles = spawn_workers(&engine, &barrier, workers).unwrap();

        thread::sleep(Duration::from_millis(50));
        let total = stop_workers(handles).unwrap();

        assert!(total > 0);
        assert_eq!(engine.root_visits(), total, "{} workers lost updates", workers);
        assert_scores_bounded(&engine.root());
        assert_eq!(barrier.workers(), 0);
    }
}

#[test]
fn test_children_visits_sum_to_root_visits() {
    let engine = SearchEngine::with_seed(TwoPly::new(), 9).unwrap();
    engine.simulate_parallel(1000, 8).unwrap();
    let root = engine.root();
    let child_visits: u64 = root.children().iter().map(|c| c.visits()).sum();
    assert_eq!(child_visits, root.visits());
}

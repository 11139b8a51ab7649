//! # Game Implementations Module
//!
//! Concrete games that implement [`SearchableState`](crate::SearchableState).
//! The engine itself knows nothing about them; they exist so the `play`
//! binary and the tests have a real position type to search.
//!
//! ## Adding New Games
//! To add a new game, create a new module and implement:
//! 1. A game state type with position-based equality
//! 2. The `SearchableState` trait, including a rollout policy
//! 3. Display and parsing implementations for moves

pub mod tictactoe;

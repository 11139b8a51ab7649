//! # Tic-Tac-Toe Game Implementation
//!
//! The classic 3x3 game, implemented as a [`SearchableState`] so the engine
//! has something real to search in the demo binary and the tests.
//!
//! ## Rules
//! - X (player 1) moves first, then players alternate
//! - Three of your marks in a row, column or diagonal wins
//! - A full board with no line is a draw

use crate::SearchableState;
use rand::seq::IndexedRandom;
use std::fmt;
use std::str::FromStr;

/// All eight winning lines as board indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Represents a move in Tic-Tac-Toe
///
/// Contains the 0-based cell index, row-major (0 is top left, 8 is bottom right).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeMove(pub usize);

/// Represents the complete state of a Tic-Tac-Toe game
///
/// The board uses 1 for X, -1 for O and 0 for empty cells.
#[derive(Debug, Clone)]
pub struct TicTacToeState {
    /// The game board, row-major
    board: [i32; 9],
    /// Current player (1 or -1)
    current_player: i32,
    /// Last move made, if any. Not part of the position
    last_move: Option<TicTacToeMove>,
}

impl PartialEq for TicTacToeState {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.current_player == other.current_player
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..3 {
            for c in 0..3 {
                let symbol = match self.board[r * 3 + c] {
                    1 => "X",
                    -1 => "O",
                    _ => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for TicTacToeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = (b'a' + (self.0 % 3) as u8) as char;
        write!(f, "{}{}", column, self.0 / 3 + 1)
    }
}

impl TicTacToeState {
    /// Creates an empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1,
            last_move: None,
        }
    }

    /// Contents of the board, row-major.
    pub fn board(&self) -> &[i32; 9] {
        &self.board
    }

    /// The player to move (1 for X, -1 for O).
    pub fn get_current_player(&self) -> i32 {
        self.current_player
    }

    /// The move that produced this position, if any.
    pub fn last_move(&self) -> Option<TicTacToeMove> {
        self.last_move
    }

    /// Returns a vector of all empty cells.
    pub fn get_possible_moves(&self) -> Vec<TicTacToeMove> {
        if self.get_winner().is_some() {
            return Vec::new();
        }
        (0..9)
            .filter(|&i| self.board[i] == 0)
            .map(TicTacToeMove)
            .collect()
    }

    /// Checks if a move is legal in the current game state
    ///
    /// # Arguments
    /// * `mv` - The move to check
    ///
    /// # Returns
    /// true if the cell exists, is empty, and the game is not over
    pub fn is_legal(&self, mv: &TicTacToeMove) -> bool {
        mv.0 < 9 && self.board[mv.0] == 0 && self.get_winner().is_none()
    }

    /// Places the current player's mark. Illegal moves are ignored.
    pub fn make_move(&mut self, mv: &TicTacToeMove) {
        if !self.is_legal(mv) {
            return;
        }
        self.board[mv.0] = self.current_player;
        self.last_move = Some(*mv);
        self.current_player = -self.current_player;
    }

    /// Returns the winner of the game, if any.
    pub fn get_winner(&self) -> Option<i32> {
        LINES.iter().find_map(|line| {
            let first = self.board[line[0]];
            if first != 0 && line.iter().all(|&i| self.board[i] == first) {
                Some(first)
            } else {
                None
            }
        })
    }

    fn player_id(side: bool) -> i32 {
        if side {
            1
        } else {
            -1
        }
    }
}

impl SearchableState for TicTacToeState {
    fn is_terminal(&self) -> bool {
        self.get_winner().is_some() || self.board.iter().all(|&cell| cell != 0)
    }

    fn current_player(&self) -> bool {
        self.current_player == 1
    }

    fn legal_successors(&self) -> Vec<Self> {
        self.get_possible_moves()
            .iter()
            .map(|mv| {
                let mut next = self.clone();
                next.make_move(mv);
                next
            })
            .collect()
    }

    fn rollout_score(&self, perspective: bool) -> f64 {
        let mut rng = rand::rng();
        let mut state = self.clone();
        loop {
            let moves = state.get_possible_moves();
            match moves.choose(&mut rng) {
                Some(mv) => state.make_move(mv),
                None => break,
            }
        }
        match state.get_winner() {
            Some(w) if w == Self::player_id(perspective) => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }

    fn label(&self) -> String {
        match self.last_move {
            Some(mv) => mv.to_string(),
            None => "start".to_string(),
        }
    }
}

impl FromStr for TicTacToeMove {
    type Err = String;

    /// Parses a move written as a column letter and row number, e.g. "b2".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let mut chars = s.chars();
        let (Some(col), Some(row), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("Invalid move '{}': expected e.g. 'b2'", s));
        };
        let col = match col {
            'a'..='c' => col as usize - 'a' as usize,
            _ => return Err(format!("Invalid column '{}'", col)),
        };
        let row = match row.to_digit(10) {
            Some(r @ 1..=3) => r as usize - 1,
            _ => return Err(format!("Invalid row '{}'", row)),
        };
        Ok(TicTacToeMove(row * 3 + col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[usize]) -> TicTacToeState {
        let mut game = TicTacToeState::new();
        for &m in moves {
            game.make_move(&TicTacToeMove(m));
        }
        game
    }

    #[test]
    fn test_new_game() {
        let game = TicTacToeState::new();
        assert_eq!(game.get_current_player(), 1);
        assert!(game.current_player());
        assert_eq!(game.legal_successors().len(), 9);
        assert!(!game.is_terminal());
        assert_eq!(game.label(), "start");
    }

    #[test]
    fn test_make_move_alternates_players() {
        let game = play(&[4]);
        assert_eq!(game.board()[4], 1);
        assert_eq!(game.get_current_player(), -1);
        assert_eq!(game.label(), "b2");
        assert_eq!(game.legal_successors().len(), 8);
    }

    #[test]
    fn test_win_condition_diagonal() {
        // X: 0, 4, 8   O: 1, 2
        let game = play(&[0, 1, 4, 2, 8]);
        assert_eq!(game.get_winner(), Some(1));
        assert!(game.is_terminal());
        assert!(game.legal_successors().is_empty());
        assert_eq!(game.rollout_score(true), 1.0);
        assert_eq!(game.rollout_score(false), 0.0);
    }

    #[test]
    fn test_draw() {
        // X O X / X O O / O X X
        let game = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(game.get_winner(), None);
        assert!(game.is_terminal());
        assert_eq!(game.rollout_score(true), 0.5);
    }

    #[test]
    fn test_equality_ignores_move_order() {
        let a = play(&[0, 4, 8]);
        let b = play(&[8, 4, 0]);
        assert_eq!(a, b);
        assert_ne!(a.label(), b.label());
    }

    #[test]
    fn test_rollout_score_in_range() {
        let game = play(&[4]);
        for _ in 0..50 {
            let score = game.rollout_score(true);
            assert!(score == 0.0 || score == 0.5 || score == 1.0);
        }
    }

    #[test]
    fn test_parse_move() {
        assert_eq!("a1".parse::<TicTacToeMove>().unwrap(), TicTacToeMove(0));
        assert_eq!(" C3 ".parse::<TicTacToeMove>().unwrap(), TicTacToeMove(8));
        assert!("d1".parse::<TicTacToeMove>().is_err());
        assert!("a4".parse::<TicTacToeMove>().is_err());
        assert!("a".parse::<TicTacToeMove>().is_err());
    }
}

//! Reversi game rules

pub mod board;
pub mod state;

pub use board::{Board, BoardCode, BoardSize, Cell, GameOutcome, Player, Position};
pub use state::{GameState, StateKey};

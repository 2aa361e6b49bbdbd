//! Backend that computes every transition on demand

use std::sync::OnceLock;

use super::{Backend, enumeration::StateGraph};
use crate::{
    Error, Result,
    game::{Board, BoardCode, BoardSize, GameOutcome, Player, Position},
};

/// Computes moves and transitions directly from the board engine.
///
/// The reachable state set is expensive, so it is computed on first request
/// and kept for the lifetime of the backend.
#[derive(Debug)]
pub struct LiveBackend {
    size: BoardSize,
    states: OnceLock<Vec<BoardCode>>,
}

impl LiveBackend {
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            states: OnceLock::new(),
        }
    }

    fn check_size(&self, board: &Board) -> Result<()> {
        if board.size() == self.size {
            Ok(())
        } else {
            Err(Error::BoardSizeMismatch {
                expected: self.size.to_string(),
                got: board.size().to_string(),
            })
        }
    }
}

impl Backend for LiveBackend {
    fn size(&self) -> BoardSize {
        self.size
    }

    fn moves(&self, board: &Board, turn: Player) -> Result<Vec<Position>> {
        self.check_size(board)?;
        Ok(board.legal_moves(turn))
    }

    fn apply(&self, board: &Board, turn: Player, position: Position) -> Result<(Board, Player)> {
        self.check_size(board)?;
        let next = board.apply_move(position, turn)?;
        let next_turn = if next.has_legal_move(turn.opponent()) {
            turn.opponent()
        } else {
            turn
        };
        Ok((next, next_turn))
    }

    fn winner(&self, board: &Board) -> Result<Option<GameOutcome>> {
        self.check_size(board)?;
        Ok(board.outcome())
    }

    fn reachable_states(&self) -> Result<&[BoardCode]> {
        if let Some(states) = self.states.get() {
            return Ok(states);
        }
        let states = StateGraph::explore(self.size)?.relative_states();
        tracing::info!(size = %self.size, states = states.len(), "enumerated reachable states");
        Ok(self.states.get_or_init(|| states))
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_switches_turn() {
        let size = BoardSize::square(4).unwrap();
        let backend = LiveBackend::new(size);
        let board = Board::initial(size);
        let moves = backend.moves(&board, Player::Black).unwrap();
        let (next, turn) = backend.apply(&board, Player::Black, moves[0]).unwrap();
        assert_eq!(turn, Player::White);
        assert_eq!(next.disc_count(Player::Black), 4);
    }

    #[test]
    fn test_apply_keeps_turn_on_pass() {
        let board = Board::from_rows(&["BW..", "....", "....", "..WB"]).unwrap();
        let backend = LiveBackend::new(board.size());
        let (_, turn) = backend
            .apply(&board, Player::Black, Position::new(0, 2))
            .unwrap();
        assert_eq!(turn, Player::Black);
    }

    #[test]
    fn test_reachable_states_are_memoised() {
        let backend = LiveBackend::new(BoardSize::square(4).unwrap());
        let first = backend.reachable_states().unwrap();
        let second = backend.reachable_states().unwrap();
        assert!(!first.is_empty());
        assert!(std::ptr::eq(first.as_ptr(), second.as_ptr()));
    }

    #[test]
    fn test_rejects_foreign_board_size() {
        let backend = LiveBackend::new(BoardSize::square(4).unwrap());
        let board = Board::initial(BoardSize::square(6).unwrap());
        assert!(matches!(
            backend.moves(&board, Player::Black),
            Err(Error::BoardSizeMismatch { .. })
        ));
    }
}

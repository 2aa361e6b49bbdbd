//! Game state: a board plus the side to move, with the pass rule applied

use std::{cell::OnceCell, fmt};

use serde::{Deserialize, Serialize};

use super::board::{Board, BoardCode, BoardSize, GameOutcome, Player, Position};
use crate::Result;

/// Canonical key of a game state.
///
/// Logically this is `(board_code << 1) | turn_bit`. It is stored as the pair
/// so that 64-cell boards (129-bit keys) are still representable;
/// [`StateKey::packed`] yields the single integer whenever it fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    board: BoardCode,
    turn_bit: u8,
}

impl StateKey {
    pub fn new(board: BoardCode, turn: Player) -> Self {
        Self {
            board,
            turn_bit: turn.turn_bit(),
        }
    }

    pub fn board(&self) -> BoardCode {
        self.board
    }

    pub fn turn(&self) -> Player {
        Player::from_turn_bit(self.turn_bit)
    }

    /// `(board_code << 1) | turn_bit`, or `None` if it would need 129 bits
    pub fn packed(&self) -> Option<u128> {
        let value = self.board.value();
        if value >> 127 != 0 {
            return None;
        }
        Some((value << 1) | self.turn_bit as u128)
    }

    pub fn from_packed(packed: u128) -> Self {
        Self {
            board: BoardCode::new(packed >> 1),
            turn_bit: (packed & 1) as u8,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.packed() {
            Some(packed) => write!(f, "{packed}"),
            None => write!(f, "{}:{}", self.board, self.turn_bit),
        }
    }
}

/// A board together with the side to move.
///
/// The side to move always has a legal move unless the game is finished: when
/// a move leaves the opponent without a reply the mover plays again. That pass
/// is recorded and exposed through [`GameState::passed`].
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    turn: Player,
    passed: bool,
    key_cache: OnceCell<StateKey>,
}

impl GameState {
    /// Starting position, Black to move
    pub fn initial(size: BoardSize) -> Self {
        Self::from_parts(Board::initial(size), Player::Black)
    }

    /// Build a state, handing the turn over if `turn` cannot move but the
    /// other side can.
    pub fn new(board: Board, turn: Player) -> Self {
        let turn = if !board.has_legal_move(turn) && board.has_legal_move(turn.opponent()) {
            turn.opponent()
        } else {
            turn
        };
        Self::from_parts(board, turn)
    }

    /// Build a state from parts already known to satisfy the pass rule
    pub(crate) fn from_parts(board: Board, turn: Player) -> Self {
        Self {
            board,
            turn,
            passed: false,
            key_cache: OnceCell::new(),
        }
    }

    /// Rebuild a state from its canonical key
    pub fn from_key(size: BoardSize, key: StateKey) -> Result<Self> {
        let board = Board::decode(key.board(), size)?;
        Ok(Self::from_parts(board, key.turn()))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn size(&self) -> BoardSize {
        self.board.size()
    }

    /// Whether the previous move left the opponent without a reply
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn legal_moves(&self) -> Vec<Position> {
        self.board.legal_moves(self.turn)
    }

    /// Play `position` for the side to move.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalMove`] if the position is not a legal
    /// move for the side to move.
    pub fn make_move(&mut self, position: Position) -> Result<()> {
        let next = self.board.apply_move(position, self.turn)?;
        let opponent = self.turn.opponent();
        if next.has_legal_move(opponent) {
            self.turn = opponent;
            self.passed = false;
        } else {
            // Opponent passes; if the mover cannot play either the game is over.
            self.passed = !next.is_full() && next.has_legal_move(self.turn);
        }
        self.board = next;
        self.key_cache.take();
        Ok(())
    }

    /// Non-mutating variant of [`GameState::make_move`]
    pub fn after_move(&self, position: Position) -> Result<GameState> {
        let mut next = self.clone();
        next.make_move(position)?;
        Ok(next)
    }

    pub fn is_finished(&self) -> bool {
        self.board.is_finished()
    }

    /// Outcome if the game is over
    pub fn winner(&self) -> Option<GameOutcome> {
        self.board.outcome()
    }

    /// Canonical key, cached until the next mutation
    pub fn key(&self) -> StateKey {
        *self
            .key_cache
            .get_or_init(|| StateKey::new(self.board.encode(), self.turn))
    }

    /// The board as seen by the side to move
    pub fn board_view(&self) -> Board {
        self.board.relative_view(self.turn)
    }

    /// The board as seen by the side not to move
    pub fn opposite_board_view(&self) -> Board {
        self.board.relative_view(self.turn.opponent())
    }
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.turn == other.turn && self.board == other.board
    }
}

impl Eq for GameState {}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} to move", self.board, self.turn)
    }
}

//! Markov decision process view of the game for a single learning side.
//!
//! A state is the board code seen by the side to move (ME, stored as White)
//! or a finished board. One action is ME's move composed with the opponent's
//! reply; the opponent is part of the stochastic dynamics and picks each of
//! its legal replies with equal probability.

use std::collections::BTreeMap;

use crate::{
    Error, Result,
    backend::Backend,
    game::{Board, BoardCode, BoardSize, GameOutcome, GameState, Player, Position},
};

/// MDP state: a mover-view board code
pub type State = BoardCode;

/// MDP action: row-major cell index `row * cols + col`
pub type Action = usize;

pub const WIN_REWARD: f64 = 1000.0;
pub const LOSS_REWARD: f64 = -1000.0;
pub const DRAW_REWARD: f64 = 0.0;

#[derive(Debug)]
pub struct Environment {
    backend: Box<dyn Backend>,
    size: BoardSize,
}

impl Environment {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let size = backend.size();
        Self { backend, size }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Every reachable state, sorted by code
    pub fn all_states(&self) -> Result<&[State]> {
        self.backend.reachable_states()
    }

    /// Legal actions for ME, in ascending order. Empty for finished boards.
    pub fn possible_actions(&self, state: State) -> Result<Vec<Action>> {
        let board = self.board(state)?;
        Ok(self
            .backend
            .moves(&board, Player::ME)?
            .into_iter()
            .map(|position| self.action_of(position))
            .collect())
    }

    /// Distribution over the states where ME moves next (or the game ends)
    /// after ME plays `action` in `state`.
    ///
    /// If the opponent cannot reply the distribution has a single entry. When
    /// an opponent reply leaves ME without a move, the opponent plays again
    /// and that branch is split evenly over its further replies. A reply that
    /// ends the game lands on the finished board. Identical outcomes are
    /// merged.
    pub fn next_states(&self, state: State, action: Action) -> Result<BTreeMap<State, f64>> {
        let board = self.board(state)?;
        let position = self.position_of(action)?;
        let (after, turn) = self.backend.apply(&board, Player::ME, position)?;

        let mut distribution = BTreeMap::new();
        self.spread(after, turn, 1.0, &mut distribution)?;
        Ok(distribution)
    }

    fn spread(
        &self,
        board: Board,
        turn: Player,
        probability: f64,
        distribution: &mut BTreeMap<State, f64>,
    ) -> Result<()> {
        // A finished board keeps the last mover's turn, so the opponent may
        // hold it with no reply left.
        let replies = if turn == Player::ME {
            Vec::new()
        } else {
            self.backend.moves(&board, Player::OPPONENT)?
        };
        if replies.is_empty() {
            *distribution.entry(board.encode()).or_insert(0.0) += probability;
            return Ok(());
        }

        let share = probability / replies.len() as f64;
        for reply in replies {
            let (next, next_turn) = self.backend.apply(&board, Player::OPPONENT, reply)?;
            self.spread(next, next_turn, share, distribution)?;
        }
        Ok(())
    }

    /// +1000 when `next_state` is won by ME, -1000 when lost, 0 otherwise
    pub fn reward(&self, _state: State, _action: Action, next_state: State) -> Result<f64> {
        Ok(match self.outcome(next_state)? {
            Some(GameOutcome::Win(Player::ME)) => WIN_REWARD,
            Some(GameOutcome::Win(_)) => LOSS_REWARD,
            Some(GameOutcome::Draw) | None => DRAW_REWARD,
        })
    }

    /// Outcome of `state` from ME's perspective, `None` while the game runs
    pub fn outcome(&self, state: State) -> Result<Option<GameOutcome>> {
        self.backend.winner(&self.board(state)?)
    }

    pub fn is_terminal(&self, state: State) -> Result<bool> {
        Ok(self.outcome(state)?.is_some())
    }

    /// MDP state of a live game, seen by the side to move
    pub fn state_of(game_state: &GameState) -> State {
        game_state.board_view().encode()
    }

    /// Game state with ME to move on `state`
    pub fn game_state(&self, state: State) -> Result<GameState> {
        Ok(GameState::new(self.board(state)?, Player::ME))
    }

    pub fn board(&self, state: State) -> Result<Board> {
        Board::decode(state, self.size)
    }

    pub fn action_of(&self, position: Position) -> Action {
        self.size.index(position)
    }

    pub fn position_of(&self, action: Action) -> Result<Position> {
        if action >= self.size.cells() {
            return Err(Error::InvalidAction {
                action,
                cells: self.size.cells(),
            });
        }
        Ok(self.size.position(action))
    }
}

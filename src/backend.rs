//! Game backends: the source of moves, transitions and outcomes used by the
//! MDP environment.
//!
//! [`LiveBackend`] runs the board engine on every query. [`PreparedBackend`]
//! answers from a transition table computed once and persisted to disk.

pub mod enumeration;
pub mod live;
pub mod prepared;

use std::path::PathBuf;

pub use enumeration::StateGraph;
pub use live::LiveBackend;
pub use prepared::{MoveResult, PreparedBackend, TerminalClassification, TransitionTable};

use crate::{
    Result,
    game::{Board, BoardCode, BoardSize, GameOutcome, Player, Position},
};

/// Query interface shared by every backend
pub trait Backend: Send + Sync + std::fmt::Debug {
    fn size(&self) -> BoardSize;

    /// Legal moves for `turn` on an absolute board
    fn moves(&self, board: &Board, turn: Player) -> Result<Vec<Position>>;

    /// Play `position` for `turn`, returning the next board and the side to
    /// move after the pass rule.
    fn apply(&self, board: &Board, turn: Player, position: Position) -> Result<(Board, Player)>;

    /// Absolute outcome if the board is finished
    fn winner(&self, board: &Board) -> Result<Option<GameOutcome>>;

    /// Every reachable mover-view board, sorted by code
    fn reachable_states(&self) -> Result<&[BoardCode]>;

    fn name(&self) -> &'static str;
}

/// How the environment obtains game dynamics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Live,
    /// Load the table at `path`, building and saving it first if missing
    Prepared { path: PathBuf },
}

pub fn create_backend(size: BoardSize, mode: &BackendMode) -> Result<Box<dyn Backend>> {
    Ok(match mode {
        BackendMode::Live => Box::new(LiveBackend::new(size)),
        BackendMode::Prepared { path } => Box::new(PreparedBackend::open(size, path)?),
    })
}

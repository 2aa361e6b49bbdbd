//! Backend served from a precomputed transition table

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{Backend, enumeration::StateGraph};
use crate::{
    Error, Result,
    game::{Board, BoardCode, BoardSize, GameOutcome, Player, Position},
};

/// Result of the mover playing one action in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Whether the opponent has a legal reply (and therefore moves next)
    pub opponent_replies: bool,
    /// Resulting board, still in the mover's view
    pub next: BoardCode,
}

/// Finished boards split by outcome, seen from ME (White in a relative view)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalClassification {
    pub wins: BTreeSet<BoardCode>,
    pub losses: BTreeSet<BoardCode>,
    pub draws: BTreeSet<BoardCode>,
}

impl TerminalClassification {
    fn insert(&mut self, code: BoardCode, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win(Player::ME) => self.wins.insert(code),
            GameOutcome::Win(_) => self.losses.insert(code),
            GameOutcome::Draw => self.draws.insert(code),
        };
    }

    /// Outcome of a finished board, `None` if the board is not terminal
    pub fn classify(&self, code: BoardCode) -> Option<GameOutcome> {
        if self.wins.contains(&code) {
            Some(GameOutcome::Win(Player::ME))
        } else if self.losses.contains(&code) {
            Some(GameOutcome::Win(Player::OPPONENT))
        } else if self.draws.contains(&code) {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.wins.len() + self.losses.len() + self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every reachable mover-view board with the result of each of its actions.
///
/// Finished boards are present in both views with no actions. Ordered maps
/// keep the serialized form identical between a rebuild and a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    version: u32,
    size: BoardSize,
    transitions: BTreeMap<BoardCode, BTreeMap<usize, MoveResult>>,
    terminals: TerminalClassification,
}

impl TransitionTable {
    pub const VERSION: u32 = 1;

    /// Enumerate the whole reachable state graph and tabulate it
    pub fn build(size: BoardSize) -> Result<Self> {
        let states = StateGraph::explore(size)?.relative_states();
        let mut transitions = BTreeMap::new();
        let mut terminals = TerminalClassification::default();

        for code in states {
            let board = Board::decode(code, size)?;
            let mut actions = BTreeMap::new();
            for position in board.legal_moves(Player::ME) {
                let next = board.apply_move(position, Player::ME)?;
                actions.insert(
                    size.index(position),
                    MoveResult {
                        opponent_replies: next.has_legal_move(Player::OPPONENT),
                        next: next.encode(),
                    },
                );
            }
            if let Some(outcome) = board.outcome() {
                terminals.insert(code, outcome);
            }
            transitions.insert(code, actions);
        }

        let table = Self {
            version: Self::VERSION,
            size,
            transitions,
            terminals,
        };
        table.verify_closed()?;
        tracing::info!(
            size = %size,
            states = table.len(),
            terminals = table.terminals.len(),
            "built transition table"
        );
        Ok(table)
    }

    /// Check that every transition lands on a state of the table, seen from
    /// the side that moves next.
    fn verify_closed(&self) -> Result<()> {
        for (code, actions) in &self.transitions {
            for (action, result) in actions {
                let landing = if result.opponent_replies {
                    Board::decode(result.next, self.size)?
                        .relative_view(Player::OPPONENT)
                        .encode()
                } else {
                    result.next
                };
                if !self.transitions.contains_key(&landing) {
                    return Err(Error::KeyLookup {
                        state: format!("{landing} (reached from {code} by action {action})"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Number of mover-view states
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn contains(&self, code: BoardCode) -> bool {
        self.transitions.contains_key(&code)
    }

    pub fn states(&self) -> impl Iterator<Item = BoardCode> + '_ {
        self.transitions.keys().copied()
    }

    /// Actions available to the mover on `code`
    pub fn actions(&self, code: BoardCode) -> Result<&BTreeMap<usize, MoveResult>> {
        self.transitions.get(&code).ok_or_else(|| Error::KeyLookup {
            state: code.to_string(),
        })
    }

    pub fn terminals(&self) -> &TerminalClassification {
        &self.terminals
    }

    /// Persist the table. The data goes to a sibling `.partial` file first and
    /// is renamed into place only once fully written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                operation: format!("create directory {parent:?}"),
                source,
            })?;
        }
        let partial = path.with_extension("partial");
        let file = File::create(&partial).map_err(|source| Error::Io {
            operation: format!("create file {partial:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        rmp_serde::encode::write(&mut writer, self).map_err(|e| Error::SerializationContext {
            operation: "serialize transition table to MessagePack".to_string(),
            message: e.to_string(),
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("write file {partial:?}"),
            source,
        })?;
        drop(writer);

        fs::rename(&partial, path).map_err(|source| Error::Io {
            operation: format!("move {partial:?} to {path:?}"),
            source,
        })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;
        let table: TransitionTable = rmp_serde::decode::from_read(BufReader::new(file))
            .map_err(|e| Error::SerializationContext {
                operation: "deserialize transition table from MessagePack".to_string(),
                message: e.to_string(),
            })?;

        if table.version != Self::VERSION {
            return Err(Error::SerializationContext {
                operation: "load transition table".to_string(),
                message: format!(
                    "unsupported format version {} (expected {})",
                    table.version,
                    Self::VERSION
                ),
            });
        }
        Ok(table)
    }
}

/// Backend answering every query from a [`TransitionTable`]
#[derive(Debug)]
pub struct PreparedBackend {
    table: TransitionTable,
    states: Vec<BoardCode>,
}

impl PreparedBackend {
    /// Load the table at `path`, or build it and persist it there.
    ///
    /// # Errors
    ///
    /// Fails if the persisted table was built for another board size, is
    /// unreadable, or cannot be written.
    pub fn open(size: BoardSize, path: &Path) -> Result<Self> {
        let table = if path.exists() {
            tracing::info!(path = %path.display(), "loading prepared transition table");
            let table = TransitionTable::load(path)?;
            if table.size() != size {
                return Err(Error::BoardSizeMismatch {
                    expected: size.to_string(),
                    got: table.size().to_string(),
                });
            }
            table
        } else {
            tracing::info!(size = %size, "preparing transition table");
            let table = TransitionTable::build(size)?;
            table.save(path)?;
            table
        };
        Ok(Self::from_table(table))
    }

    pub fn from_table(table: TransitionTable) -> Self {
        let states = table.states().collect();
        Self { table, states }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    fn mover_view(&self, board: &Board, turn: Player) -> Result<BoardCode> {
        if board.size() != self.table.size() {
            return Err(Error::BoardSizeMismatch {
                expected: self.table.size().to_string(),
                got: board.size().to_string(),
            });
        }
        Ok(board.relative_view(turn).encode())
    }
}

impl Backend for PreparedBackend {
    fn size(&self) -> BoardSize {
        self.table.size()
    }

    fn moves(&self, board: &Board, turn: Player) -> Result<Vec<Position>> {
        let size = self.table.size();
        let actions = self.table.actions(self.mover_view(board, turn)?)?;
        Ok(actions.keys().map(|&a| size.position(a)).collect())
    }

    fn apply(&self, board: &Board, turn: Player, position: Position) -> Result<(Board, Player)> {
        let size = self.table.size();
        let actions = self.table.actions(self.mover_view(board, turn)?)?;
        let result = actions
            .get(&size.index(position))
            .filter(|_| size.contains(position))
            .ok_or(Error::IllegalMove {
                row: position.row,
                col: position.col,
                reason: "not a legal move in the transition table",
            })?;

        let next = Board::decode(result.next, size)?.absolute_view(turn);
        let next_turn = if result.opponent_replies {
            turn.opponent()
        } else {
            turn
        };
        Ok((next, next_turn))
    }

    fn winner(&self, board: &Board) -> Result<Option<GameOutcome>> {
        let code = self.mover_view(board, Player::White)?;
        if let Some(outcome) = self.table.terminals().classify(code) {
            return Ok(Some(outcome));
        }
        let swapped = board.relative_view(Player::Black).encode();
        if self.table.contains(code) || self.table.contains(swapped) {
            Ok(None)
        } else {
            Err(Error::KeyLookup {
                state: code.to_string(),
            })
        }
    }

    fn reachable_states(&self) -> Result<&[BoardCode]> {
        Ok(&self.states)
    }

    fn name(&self) -> &'static str {
        "prepared"
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::backend::LiveBackend;

    fn size4() -> BoardSize {
        BoardSize::square(4).unwrap()
    }

    #[test]
    fn test_build_is_deterministic_and_byte_identical() {
        let first = TransitionTable::build(size4()).unwrap();
        let second = TransitionTable::build(size4()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            rmp_serde::to_vec(&first).unwrap(),
            rmp_serde::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_open_builds_then_reloads() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("4x4_transitions.msgpack");

        let built = PreparedBackend::open(size4(), &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("partial").exists());

        let loaded = PreparedBackend::open(size4(), &path).unwrap();
        assert_eq!(built.table(), loaded.table());
        assert_eq!(
            built.reachable_states().unwrap(),
            loaded.reachable_states().unwrap()
        );
    }

    #[test]
    fn test_open_rejects_table_for_other_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("table.msgpack");
        TransitionTable::build(size4()).unwrap().save(&path).unwrap();

        let result = PreparedBackend::open(BoardSize::new(4, 6).unwrap(), &path);
        assert!(matches!(result, Err(Error::BoardSizeMismatch { .. })));
    }

    #[test]
    fn test_states_match_live_enumeration() {
        let prepared = PreparedBackend::from_table(TransitionTable::build(size4()).unwrap());
        let live = LiveBackend::new(size4());
        assert_eq!(
            prepared.reachable_states().unwrap(),
            live.reachable_states().unwrap()
        );
    }

    #[test]
    fn test_unknown_state_is_key_lookup_error() {
        let backend = PreparedBackend::from_table(TransitionTable::build(size4()).unwrap());
        let empty = Board::empty(size4());
        assert!(matches!(
            backend.moves(&empty, Player::Black),
            Err(Error::KeyLookup { .. })
        ));
        assert!(matches!(
            backend.winner(&empty),
            Err(Error::KeyLookup { .. })
        ));
    }

    #[test]
    fn test_apply_rejects_move_outside_table() {
        let backend = PreparedBackend::from_table(TransitionTable::build(size4()).unwrap());
        let board = Board::initial(size4());
        let result = backend.apply(&board, Player::Black, Position::new(0, 0));
        assert!(matches!(result, Err(Error::IllegalMove { .. })));
    }

    #[test]
    fn test_terminal_classification_matches_disc_sign() {
        let table = TransitionTable::build(size4()).unwrap();
        assert!(!table.terminals().is_empty());
        for code in table.states() {
            let board = Board::decode(code, size4()).unwrap();
            let expected = board.outcome();
            assert_eq!(table.terminals().classify(code), expected);
            if expected.is_some() {
                assert!(table.actions(code).unwrap().is_empty());
            }
        }
    }
}

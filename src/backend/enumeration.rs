//! Exhaustive breadth-first enumeration of reachable game states

use std::collections::{BTreeSet, HashMap, hash_map::Entry};

use crate::{
    Result,
    game::{BoardCode, BoardSize, GameState, StateKey},
};

/// Every game state reachable from the initial position.
///
/// States live in an arena indexed by discovery order; the arena doubles as
/// the BFS queue, so each state is stored exactly once.
#[derive(Debug, Clone)]
pub struct StateGraph {
    size: BoardSize,
    nodes: Vec<GameState>,
    index: HashMap<StateKey, usize>,
}

impl StateGraph {
    /// Breadth-first traversal from the initial position, deduplicated by
    /// canonical key.
    pub fn explore(size: BoardSize) -> Result<Self> {
        let root = GameState::initial(size);
        let mut index = HashMap::from([(root.key(), 0)]);
        let mut nodes = vec![root];
        let mut cursor = 0;

        while cursor < nodes.len() {
            let children = {
                let state = &nodes[cursor];
                if state.is_finished() {
                    Vec::new()
                } else {
                    state
                        .legal_moves()
                        .into_iter()
                        .map(|position| state.after_move(position))
                        .collect::<Result<Vec<_>>>()?
                }
            };
            cursor += 1;

            for child in children {
                if let Entry::Vacant(slot) = index.entry(child.key()) {
                    slot.insert(nodes.len());
                    nodes.push(child);
                }
            }
        }

        tracing::debug!(size = %size, states = nodes.len(), "explored state graph");
        Ok(Self { size, nodes, index })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.index.contains_key(key)
    }

    /// Reachable states in discovery order
    pub fn states(&self) -> impl Iterator<Item = &GameState> {
        self.nodes.iter()
    }

    /// Mover-view codes: the board as seen by the side to move for every
    /// ongoing state, and both views of every finished board.
    pub fn relative_states(&self) -> Vec<BoardCode> {
        let mut codes = BTreeSet::new();
        for state in &self.nodes {
            codes.insert(state.board_view().encode());
            if state.is_finished() {
                codes.insert(state.opposite_board_view().encode());
            }
        }
        codes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Player};

    #[test]
    fn test_explore_contains_root_and_is_deduplicated() {
        let size = BoardSize::square(4).unwrap();
        let graph = StateGraph::explore(size).unwrap();
        assert!(graph.contains(&GameState::initial(size).key()));

        let keys: BTreeSet<_> = graph.states().map(GameState::key).collect();
        assert_eq!(keys.len(), graph.len());
    }

    #[test]
    fn test_every_child_is_in_graph() {
        let size = BoardSize::square(4).unwrap();
        let graph = StateGraph::explore(size).unwrap();
        for state in graph.states() {
            for position in state.legal_moves() {
                let child = state.after_move(position).unwrap();
                assert!(graph.contains(&child.key()));
            }
        }
    }

    #[test]
    fn test_relative_states_are_mover_views() {
        let size = BoardSize::square(4).unwrap();
        let graph = StateGraph::explore(size).unwrap();
        let codes = graph.relative_states();
        let initial_view = Board::initial(size).relative_view(Player::Black).encode();
        assert!(codes.binary_search(&initial_view).is_ok());

        for code in codes {
            let board = Board::decode(code, size).unwrap();
            assert!(board.is_finished() || board.has_legal_move(Player::ME));
        }
    }

    #[test]
    fn test_smallest_board_is_immediately_finished() {
        let size = BoardSize::square(2).unwrap();
        let graph = StateGraph::explore(size).unwrap();
        assert_eq!(graph.len(), 1);
        // Both views of the finished initial board.
        assert_eq!(graph.relative_states().len(), 2);
    }
}

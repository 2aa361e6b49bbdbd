//! Monte Carlo tree search with UCB1 selection and persistent node statistics

use std::{any::Any, collections::HashMap};

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::build_rng;
use crate::{
    Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    game::{GameOutcome, GameState, Player, Position, StateKey},
    ports::{Agent, KnowledgeBlob, agent::no_legal_actions},
};

/// Accumulated rollout results for one game state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub total: f64,
    pub visits: u64,
}

impl NodeStats {
    /// Mean reward, 0 for an unvisited node
    pub fn average(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total / self.visits as f64
        }
    }
}

/// MCTS agent.
///
/// Statistics are keyed by game state and survive between decisions and
/// games, so the tree keeps growing for as long as the agent learns. Every
/// node is valued from ME's point of view.
#[derive(Debug, Clone)]
pub struct MctsAgent {
    exploration: f64,
    simulations: usize,
    nodes: HashMap<StateKey, NodeStats>,
    learning: bool,
    rng: StdRng,
}

impl MctsAgent {
    pub const NAME: &'static str = "mcts";

    pub fn new(exploration: f64, simulations: usize) -> Self {
        Self {
            exploration,
            simulations,
            nodes: HashMap::new(),
            learning: true,
            rng: build_rng(None),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let mut agent = Self::new(config.exploration, config.simulations_per_move);
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
        }
        agent
    }

    pub fn stats(&self, key: StateKey) -> NodeStats {
        self.nodes.get(&key).copied().unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn exploration(&self) -> f64 {
        if self.learning { self.exploration } else { 0.0 }
    }

    fn is_known(&self, key: StateKey) -> bool {
        self.stats(key).visits > 0
    }

    /// UCB1 of `child` under `parent`; 0 while either is unvisited
    fn ucb(&self, parent: StateKey, child: StateKey) -> f64 {
        let parent_n = self.stats(parent).visits;
        let child = self.stats(child);
        if parent_n == 0 || child.visits == 0 {
            return 0.0;
        }
        let bonus = ((parent_n as f64).ln() / child.visits as f64).sqrt();
        child.average() + self.exploration() * bonus
    }

    fn record(&mut self, key: StateKey, reward: f64) {
        let node = self.nodes.entry(key).or_default();
        node.total += reward;
        node.visits += 1;
    }

    /// Pick a move in `state`, `None` if the game is over
    fn choose_move(&mut self, state: &GameState) -> Result<Option<Position>> {
        let moves = state.legal_moves();
        let mut children = Vec::with_capacity(moves.len());
        for &position in &moves {
            children.push((position, state.after_move(position)?.key()));
        }

        if self.learning {
            let unexplored: Vec<Position> = children
                .iter()
                .filter(|(_, key)| !self.is_known(*key))
                .map(|(position, _)| *position)
                .collect();
            if let Some(&position) = unexplored.choose(&mut self.rng) {
                return Ok(Some(position));
            }
        }

        let parent = state.key();
        let scored: Vec<(Position, f64)> = children
            .iter()
            .map(|&(position, key)| (position, self.ucb(parent, key)))
            .collect();
        let best = scored
            .iter()
            .map(|&(_, score)| score)
            .fold(f64::NEG_INFINITY, f64::max);
        let best_moves: Vec<Position> = scored
            .into_iter()
            .filter(|&(_, score)| score == best)
            .map(|(position, _)| position)
            .collect();
        Ok(best_moves.choose(&mut self.rng).copied())
    }

    /// Play uniformly random moves to the end; +1 ME win, -1 loss, 0 draw
    fn rollout(&mut self, mut state: GameState) -> Result<f64> {
        while !state.is_finished() {
            let moves = state.legal_moves();
            let Some(&position) = moves.choose(&mut self.rng) else {
                break;
            };
            state.make_move(position)?;
        }
        Ok(match state.winner() {
            Some(GameOutcome::Win(Player::ME)) => 1.0,
            Some(GameOutcome::Win(_)) => -1.0,
            Some(GameOutcome::Draw) | None => 0.0,
        })
    }

    /// One selection, expansion, rollout and backpropagation pass
    fn simulate(&mut self, root: &GameState) -> Result<()> {
        if !self.is_known(root.key()) {
            let reward = self.rollout(root.clone())?;
            self.record(root.key(), reward);
            return Ok(());
        }

        let mut state = root.clone();
        let mut path = vec![state.key()];
        while self.is_known(state.key()) && !state.is_finished() {
            let Some(position) = self.choose_move(&state)? else {
                break;
            };
            state.make_move(position)?;
            path.push(state.key());
        }

        let reward = self.rollout(state)?;
        for key in path {
            self.record(key, reward);
        }
        Ok(())
    }
}

impl Agent for MctsAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        let root = env.game_state(state)?;
        if root.is_finished() {
            return Err(no_legal_actions(state));
        }
        if self.learning {
            for _ in 0..self.simulations {
                self.simulate(&root)?;
            }
        }
        self.choose_move(&root)?
            .map(|position| env.action_of(position))
            .ok_or_else(|| no_legal_actions(state))
    }

    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        tracing::info!(nodes = self.nodes.len(), "saving MCTS tree");
        KnowledgeBlob::encode(&self.nodes).map(Some)
    }

    fn set_saved_data(&mut self, blob: &KnowledgeBlob) -> Result<()> {
        self.nodes = blob.decode()?;
        tracing::info!(nodes = self.nodes.len(), "loaded MCTS tree");
        Ok(())
    }

    fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }

    fn is_learning(&self) -> bool {
        self.learning
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

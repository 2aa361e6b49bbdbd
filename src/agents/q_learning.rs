//! Off-policy TD control: Q-learning and double Q-learning

use std::any::Any;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{QTable, TdParams, best_action, build_rng, epsilon_greedy};
use crate::{
    Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    ports::{Agent, KnowledgeBlob, Transition, agent::no_legal_actions},
};

/// Q-learning agent
///
/// Updates toward `r + γ max_a' Q(s', a')` regardless of the action taken
/// next.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    params: TdParams,
    q_table: QTable,
    rng: StdRng,
}

impl QLearningAgent {
    pub const NAME: &'static str = "q_learning";

    pub fn new(params: TdParams) -> Self {
        Self {
            params,
            q_table: QTable::new(),
            rng: build_rng(None),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let mut agent = Self::new(TdParams::from_config(config));
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
        }
        agent
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }
}

impl Agent for QLearningAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        let actions = env.possible_actions(state)?;
        let q_table = &self.q_table;
        epsilon_greedy(&mut self.rng, self.params.epsilon(), &actions, |a| {
            q_table.get(state, a)
        })
        .ok_or_else(|| no_legal_actions(state))
    }

    fn update(&mut self, env: &Environment, t: &Transition) -> Result<()> {
        let next_actions = env.possible_actions(t.next_state)?;
        let target = t.reward
            + self.params.discount() * self.q_table.max_value(t.next_state, &next_actions);
        let current = self.q_table.get(t.state, t.action);
        self.q_table.set(
            t.state,
            t.action,
            current + self.params.alpha() * (target - current),
        );
        Ok(())
    }

    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        KnowledgeBlob::encode(&self.q_table).map(Some)
    }

    fn set_saved_data(&mut self, blob: &KnowledgeBlob) -> Result<()> {
        self.q_table = blob.decode()?;
        Ok(())
    }

    fn set_learning(&mut self, learning: bool) {
        self.params.set_learning(learning);
    }

    fn is_learning(&self) -> bool {
        self.params.is_learning()
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Double Q-learning agent
///
/// Each update picks one of two tables at random, chooses the greedy next
/// action in that table and evaluates it with the other one. Acting uses the
/// sum of both tables.
#[derive(Debug, Clone)]
pub struct DoubleQLearningAgent {
    params: TdParams,
    tables: [QTable; 2],
    rng: StdRng,
}

impl DoubleQLearningAgent {
    pub const NAME: &'static str = "dq_learning";

    pub fn new(params: TdParams) -> Self {
        Self {
            params,
            tables: [QTable::new(), QTable::new()],
            rng: build_rng(None),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let mut agent = Self::new(TdParams::from_config(config));
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
        }
        agent
    }

    pub fn tables(&self) -> &[QTable; 2] {
        &self.tables
    }

    /// Value used for acting: `Q_A(s, a) + Q_B(s, a)`
    pub fn combined_value(&self, state: State, action: Action) -> f64 {
        self.tables[0].get(state, action) + self.tables[1].get(state, action)
    }
}

impl Agent for DoubleQLearningAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        let actions = env.possible_actions(state)?;
        let [a, b] = &self.tables;
        epsilon_greedy(&mut self.rng, self.params.epsilon(), &actions, |action| {
            a.get(state, action) + b.get(state, action)
        })
        .ok_or_else(|| no_legal_actions(state))
    }

    fn update(&mut self, env: &Environment, t: &Transition) -> Result<()> {
        let updated = usize::from(self.rng.random_bool(0.5));
        let other = 1 - updated;
        let next_actions = env.possible_actions(t.next_state)?;

        let chooser = &self.tables[updated];
        let next_value = best_action(&mut self.rng, &next_actions, |a| {
            chooser.get(t.next_state, a)
        })
        .map_or(0.0, |a| self.tables[other].get(t.next_state, a));

        let table = &mut self.tables[updated];
        let current = table.get(t.state, t.action);
        let target = t.reward + self.params.discount() * next_value;
        table.set(
            t.state,
            t.action,
            current + self.params.alpha() * (target - current),
        );
        Ok(())
    }

    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        KnowledgeBlob::encode(&self.tables).map(Some)
    }

    fn set_saved_data(&mut self, blob: &KnowledgeBlob) -> Result<()> {
        self.tables = blob.decode()?;
        Ok(())
    }

    fn set_learning(&mut self, learning: bool) {
        self.params.set_learning(learning);
    }

    fn is_learning(&self) -> bool {
        self.params.is_learning()
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

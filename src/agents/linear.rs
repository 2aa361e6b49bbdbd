//! Linear action-value approximation over board features

use std::{any::Any, collections::BTreeMap};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{
    TdParams, build_rng, epsilon_greedy,
    features::{feature_count, features},
};
use crate::{
    Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    game::Player,
    ports::{Agent, KnowledgeBlob, Transition, agent::no_legal_actions},
};

/// Q-learning with `Q(s, a) = w · φ(board after a)`.
///
/// Weights are drawn uniformly from `[0, 1)` at the first update; until then
/// every action is valued 0.
#[derive(Debug, Clone)]
pub struct LinearValueAgent {
    params: TdParams,
    weights: Option<Vec<f64>>,
    rng: StdRng,
}

impl LinearValueAgent {
    pub const NAME: &'static str = "value_approx";

    pub fn new(params: TdParams) -> Self {
        Self {
            params,
            weights: None,
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

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Features of the board reached by playing `action` in `state`
    pub fn features_of(
        &self,
        env: &Environment,
        state: State,
        action: Action,
    ) -> Result<Vec<f64>> {
        let board = env.board(state)?;
        let position = env.position_of(action)?;
        let (after, _) = env.backend().apply(&board, Player::ME, position)?;
        Ok(features(&after))
    }

    pub fn q_value(&self, env: &Environment, state: State, action: Action) -> Result<f64> {
        let Some(weights) = &self.weights else {
            return Ok(0.0);
        };
        let phi = self.features_of(env, state, action)?;
        Ok(dot(weights, &phi))
    }

    fn action_values(&self, env: &Environment, state: State) -> Result<BTreeMap<Action, f64>> {
        env.possible_actions(state)?
            .into_iter()
            .map(|a| Ok((a, self.q_value(env, state, a)?)))
            .collect()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Agent for LinearValueAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        let values = self.action_values(env, state)?;
        let actions: Vec<Action> = values.keys().copied().collect();
        epsilon_greedy(&mut self.rng, self.params.epsilon(), &actions, |a| {
            values.get(&a).copied().unwrap_or(0.0)
        })
        .ok_or_else(|| no_legal_actions(state))
    }

    fn update(&mut self, env: &Environment, t: &Transition) -> Result<()> {
        if !self.params.is_learning() {
            return Ok(());
        }
        let phi = self.features_of(env, t.state, t.action)?;
        let next_value = self
            .action_values(env, t.next_state)?
            .into_values()
            .reduce(f64::max)
            .unwrap_or(0.0);

        let count = feature_count(env.size());
        let rng = &mut self.rng;
        let weights = self
            .weights
            .get_or_insert_with(|| (0..count).map(|_| rng.random::<f64>()).collect());
        let delta = t.reward + self.params.discount() * next_value - dot(weights, &phi);
        let step = self.params.alpha() * delta;
        for (w, x) in weights.iter_mut().zip(&phi) {
            *w += step * x;
        }
        Ok(())
    }

    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        self.weights.as_ref().map(KnowledgeBlob::encode).transpose()
    }

    fn set_saved_data(&mut self, blob: &KnowledgeBlob) -> Result<()> {
        self.weights = Some(blob.decode()?);
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

//! Playing and learning agents
//!
//! Every agent talks to the game only through [`crate::environment::Environment`]
//! and implements [`crate::ports::Agent`].

pub mod features;
pub mod linear;
pub mod mcts;
pub mod q_learning;
pub mod q_table;
pub mod random;
pub mod sarsa;
pub mod sarsa_lambda;
pub mod value_iteration;

pub use linear::LinearValueAgent;
pub use mcts::{MctsAgent, NodeStats};
pub use q_learning::{DoubleQLearningAgent, QLearningAgent};
pub use q_table::QTable;
pub use random::RandomAgent;
pub use sarsa::{SarsaAgent, SarsaTarget};
pub use sarsa_lambda::SarsaLambdaAgent;
pub use value_iteration::{ValueIterationAgent, ValueIterationReport};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{app::AgentConfig, environment::Action};

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Temporal-difference hyperparameters.
///
/// While learning is disabled the step size and the exploration rate read as
/// zero, which freezes the estimates and makes selection greedy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdParams {
    alpha: f64,
    epsilon: f64,
    discount: f64,
    learning: bool,
}

impl TdParams {
    pub fn new(alpha: f64, epsilon: f64, discount: f64) -> Self {
        Self {
            alpha,
            epsilon,
            discount,
            learning: true,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.alpha, config.epsilon, config.discount)
    }

    pub fn alpha(&self) -> f64 {
        if self.learning { self.alpha } else { 0.0 }
    }

    pub fn epsilon(&self) -> f64 {
        if self.learning { self.epsilon } else { 0.0 }
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }
}

/// Uniformly random pick among the actions of maximal value
pub(crate) fn best_action<R: Rng>(
    rng: &mut R,
    actions: &[Action],
    value: impl Fn(Action) -> f64,
) -> Option<Action> {
    let mut best = Vec::new();
    let mut best_value = f64::NEG_INFINITY;
    for &action in actions {
        let v = value(action);
        if v > best_value || best.is_empty() {
            best_value = v;
            best.clear();
            best.push(action);
        } else if v == best_value {
            best.push(action);
        }
    }
    best.choose(rng).copied()
}

/// ε-greedy selection with random tie-breaking, `None` if `actions` is empty
pub(crate) fn epsilon_greedy<R: Rng>(
    rng: &mut R,
    epsilon: f64,
    actions: &[Action],
    value: impl Fn(Action) -> f64,
) -> Option<Action> {
    if epsilon > 0.0 && rng.random::<f64>() < epsilon {
        actions.choose(rng).copied()
    } else {
        best_action(rng, actions, value)
    }
}

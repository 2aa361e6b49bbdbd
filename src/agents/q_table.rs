//! Q-table shared by the tabular temporal-difference agents

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::best_action;
use crate::environment::{Action, State};

/// Q-values keyed by `(state, action)`; unseen pairs read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: HashMap<(State, Action), f64>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: State, action: Action) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: State, action: Action, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Move `Q(s, a)` by `delta`
    pub fn add(&mut self, state: State, action: Action, delta: f64) {
        *self.values.entry((state, action)).or_insert(0.0) += delta;
    }

    /// `max_a Q(s, a)` over `actions`, 0 when there are none
    pub fn max_value(&self, state: State, actions: &[Action]) -> f64 {
        actions
            .iter()
            .map(|&action| self.get(state, action))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Greedy action with ties broken uniformly at random
    pub fn greedy_action<R: Rng>(
        &self,
        rng: &mut R,
        state: State,
        actions: &[Action],
    ) -> Option<Action> {
        best_action(rng, actions, |action| self.get(state, action))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

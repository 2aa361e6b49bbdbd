//! Offline planning by synchronous value iteration

use std::{any::Any, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    ports::{Agent, KnowledgeBlob},
};

/// Summary of one planning run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueIterationReport {
    pub states: usize,
    pub sweeps: usize,
    /// Largest value change in the final sweep
    pub final_delta: f64,
    pub converged: bool,
}

/// One outcome of an action: next-state index, probability, reward
type Outcome = (usize, f64, f64);

/// Solves the whole MDP once and then plays the greedy policy.
///
/// Every state's value is updated from the previous sweep's values until the
/// largest change falls below θ. The policy picks, per state, the first
/// action of maximal expected return.
#[derive(Debug, Clone)]
pub struct ValueIterationAgent {
    discount: f64,
    theta: f64,
    max_sweeps: usize,
    policy: Option<BTreeMap<State, Action>>,
    report: Option<ValueIterationReport>,
}

impl ValueIterationAgent {
    pub const NAME: &'static str = "value_iter";

    pub fn new(discount: f64, theta: f64, max_sweeps: usize) -> Self {
        Self {
            discount,
            theta,
            max_sweeps,
            policy: None,
            report: None,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.vi_discount, config.vi_theta, config.vi_max_sweeps)
    }

    /// Report of the last planning run, `None` if the policy was loaded
    pub fn report(&self) -> Option<&ValueIterationReport> {
        self.report.as_ref()
    }

    pub fn policy(&self) -> Option<&BTreeMap<State, Action>> {
        self.policy.as_ref()
    }

    /// Compute the optimal policy for `env`, replacing any existing one
    pub fn plan(&mut self, env: &Environment) -> Result<ValueIterationReport> {
        let states = env.all_states()?;
        let index: BTreeMap<State, usize> =
            states.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        // Tabulate the model once; every sweep reads the same transitions.
        let mut model: Vec<Vec<(Action, Vec<Outcome>)>> = Vec::with_capacity(states.len());
        for &state in states {
            let mut actions = Vec::new();
            for action in env.possible_actions(state)? {
                let mut outcomes = Vec::new();
                for (next, probability) in env.next_states(state, action)? {
                    let next_index = *index.get(&next).ok_or_else(|| Error::KeyLookup {
                        state: next.to_string(),
                    })?;
                    let reward = env.reward(state, action, next)?;
                    outcomes.push((next_index, probability, reward));
                }
                actions.push((action, outcomes));
            }
            model.push(actions);
        }

        let discount = self.discount;
        let expected = |outcomes: &[Outcome], values: &[f64]| -> f64 {
            outcomes
                .iter()
                .map(|&(next, p, r)| p * (r + discount * values[next]))
                .sum()
        };

        let mut values = vec![0.0; states.len()];
        let mut report = ValueIterationReport {
            states: states.len(),
            sweeps: 0,
            final_delta: f64::INFINITY,
            converged: false,
        };
        while report.sweeps < self.max_sweeps {
            let previous = values.clone();
            let mut delta: f64 = 0.0;
            for (i, actions) in model.iter().enumerate() {
                let Some(best) = actions
                    .iter()
                    .map(|(_, outcomes)| expected(outcomes, &previous))
                    .reduce(f64::max)
                else {
                    continue;
                };
                delta = delta.max((best - previous[i]).abs());
                values[i] = best;
            }
            report.sweeps += 1;
            report.final_delta = delta;
            tracing::debug!(sweep = report.sweeps, delta, "value iteration sweep");
            if delta < self.theta {
                report.converged = true;
                break;
            }
        }
        if !report.converged {
            tracing::warn!(
                sweeps = report.sweeps,
                delta = report.final_delta,
                "value iteration stopped before converging"
            );
        }

        let mut policy = BTreeMap::new();
        for (&state, actions) in states.iter().zip(&model) {
            let mut best: Option<(Action, f64)> = None;
            for (action, outcomes) in actions {
                let value = expected(outcomes, &values);
                if best.is_none_or(|(_, v)| value > v) {
                    best = Some((*action, value));
                }
            }
            if let Some((action, _)) = best {
                policy.insert(state, action);
            }
        }

        tracing::info!(
            states = report.states,
            sweeps = report.sweeps,
            policy = policy.len(),
            "value iteration finished"
        );
        self.policy = Some(policy);
        self.report = Some(report);
        Ok(report)
    }
}

impl Agent for ValueIterationAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Plan only if no policy was loaded
    fn initialize(&mut self, env: &Environment) -> Result<()> {
        if self.policy.is_none() {
            self.plan(env)?;
        }
        Ok(())
    }

    fn select_action(&mut self, _env: &Environment, state: State) -> Result<Action> {
        let policy = self.policy.as_ref().ok_or_else(|| Error::UninitializedPolicy {
            agent: Self::NAME.to_string(),
        })?;
        policy.get(&state).copied().ok_or_else(|| Error::KeyLookup {
            state: state.to_string(),
        })
    }

    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        self.policy.as_ref().map(KnowledgeBlob::encode).transpose()
    }

    fn set_saved_data(&mut self, blob: &KnowledgeBlob) -> Result<()> {
        self.policy = Some(blob.decode()?);
        self.report = None;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::LiveBackend,
        game::{BoardSize, GameState},
    };

    fn env() -> Environment {
        Environment::new(Box::new(LiveBackend::new(BoardSize::square(4).unwrap())))
    }

    #[test]
    fn test_acting_before_planning_fails() {
        let env = env();
        let mut agent = ValueIterationAgent::from_config(&AgentConfig::default());
        let state = Environment::state_of(&GameState::initial(env.size()));
        assert!(matches!(
            agent.select_action(&env, state),
            Err(Error::UninitializedPolicy { .. })
        ));
        assert_eq!(agent.data_to_save().unwrap(), None);
    }

    #[test]
    fn test_plan_covers_every_non_terminal_state() {
        let env = env();
        let mut agent = ValueIterationAgent::from_config(&AgentConfig::default());
        agent.initialize(&env).unwrap();

        let report = *agent.report().unwrap();
        assert!(report.converged);
        assert!(report.final_delta < 1e-4);

        let policy = agent.policy().unwrap();
        for &state in env.all_states().unwrap() {
            let actions = env.possible_actions(state).unwrap();
            match policy.get(&state) {
                Some(action) => assert!(actions.contains(action)),
                None => assert!(actions.is_empty()),
            }
        }
    }

    #[test]
    fn test_loaded_policy_skips_planning() {
        let env = env();
        let mut planned = ValueIterationAgent::from_config(&AgentConfig::default());
        planned.initialize(&env).unwrap();
        let blob = planned.data_to_save().unwrap().unwrap();

        let mut loaded = ValueIterationAgent::from_config(&AgentConfig::default());
        loaded.set_saved_data(&blob).unwrap();
        loaded.initialize(&env).unwrap();
        assert!(loaded.report().is_none());
        assert_eq!(loaded.policy(), planned.policy());
    }

    #[test]
    fn test_sweep_limit_is_reported() {
        let env = env();
        let mut agent = ValueIterationAgent::new(0.95, 1e-4, 1);
        let report = agent.plan(&env).unwrap();
        assert_eq!(report.sweeps, 1);
        assert!(!report.converged);
        assert!(agent.policy().is_some());
    }
}

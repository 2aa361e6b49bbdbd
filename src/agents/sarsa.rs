//! On-policy TD control: SARSA and expected SARSA

use std::any::Any;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{QTable, TdParams, build_rng, epsilon_greedy};
use crate::{
    Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    ports::{Agent, KnowledgeBlob, Transition, agent::no_legal_actions},
};

/// How the bootstrap value of the next state is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SarsaTarget {
    /// `Q(s', a')` for the action `a'` actually sampled by the policy. That
    /// action is kept and played when `s'` comes up.
    Sampled,
    /// `Σ π(a'|s') Q(s', a')` under the ε-greedy policy
    Expected,
}

/// Tabular SARSA with ε-greedy exploration.
#[derive(Debug, Clone)]
pub struct SarsaAgent {
    target: SarsaTarget,
    params: TdParams,
    q_table: QTable,
    planned: Option<(State, Action)>,
    rng: StdRng,
}

impl SarsaAgent {
    pub const NAME: &'static str = "sarsa";
    pub const EXPECTED_NAME: &'static str = "exp_sarsa";

    pub fn new(target: SarsaTarget, params: TdParams) -> Self {
        Self {
            target,
            params,
            q_table: QTable::new(),
            planned: None,
            rng: build_rng(None),
        }
    }

    pub fn from_config(target: SarsaTarget, config: &AgentConfig) -> Self {
        let mut agent = Self::new(target, TdParams::from_config(config));
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
        }
        agent
    }

    pub fn target(&self) -> SarsaTarget {
        self.target
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Action held for the next decision, if any
    pub fn planned_action(&self) -> Option<(State, Action)> {
        self.planned
    }

    fn policy_action(&mut self, state: State, actions: &[Action]) -> Option<Action> {
        let q_table = &self.q_table;
        epsilon_greedy(&mut self.rng, self.params.epsilon(), actions, |a| {
            q_table.get(state, a)
        })
    }

    fn expected_value(&self, state: State, actions: &[Action]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        let best = self.q_table.max_value(state, actions);
        let greedy = actions
            .iter()
            .filter(|&&a| self.q_table.get(state, a) == best)
            .count() as f64;
        let epsilon = self.params.epsilon();
        let explore = epsilon / actions.len() as f64;

        actions
            .iter()
            .map(|&a| {
                let q = self.q_table.get(state, a);
                let probability = if q == best {
                    explore + (1.0 - epsilon) / greedy
                } else {
                    explore
                };
                probability * q
            })
            .sum()
    }
}

impl Agent for SarsaAgent {
    fn name(&self) -> &str {
        match self.target {
            SarsaTarget::Sampled => Self::NAME,
            SarsaTarget::Expected => Self::EXPECTED_NAME,
        }
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        if let Some((planned_state, action)) = self.planned.take()
            && planned_state == state
        {
            return Ok(action);
        }
        let actions = env.possible_actions(state)?;
        self.policy_action(state, &actions)
            .ok_or_else(|| no_legal_actions(state))
    }

    fn update(&mut self, env: &Environment, transition: &Transition) -> Result<()> {
        let Transition {
            state,
            action,
            reward,
            next_state,
        } = *transition;
        let next_actions = env.possible_actions(next_state)?;

        let next_value = match self.target {
            SarsaTarget::Sampled => {
                let next_action = self.policy_action(next_state, &next_actions);
                self.planned = next_action.map(|a| (next_state, a));
                next_action.map_or(0.0, |a| self.q_table.get(next_state, a))
            }
            SarsaTarget::Expected => self.expected_value(next_state, &next_actions),
        };

        let current = self.q_table.get(state, action);
        let td_error = reward + self.params.discount() * next_value - current;
        self.q_table
            .set(state, action, current + self.params.alpha() * td_error);
        Ok(())
    }

    fn before_gameplay(&mut self) {
        self.planned = None;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::LiveBackend,
        environment::WIN_REWARD,
        game::{BoardSize, GameState},
    };

    fn env() -> Environment {
        Environment::new(Box::new(LiveBackend::new(BoardSize::square(4).unwrap())))
    }

    fn first_transition(env: &Environment) -> Transition {
        let state = Environment::state_of(&GameState::initial(env.size()));
        let action = env.possible_actions(state).unwrap()[0];
        let next_state = *env.next_states(state, action).unwrap().keys().next().unwrap();
        Transition {
            state,
            action,
            reward: 0.0,
            next_state,
        }
    }

    #[test]
    fn test_update_moves_towards_target_and_plans_next_action() {
        let env = env();
        let params = TdParams::new(0.5, 0.0, 0.9);
        let mut agent = SarsaAgent::new(SarsaTarget::Sampled, params);
        let mut t = first_transition(&env);
        t.reward = WIN_REWARD;

        agent.update(&env, &t).unwrap();
        assert_eq!(agent.q_table().get(t.state, t.action), 500.0);

        let (planned_state, planned_action) = agent.planned_action().unwrap();
        assert_eq!(planned_state, t.next_state);
        assert_eq!(agent.select_action(&env, t.next_state).unwrap(), planned_action);
        assert_eq!(agent.planned_action(), None);
    }

    #[test]
    fn test_planned_action_ignored_for_other_state() {
        let env = env();
        let mut agent = SarsaAgent::new(SarsaTarget::Sampled, TdParams::new(0.5, 0.0, 0.9));
        let t = first_transition(&env);
        agent.update(&env, &t).unwrap();

        let action = agent.select_action(&env, t.state).unwrap();
        assert!(env.possible_actions(t.state).unwrap().contains(&action));
    }

    #[test]
    fn test_before_gameplay_clears_plan() {
        let env = env();
        let mut agent = SarsaAgent::new(SarsaTarget::Sampled, TdParams::new(0.5, 0.0, 0.9));
        agent.update(&env, &first_transition(&env)).unwrap();
        agent.before_gameplay();
        assert_eq!(agent.planned_action(), None);
    }

    #[test]
    fn test_expected_value_weights_greedy_action() {
        let env = env();
        let mut agent = SarsaAgent::new(SarsaTarget::Expected, TdParams::new(0.2, 0.5, 0.9));
        let mut t = first_transition(&env);
        t.next_state = env
            .next_states(t.state, t.action)
            .unwrap()
            .into_keys()
            .find(|&s| env.possible_actions(s).unwrap().len() >= 2)
            .unwrap();
        let actions = env.possible_actions(t.next_state).unwrap();
        agent.q_table.set(t.next_state, actions[0], 10.0);

        // π(best) = ε/n + (1 - ε), others ε/n.
        let n = actions.len() as f64;
        let expected = (0.5 / n + 0.5) * 10.0;
        assert!((agent.expected_value(t.next_state, &actions) - expected).abs() < 1e-12);

        agent.update(&env, &t).unwrap();
        assert_eq!(agent.planned_action(), None);
        assert!((agent.q_table().get(t.state, t.action) - 0.2 * 0.9 * expected).abs() < 1e-12);
    }

    #[test]
    fn test_learning_off_freezes_q_values() {
        let env = env();
        let mut agent = SarsaAgent::from_config(SarsaTarget::Sampled, &AgentConfig::default());
        agent.set_learning(false);
        let mut t = first_transition(&env);
        t.reward = WIN_REWARD;
        agent.update(&env, &t).unwrap();
        assert_eq!(agent.q_table().get(t.state, t.action), 0.0);
    }

    #[test]
    fn test_knowledge_roundtrip() {
        let env = env();
        let mut agent = SarsaAgent::new(SarsaTarget::Sampled, TdParams::new(0.5, 0.0, 0.9));
        let mut t = first_transition(&env);
        t.reward = WIN_REWARD;
        agent.update(&env, &t).unwrap();

        let blob = agent.data_to_save().unwrap().unwrap();
        let mut restored = SarsaAgent::new(SarsaTarget::Sampled, TdParams::new(0.5, 0.0, 0.9));
        restored.set_saved_data(&blob).unwrap();
        assert_eq!(restored.q_table(), agent.q_table());
    }
}

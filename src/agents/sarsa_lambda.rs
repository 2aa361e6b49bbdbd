//! SARSA(λ) with accumulating eligibility traces

use std::{any::Any, collections::HashMap};

use rand::{SeedableRng, rngs::StdRng};

use super::{QTable, TdParams, build_rng, epsilon_greedy};
use crate::{
    Result,
    app::AgentConfig,
    environment::{Action, Environment, State},
    ports::{Agent, KnowledgeBlob, Transition, agent::no_legal_actions},
};

/// SARSA with eligibility traces.
///
/// Each step bumps the trace of the visited pair by one, moves every traced
/// pair by `α·δ·e`, then decays all traces by `γλ`. Traces that decay below
/// the cutoff are removed, so a pair not revisited for long enough has no
/// trace at all. Traces only live within one game.
#[derive(Debug, Clone)]
pub struct SarsaLambdaAgent {
    params: TdParams,
    lambda: f64,
    trace_cutoff: f64,
    q_table: QTable,
    traces: HashMap<(State, Action), f64>,
    planned: Option<(State, Action)>,
    rng: StdRng,
}

impl SarsaLambdaAgent {
    pub const NAME: &'static str = "sarsa_lambda";

    pub fn new(params: TdParams, lambda: f64, trace_cutoff: f64) -> Self {
        Self {
            params,
            lambda,
            trace_cutoff,
            q_table: QTable::new(),
            traces: HashMap::new(),
            planned: None,
            rng: build_rng(None),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let mut agent = Self::new(
            TdParams::from_config(config),
            config.lambda,
            config.trace_cutoff,
        );
        if let Some(seed) = config.seed {
            agent.set_rng_seed(seed);
        }
        agent
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Current trace of a pair, 0 if untraced
    pub fn trace(&self, state: State, action: Action) -> f64 {
        self.traces.get(&(state, action)).copied().unwrap_or(0.0)
    }

    /// Number of pairs with a live trace
    pub fn active_traces(&self) -> usize {
        self.traces.len()
    }

    pub fn planned_action(&self) -> Option<(State, Action)> {
        self.planned
    }

    fn policy_action(&mut self, state: State, actions: &[Action]) -> Option<Action> {
        let q_table = &self.q_table;
        epsilon_greedy(&mut self.rng, self.params.epsilon(), actions, |a| {
            q_table.get(state, a)
        })
    }
}

impl Agent for SarsaLambdaAgent {
    fn name(&self) -> &str {
        Self::NAME
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
        let next_action = self.policy_action(next_state, &next_actions);
        self.planned = next_action.map(|a| (next_state, a));

        let next_value = next_action.map_or(0.0, |a| self.q_table.get(next_state, a));
        let td_error =
            reward + self.params.discount() * next_value - self.q_table.get(state, action);
        *self.traces.entry((state, action)).or_insert(0.0) += 1.0;

        let step = self.params.alpha() * td_error;
        let decay = self.params.discount() * self.lambda;
        let cutoff = self.trace_cutoff;
        let q_table = &mut self.q_table;
        self.traces.retain(|&(s, a), trace| {
            q_table.add(s, a, step * *trace);
            *trace *= decay;
            *trace >= cutoff
        });
        Ok(())
    }

    fn before_gameplay(&mut self) {
        self.traces.clear();
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
        game::{BoardSize, GameState},
    };

    fn env() -> Environment {
        Environment::new(Box::new(LiveBackend::new(BoardSize::square(4).unwrap())))
    }

    /// A short chain of transitions from the opening, following the first
    /// action and first outcome each time.
    fn chain(env: &Environment, length: usize) -> Vec<Transition> {
        let mut state = Environment::state_of(&GameState::initial(env.size()));
        let mut transitions = Vec::new();
        for _ in 0..length {
            let action = env.possible_actions(state).unwrap()[0];
            let next_state = *env.next_states(state, action).unwrap().keys().next().unwrap();
            transitions.push(Transition {
                state,
                action,
                reward: 0.0,
                next_state,
            });
            state = next_state;
        }
        transitions
    }

    #[test]
    fn test_trace_accumulates_and_decays() {
        let env = env();
        let mut agent = SarsaLambdaAgent::new(TdParams::new(0.2, 0.0, 0.9), 0.5, 1e-6);
        let t = chain(&env, 1)[0];

        agent.update(&env, &t).unwrap();
        assert!((agent.trace(t.state, t.action) - 0.45).abs() < 1e-12);

        agent.update(&env, &t).unwrap();
        assert!((agent.trace(t.state, t.action) - 1.45 * 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_td_error_reaches_earlier_pairs() {
        let env = env();
        let mut agent = SarsaLambdaAgent::new(TdParams::new(0.5, 0.0, 1.0), 0.5, 1e-6);
        let steps = chain(&env, 2);
        agent.update(&env, &steps[0]).unwrap();

        let mut last = steps[1];
        last.reward = 100.0;
        agent.update(&env, &last).unwrap();

        // δ = 100, first pair trace γλ = 0.5: Q += 0.5 · 100 · 0.5.
        assert!((agent.q_table().get(last.state, last.action) - 50.0).abs() < 1e-9);
        assert!((agent.q_table().get(steps[0].state, steps[0].action) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_traces_fall_to_zero_below_cutoff() {
        let env = env();
        let mut agent = SarsaLambdaAgent::new(TdParams::new(0.2, 0.0, 0.5), 0.5, 1e-3);
        let steps = chain(&env, 2);
        agent.update(&env, &steps[0]).unwrap();
        for _ in 0..5 {
            agent.update(&env, &steps[1]).unwrap();
        }
        // (γλ)^5 = 1/1024 is below the cutoff.
        assert_eq!(agent.trace(steps[0].state, steps[0].action), 0.0);
        assert!(agent.trace(steps[1].state, steps[1].action) > 0.0);
    }

    #[test]
    fn test_before_gameplay_resets_traces() {
        let env = env();
        let mut agent = SarsaLambdaAgent::from_config(&AgentConfig::default().with_seed(5));
        for t in chain(&env, 2) {
            agent.update(&env, &t).unwrap();
        }
        assert!(agent.active_traces() > 0);
        assert!(agent.planned_action().is_some());

        agent.before_gameplay();
        assert_eq!(agent.active_traces(), 0);
        assert_eq!(agent.planned_action(), None);
    }

    #[test]
    fn test_knowledge_roundtrip_excludes_traces() {
        let env = env();
        let mut agent = SarsaLambdaAgent::new(TdParams::new(0.5, 0.0, 1.0), 0.5, 1e-6);
        let mut t = chain(&env, 1)[0];
        t.reward = 10.0;
        agent.update(&env, &t).unwrap();

        let blob = agent.data_to_save().unwrap().unwrap();
        let mut restored = SarsaLambdaAgent::new(TdParams::new(0.5, 0.0, 1.0), 0.5, 1e-6);
        restored.set_saved_data(&blob).unwrap();
        assert_eq!(restored.q_table(), agent.q_table());
        assert_eq!(restored.active_traces(), 0);
    }
}

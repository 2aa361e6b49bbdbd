//! Uniform random baseline

use std::any::Any;

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::build_rng;
use crate::{
    Result,
    environment::{Action, Environment, State},
    ports::{Agent, agent::no_legal_actions},
};

/// Picks uniformly among the legal actions.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub const NAME: &'static str = "random";

    pub fn new() -> Self {
        Self {
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action> {
        env.possible_actions(state)?
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| no_legal_actions(state))
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
        Error,
        backend::LiveBackend,
        game::{Board, BoardSize, GameState},
    };

    fn env() -> Environment {
        Environment::new(Box::new(LiveBackend::new(BoardSize::square(4).unwrap())))
    }

    #[test]
    fn test_selects_legal_actions_reproducibly() {
        let env = env();
        let state = Environment::state_of(&GameState::initial(env.size()));
        let legal = env.possible_actions(state).unwrap();

        let mut a = RandomAgent::new().with_seed(11);
        let mut b = RandomAgent::new().with_seed(11);
        for _ in 0..20 {
            let action = a.select_action(&env, state).unwrap();
            assert!(legal.contains(&action));
            assert_eq!(action, b.select_action(&env, state).unwrap());
        }
    }

    #[test]
    fn test_finished_state_is_error() {
        let env = env();
        let full = Board::from_rows(&["WWWW", "WWWW", "BBBB", "BBBB"]).unwrap();
        let result = RandomAgent::new().select_action(&env, full.encode());
        assert!(matches!(result, Err(Error::NoLegalActions { .. })));
    }
}

//! Agent port - the one interface every playing policy implements

use std::any::Any;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error, Result,
    environment::{Action, Environment, State},
};

/// One macro-transition observed by an online learner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next_state: State,
}

/// Opaque serialized agent knowledge.
///
/// Agents decide what goes in; storage only needs the bytes to survive a
/// round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBlob {
    bytes: Vec<u8>,
}

impl KnowledgeBlob {
    /// Serialize `knowledge` to MessagePack
    pub fn encode<T: Serialize>(knowledge: &T) -> Result<Self> {
        let bytes = rmp_serde::to_vec(knowledge).map_err(|e| Error::SerializationContext {
            operation: "serialize agent knowledge to MessagePack".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { bytes })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        rmp_serde::from_slice(&self.bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize agent knowledge from MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A playing policy, learned or fixed.
///
/// States are always seen from the agent's side (ME to move), so the same
/// instance can play either colour. Every hook except [`Agent::name`],
/// [`Agent::select_action`] and [`Agent::as_any`] has a no-op default, and
/// each algorithm overrides only what it needs.
///
/// # Examples
///
/// ```no_run
/// use reversi_agents::{
///     agents::RandomAgent,
///     backend::LiveBackend,
///     environment::Environment,
///     game::{BoardSize, GameState},
///     ports::Agent,
/// };
///
/// let size = BoardSize::square(4)?;
/// let env = Environment::new(Box::new(LiveBackend::new(size)));
/// let mut agent = RandomAgent::new().with_seed(7);
/// agent.initialize(&env)?;
///
/// let state = Environment::state_of(&GameState::initial(size));
/// let action = agent.select_action(&env, state)?;
/// assert!(env.possible_actions(state)?.contains(&action));
/// # Ok::<(), reversi_agents::Error>(())
/// ```
pub trait Agent: Send {
    /// Registry name of the algorithm
    fn name(&self) -> &str;

    /// One-time preparation before the first game, e.g. offline planning
    fn initialize(&mut self, _env: &Environment) -> Result<()> {
        Ok(())
    }

    /// Choose an action for ME in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLegalActions`] for finished states and
    /// [`Error::UninitializedPolicy`] for planners asked to act before
    /// planning.
    fn select_action(&mut self, env: &Environment, state: State) -> Result<Action>;

    /// Learn from one transition. Called only while learning is enabled.
    fn update(&mut self, _env: &Environment, _transition: &Transition) -> Result<()> {
        Ok(())
    }

    /// Episode start hook
    fn before_gameplay(&mut self) {}

    /// Episode end hook
    fn after_gameplay(&mut self) {}

    /// Knowledge to persist, `None` for agents without any
    fn data_to_save(&self) -> Result<Option<KnowledgeBlob>> {
        Ok(None)
    }

    /// Replace the agent's knowledge with a previously saved blob
    fn set_saved_data(&mut self, _blob: &KnowledgeBlob) -> Result<()> {
        Ok(())
    }

    /// Toggle learning. With learning off exploration and step sizes are zero.
    fn set_learning(&mut self, _learning: bool) {}

    fn is_learning(&self) -> bool {
        false
    }

    /// Reseed the agent's random number generator for reproducible runs
    fn set_rng_seed(&mut self, _seed: u64) {}

    /// Enable downcasting to concrete agent types
    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn no_legal_actions(state: State) -> Error {
    Error::NoLegalActions {
        state: state.to_string(),
    }
}

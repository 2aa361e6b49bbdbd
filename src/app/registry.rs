//! Name → constructor table for agents.

use std::collections::BTreeMap;

use super::config::AgentConfig;
use crate::{
    Error, Result,
    agents::{
        DoubleQLearningAgent, LinearValueAgent, MctsAgent, QLearningAgent, RandomAgent,
        SarsaAgent, SarsaLambdaAgent, SarsaTarget, ValueIterationAgent,
    },
    ports::Agent,
};

/// Builds an agent from its configuration
pub type AgentFactory = fn(&AgentConfig) -> Box<dyn Agent>;

/// Registry of agent constructors, built once and passed by reference.
///
/// # Examples
///
/// ```
/// use reversi_agents::app::{AgentConfig, AgentRegistry};
///
/// let registry = AgentRegistry::builtin();
/// let agent = registry.create("sarsa", &AgentConfig::default())?;
/// assert_eq!(agent.name(), "sarsa");
/// assert!(registry.create("minimax", &AgentConfig::default()).is_err());
/// # Ok::<(), reversi_agents::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl AgentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every agent shipped by this crate
    pub fn builtin() -> Self {
        let builtin: [(&str, AgentFactory); 9] = [
            (RandomAgent::NAME, |config| {
                let agent = RandomAgent::new();
                Box::new(match config.seed {
                    Some(seed) => agent.with_seed(seed),
                    None => agent,
                })
            }),
            (ValueIterationAgent::NAME, |config| {
                Box::new(ValueIterationAgent::from_config(config))
            }),
            (SarsaAgent::NAME, |config| {
                Box::new(SarsaAgent::from_config(SarsaTarget::Sampled, config))
            }),
            (SarsaAgent::EXPECTED_NAME, |config| {
                Box::new(SarsaAgent::from_config(SarsaTarget::Expected, config))
            }),
            (SarsaLambdaAgent::NAME, |config| {
                Box::new(SarsaLambdaAgent::from_config(config))
            }),
            (QLearningAgent::NAME, |config| {
                Box::new(QLearningAgent::from_config(config))
            }),
            (DoubleQLearningAgent::NAME, |config| {
                Box::new(DoubleQLearningAgent::from_config(config))
            }),
            (MctsAgent::NAME, |config| Box::new(MctsAgent::from_config(config))),
            (LinearValueAgent::NAME, |config| {
                Box::new(LinearValueAgent::from_config(config))
            }),
        ];

        let mut registry = Self::new();
        for (name, factory) in builtin {
            registry.factories.insert(name.to_string(), factory);
        }
        registry
    }

    /// Add a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAgent`] if the name is taken.
    pub fn register(&mut self, name: impl Into<String>, factory: AgentFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::DuplicateAgent { name });
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Build the agent registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAgent`] listing the registered names.
    pub fn create(&self, name: &str, config: &AgentConfig) -> Result<Box<dyn Agent>> {
        let factory = self.factories.get(name).ok_or_else(|| Error::UnknownAgent {
            name: name.to_string(),
            expected: self.names().collect::<Vec<_>>().join(", "),
        })?;
        Ok(factory(config))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

//! Dependency injection container.
//!
//! The container owns the knowledge repository and the agent registry and
//! wires both into the agents it creates.

use std::sync::Arc;

use super::{config::AgentConfig, registry::AgentRegistry};
use crate::{
    Result,
    adapters::MsgPackRepository,
    game::BoardSize,
    ports::{Agent, KnowledgeRepository},
};

/// Directory used by [`App::new`] for saved knowledge
pub const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge";

/// Application with dependency injection.
///
/// # Examples
///
/// ```
/// use reversi_agents::{adapters::InMemoryRepository, app::{AgentConfig, App}};
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// let agent = app.create_agent("q_learning", AgentConfig::default())?;
/// assert_eq!(agent.name(), "q_learning");
/// # Ok::<(), reversi_agents::Error>(())
/// ```
pub struct App {
    repository: Arc<dyn KnowledgeRepository + Send + Sync>,
    registry: AgentRegistry,
    /// Seed for agents whose config has none (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Production defaults: `MsgPackRepository` under
    /// [`DEFAULT_KNOWLEDGE_DIR`], builtin agents, no default seed.
    pub fn new() -> Self {
        AppBuilder::new().build()
    }

    /// Builder for injecting custom dependencies
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn KnowledgeRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Create an agent by registry name, falling back to the app's default
    /// seed when the config carries none.
    pub fn create_agent(&self, name: &str, config: AgentConfig) -> Result<Box<dyn Agent>> {
        let config = match (config.seed, self.default_seed) {
            (None, Some(seed)) => config.with_seed(seed),
            _ => config,
        };
        self.registry.create(name, &config)
    }

    /// Restore an agent's saved knowledge for `size`.
    ///
    /// Returns `false`, leaving the agent untouched, when nothing was saved.
    pub fn load_knowledge(&self, agent: &mut dyn Agent, size: BoardSize) -> Result<bool> {
        let Some(blob) = self.repository.load(size, agent.name())? else {
            tracing::debug!(agent = agent.name(), %size, "no saved knowledge");
            return Ok(false);
        };
        agent.set_saved_data(&blob)?;
        tracing::info!(agent = agent.name(), %size, bytes = blob.len(), "restored knowledge");
        Ok(true)
    }

    /// Persist an agent's knowledge for `size`.
    ///
    /// Returns `false` for agents with nothing to save.
    pub fn save_knowledge(&self, agent: &dyn Agent, size: BoardSize) -> Result<bool> {
        let Some(blob) = agent.data_to_save()? else {
            return Ok(false);
        };
        self.repository.save(size, agent.name(), &blob)?;
        tracing::info!(agent = agent.name(), %size, bytes = blob.len(), "saved knowledge");
        Ok(true)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an [`App`] with custom dependencies.
pub struct AppBuilder {
    repository: Option<Arc<dyn KnowledgeRepository + Send + Sync>>,
    registry: Option<AgentRegistry>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            registry: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R: KnowledgeRepository + Send + Sync + 'static>(
        mut self,
        repo: R,
    ) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Replace the builtin agents with a custom registry
    pub fn with_registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Seed for every agent whose config does not set one
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new(DEFAULT_KNOWLEDGE_DIR))),
            registry: self.registry.unwrap_or_else(AgentRegistry::builtin),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Application layer: configuration, the agent registry and the dependency
//! injection container.
//!
//! ```text
//!   App ──owns──▶ KnowledgeRepository (MsgPackRepository / InMemoryRepository)
//!    │
//!    └──owns──▶ AgentRegistry ──builds──▶ Box<dyn Agent>
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use reversi_agents::{
//!     app::{AgentConfig, App},
//!     game::BoardSize,
//! };
//!
//! let app = App::new();
//! let size = BoardSize::square(4)?;
//! let mut agent = app.create_agent("sarsa_lambda", AgentConfig::default().with_seed(42))?;
//! app.load_knowledge(agent.as_mut(), size)?;
//! // ... play and learn ...
//! app.save_knowledge(agent.as_ref(), size)?;
//! # Ok::<(), reversi_agents::Error>(())
//! ```

pub mod config;
pub mod container;
pub mod registry;

pub use config::AgentConfig;
pub use container::{App, AppBuilder, DEFAULT_KNOWLEDGE_DIR};
pub use registry::{AgentFactory, AgentRegistry};

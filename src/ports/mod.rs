//! Ports (trait boundaries) between the learning core and its drivers.
//!
//! Agents, game observers and knowledge storage are defined here as traits
//! and implemented elsewhere: agents in [`crate::agents`], storage in
//! [`crate::adapters`], observers in [`crate::gameplay`].

pub mod agent;
pub mod observer;
pub mod repository;

pub use agent::{Agent, KnowledgeBlob, Transition};
pub use observer::Observer;
pub use repository::KnowledgeRepository;

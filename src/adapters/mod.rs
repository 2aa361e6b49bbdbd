//! Adapters implementing domain ports.
//!
//! Storage implementations of [`crate::ports::KnowledgeRepository`].

pub mod in_memory_repository;
pub mod msgpack_repository;

pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;

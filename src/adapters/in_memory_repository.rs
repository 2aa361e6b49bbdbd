//! In-memory knowledge repository for testing.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    Result,
    game::BoardSize,
    ports::{KnowledgeBlob, KnowledgeRepository},
};

/// Keeps blobs in a shared map instead of on disk.
///
/// Clones share the same storage.
///
/// ```
/// use reversi_agents::{
///     adapters::InMemoryRepository,
///     game::BoardSize,
///     ports::{KnowledgeBlob, KnowledgeRepository},
/// };
///
/// let repo = InMemoryRepository::new();
/// let size = BoardSize::square(4)?;
/// repo.save(size, "mcts", &KnowledgeBlob::from_bytes(vec![1, 2, 3]))?;
/// assert_eq!(repo.load(size, "mcts")?.map(|b| b.len()), Some(3));
/// # Ok::<(), reversi_agents::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, KnowledgeBlob>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, size: BoardSize, agent: &str) -> bool {
        self.storage().contains_key(&Self::key(size, agent))
    }

    fn key(size: BoardSize, agent: &str) -> String {
        format!("{size}_{agent}")
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, KnowledgeBlob>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KnowledgeRepository for InMemoryRepository {
    fn save(&self, size: BoardSize, agent: &str, blob: &KnowledgeBlob) -> Result<()> {
        self.storage().insert(Self::key(size, agent), blob.clone());
        Ok(())
    }

    fn load(&self, size: BoardSize, agent: &str) -> Result<Option<KnowledgeBlob>> {
        Ok(self.storage().get(&Self::key(size, agent)).cloned())
    }
}

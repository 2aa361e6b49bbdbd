//! Repository port for agent knowledge persistence.

use crate::{Result, game::BoardSize, ports::KnowledgeBlob};

/// Port for persisting and loading agent knowledge.
///
/// Blobs are keyed by board size and agent name; the storage layout is up to
/// the implementation.
///
/// # Examples
///
/// ```no_run
/// use reversi_agents::{
///     adapters::MsgPackRepository,
///     game::BoardSize,
///     ports::{KnowledgeBlob, KnowledgeRepository},
/// };
///
/// let repo = MsgPackRepository::new("knowledge");
/// let size = BoardSize::square(4)?;
/// repo.save(size, "sarsa", &KnowledgeBlob::encode(&vec![1.0, 2.0])?)?;
/// let blob = repo.load(size, "sarsa")?.expect("just saved");
/// # Ok::<(), reversi_agents::Error>(())
/// ```
pub trait KnowledgeRepository {
    /// Store `blob`, replacing any previous knowledge under the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, size: BoardSize, agent: &str, blob: &KnowledgeBlob) -> Result<()>;

    /// Fetch knowledge, `None` if nothing was stored under the key yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data exists but cannot be read.
    fn load(&self, size: BoardSize, agent: &str) -> Result<Option<KnowledgeBlob>>;
}

//! File-backed knowledge repository.
//!
//! Agents already serialize their knowledge to MessagePack, so this adapter
//! writes the blob bytes as-is, one `.msgpack` file per board size and agent.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    Result,
    error::Error,
    game::BoardSize,
    ports::{KnowledgeBlob, KnowledgeRepository},
};

/// Stores each blob as `<rows>x<cols>_<agent>.msgpack` under a directory.
#[derive(Debug, Clone)]
pub struct MsgPackRepository {
    dir: PathBuf,
}

impl MsgPackRepository {
    /// Create a repository rooted at `dir`. The directory is created on the
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the knowledge of `agent` for `size`
    pub fn path_for(&self, size: BoardSize, agent: &str) -> PathBuf {
        self.dir.join(format!("{size}_{agent}.msgpack"))
    }
}

impl KnowledgeRepository for MsgPackRepository {
    fn save(&self, size: BoardSize, agent: &str, blob: &KnowledgeBlob) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Io {
            operation: format!("create directory {:?}", self.dir),
            source,
        })?;

        let path = self.path_for(size, agent);
        fs::write(&path, blob.as_bytes()).map_err(|source| Error::Io {
            operation: format!("write file {path:?}"),
            source,
        })?;

        tracing::debug!(agent, path = %path.display(), bytes = blob.len(), "saved agent knowledge");
        Ok(())
    }

    fn load(&self, size: BoardSize, agent: &str) -> Result<Option<KnowledgeBlob>> {
        let path = self.path_for(size, agent);
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(
                    agent,
                    path = %path.display(),
                    bytes = bytes.len(),
                    "loaded agent knowledge"
                );
                Ok(Some(KnowledgeBlob::from_bytes(bytes)))
            }
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io {
                operation: format!("read file {path:?}"),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn size() -> BoardSize {
        BoardSize::new(4, 6).unwrap()
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new(temp_dir.path().join("knowledge"));
        let blob = KnowledgeBlob::encode(&vec![0.5_f64, -1.0]).unwrap();

        repo.save(size(), "sarsa", &blob).expect("Failed to save");
        assert!(temp_dir.path().join("knowledge/4x6_sarsa.msgpack").exists());

        let loaded = repo.load(size(), "sarsa").expect("Failed to load");
        assert_eq!(loaded, Some(blob));
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new(temp_dir.path());
        assert_eq!(repo.load(size(), "mcts").unwrap(), None);
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("occupied");
        fs::write(&file, b"not a directory").unwrap();

        let repo = MsgPackRepository::new(&file);
        let blob = KnowledgeBlob::from_bytes(vec![1, 2, 3]);
        assert!(matches!(
            repo.save(size(), "sarsa", &blob),
            Err(Error::Io { .. })
        ));
    }
}

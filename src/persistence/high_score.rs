use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Persistence error wrapper.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("high score at {path:?} is not a number: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("high score store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the best score across games.
pub trait HighScoreStore: Send {
    /// Stored high score; an absent value reads as 0.
    fn high_score(&self) -> Result<u32, StoreError>;

    fn set_high_score(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Keeps the high score for the lifetime of the process only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    score: Option<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u32) -> Self {
        Self { score: Some(score) }
    }
}

impl HighScoreStore for MemoryStore {
    fn high_score(&self) -> Result<u32, StoreError> {
        Ok(self.score.unwrap_or(0))
    }

    fn set_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        self.score = Some(score);
        Ok(())
    }
}

/// Stores the high score as a bare JSON number in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HighScoreStore for JsonFileStore {
    fn high_score(&self) -> Result<u32, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(self.io_error(err)),
        };

        if raw.trim().is_empty() {
            return Ok(0);
        }

        serde_json::from_str(raw.trim()).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn set_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let encoded = serde_json::to_string(&score).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, encoded).map_err(|err| self.io_error(err))?;

        debug!(score, path = ?self.path, "Persisted high score");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_defaults_to_zero() {
        let mut store = MemoryStore::new();
        assert_eq!(store.high_score().unwrap(), 0);

        store.set_high_score(4).unwrap();
        assert_eq!(store.high_score().unwrap(), 4);
        assert_eq!(MemoryStore::with_score(9).high_score().unwrap(), 9);
    }

    #[test]
    fn test_missing_file_reads_as_zero() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("high-score.json"));

        assert_eq!(store.high_score().unwrap(), 0);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("high-score.json");

        let mut store = JsonFileStore::new(&path);
        store.set_high_score(17).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "17");
        assert_eq!(JsonFileStore::new(&path).high_score().unwrap(), 17);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("high-score.json");
        std::fs::write(&path, "\"lots\"").unwrap();

        let err = JsonFileStore::new(&path).high_score().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be
        let mut store = JsonFileStore::new(dir.path());

        assert!(matches!(
            store.set_high_score(3),
            Err(StoreError::Io { .. })
        ));
    }
}

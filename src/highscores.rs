//! Persist the high score: a single decimal integer in a small file.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default record location, relative to the working directory.
pub const DEFAULT_FILENAME: &str = "highscore.txt";

#[derive(Debug, Error)]
pub enum ScoreStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid high score record {contents:?} in {path}")]
    Parse { path: PathBuf, contents: String },
}

/// Where the high score lives between runs.
pub trait ScoreStore: Debug {
    /// Stored high score; 0 when nothing has been recorded yet.
    fn load(&self) -> Result<u32, ScoreStoreError>;

    /// Store `score` if it beats the stored value. Returns true when written.
    fn save(&mut self, score: u32) -> Result<bool, ScoreStoreError>;
}

/// File-backed store. The whole file is the score, e.g. `1450`.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> ScoreStoreError {
        ScoreStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileScoreStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME)
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Result<u32, ScoreStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.io_err(e)),
        };
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed.parse::<u32>().map_err(|_| ScoreStoreError::Parse {
            path: self.path.clone(),
            contents: trimmed.to_string(),
        })
    }

    fn save(&mut self, score: u32) -> Result<bool, ScoreStoreError> {
        // A corrupt record is overwritten rather than blocking saves forever.
        let previous = self.load().unwrap_or(0);
        if score <= previous {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        fs::write(&self.path, score.to_string()).map_err(|e| self.io_err(e))?;
        Ok(true)
    }
}

/// In-memory store with the same keep-the-best rule. Used by `--no-save` and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: u32,
}

impl MemoryScoreStore {
    #[cfg(test)]
    pub fn with_score(best: u32) -> Self {
        Self { best }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<u32, ScoreStoreError> {
        Ok(self.best)
    }

    fn save(&mut self, score: u32) -> Result<bool, ScoreStoreError> {
        if score > self.best {
            self.best = score;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScoreStore::new(dir.path().join(DEFAULT_FILENAME));
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(dir.path().join(DEFAULT_FILENAME));
        assert!(store.save(1200).unwrap());
        assert_eq!(store.load().unwrap(), 1200);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "1200");
    }

    #[test]
    fn test_lower_score_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(dir.path().join(DEFAULT_FILENAME));
        store.save(900).unwrap();
        assert!(!store.save(300).unwrap());
        assert!(!store.save(900).unwrap());
        assert_eq!(store.load().unwrap(), 900);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(dir.path().join("nested").join("hs.txt"));
        assert!(store.save(5).unwrap());
        assert_eq!(store.load().unwrap(), 5);
    }

    #[test]
    fn test_garbage_is_a_parse_error_and_gets_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILENAME);
        fs::write(&path, "not a number").unwrap();
        let mut store = FileScoreStore::new(&path);
        assert!(matches!(store.load(), Err(ScoreStoreError::Parse { .. })));
        assert!(store.save(100).unwrap());
        assert_eq!(store.load().unwrap(), 100);
    }

    #[test]
    fn test_trailing_newline_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILENAME);
        fs::write(&path, "750\n").unwrap();
        assert_eq!(FileScoreStore::new(&path).load().unwrap(), 750);
    }

    #[test]
    fn test_memory_store_keeps_best() {
        let mut store = MemoryScoreStore::with_score(400);
        assert!(!store.save(300).unwrap());
        assert_eq!(store.load().unwrap(), 400);
        assert!(store.save(401).unwrap());
        assert_eq!(store.load().unwrap(), 401);
    }
}

//! Named text blobs the log is written to.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::LogStoreError;

/// Host storage for log files and notes. Every write replaces the whole
/// text; there is no locking against concurrent writers.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    /// Create `path` with empty content.
    async fn create(&self, path: &str) -> Result<(), LogStoreError>;

    async fn read(&self, path: &str) -> Result<String, LogStoreError>;

    async fn write(&self, path: &str, text: &str) -> Result<(), LogStoreError>;
}

/// Files under a root directory.
#[derive(Debug, Clone)]
pub struct FsLogStore {
    root: PathBuf,
}

impl FsLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl LogStore for FsLogStore {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn create(&self, path: &str) -> Result<(), LogStoreError> {
        let full = self.resolve(path);
        let create_failed = |source| LogStoreError::CreateFailed {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(create_failed)?;
        }
        tokio::fs::write(&full, "").await.map_err(create_failed)
    }

    async fn read(&self, path: &str) -> Result<String, LogStoreError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|source| LogStoreError::ReadFailed {
                path: path.to_string(),
                source,
            })
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), LogStoreError> {
        tokio::fs::write(self.resolve(path), text)
            .await
            .map_err(|source| LogStoreError::WriteFailed {
                path: path.to_string(),
                source,
            })
    }
}

/// In-memory store, for tests and for hosts that keep notes themselves.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    files: Mutex<HashMap<String, String>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.lock().insert(path.to_string(), text.to_string());
        self
    }

    /// Current content of `path`.
    pub fn contents(&self, path: &str) -> Option<String> {
        self.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn exists(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    async fn create(&self, path: &str) -> Result<(), LogStoreError> {
        self.lock().insert(path.to_string(), String::new());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String, LogStoreError> {
        self.contents(path)
            .ok_or_else(|| LogStoreError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), LogStoreError> {
        self.lock().insert(path.to_string(), text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_creates_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLogStore::new(dir.path());
        assert!(!store.exists("logs/Pomodoro.md").await);

        store.create("logs/Pomodoro.md").await.unwrap();
        assert!(store.exists("logs/Pomodoro.md").await);
        assert_eq!(store.read("logs/Pomodoro.md").await.unwrap(), "");

        store.write("logs/Pomodoro.md", "hello\n").await.unwrap();
        assert_eq!(store.read("logs/Pomodoro.md").await.unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn fs_store_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLogStore::new(dir.path());
        assert!(matches!(
            store.read("missing.md").await,
            Err(LogStoreError::ReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryLogStore::new().with_file("a.md", "x");
        assert!(store.exists("a.md").await);
        assert!(!store.exists("b.md").await);
        store.write("b.md", "y").await.unwrap();
        assert_eq!(store.paths(), vec!["a.md".to_string(), "b.md".to_string()]);
        assert!(matches!(store.read("c.md").await, Err(LogStoreError::NotFound(_))));
    }
}

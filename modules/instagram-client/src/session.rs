//! Pluggable persistence for the private-session login state.
//!
//! The cache is shared between requests with last-writer-wins
//! semantics and no locking; two concurrent logins may interleave a
//! read with a write. Readers tolerate a missing or corrupt cache by
//! falling back to a full credential login, so the worst case is an
//! extra login, not corruption of anything durable.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{InstagramError, Result};

/// Key-value persistence for one serialized session blob.
pub trait SessionStore: Send + Sync {
    /// `None` when there is no usable cached session.
    fn load(&self) -> Option<String>;
    fn save(&self, serialized: &str) -> Result<()>;
}

/// The on-disk cache (`ig-session.json` by default).
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                tracing::debug!(path = %self.path.display(), %err, "No session cache to load");
                None
            }
        }
    }

    fn save(&self, serialized: &str) -> Result<()> {
        std::fs::write(&self.path, serialized).map_err(|e| {
            InstagramError::Session(format!(
                "failed to write session cache {}: {e}",
                self.path.display()
            ))
        })
    }
}

/// In-memory store for tests; proves the read paths have no
/// filesystem coupling.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.inner.lock().unwrap().clone()
    }

    fn save(&self, serialized: &str) -> Result<()> {
        *self.inner.lock().unwrap() = Some(serialized.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());
        store.save("{\"cookies\":{}}").unwrap();
        assert_eq!(store.load().unwrap(), "{\"cookies\":{}}");
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("ig-session.json"));
        assert!(store.load().is_none());
        store.save("state").unwrap();
        assert_eq!(store.load().unwrap(), "state");
    }

    #[test]
    fn file_store_overwrites_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("ig-session.json"));
        store.save("first").unwrap();
        store.save("second").unwrap();
        assert_eq!(store.load().unwrap(), "second");
    }
}

//! In-memory key-value store.
//!
//! Used as the ephemeral marker store: its contents live as long as the
//! process that owns it, which is the same lifetime as a browsing session
//! for a native client. Tabs of the same session share one instance through
//! an `Arc`, so a "reload" is a fresh session manager over the same store,
//! and closing the browser is [`MemoryStore::clear`] (or dropping it).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Durability, KeyValueStore, StorageError};

/// A `HashMap` behind a mutex.
///
/// Poisoning is ignored: every operation is a single map call, so the map
/// can never be observed half-updated.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    durability: Durability,
}

impl MemoryStore {
    /// A store scoped to one browsing session.
    pub fn session() -> Self {
        Self::with_durability(Durability::Session)
    }

    /// An in-memory stand-in for a durable store (tests, headless runs).
    pub fn durable() -> Self {
        Self::with_durability(Durability::Durable)
    }

    fn with_durability(durability: Durability) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            durability,
        }
    }

    /// Drops every entry. For a session store this is "the last tab of the
    /// origin closed".
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(durability = %self.durability, dropped, "store cleared");
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::session()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }

    fn durability(&self) -> Durability {
        self.durability
    }
}

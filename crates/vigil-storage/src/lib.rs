//! Storage abstraction layer for Vigil.
//!
//! Provides the [`KeyValueStore`] trait that the session core uses for both
//! of its stores:
//!
//! - the **durable store**, which must survive a full restart and holds the
//!   current token and user identity ([`FileStore`]);
//! - the **ephemeral marker store**, which lives exactly as long as one
//!   browsing session and holds only the continuity marker ([`MemoryStore`]).
//!
//! Both are plain string key-value maps. The difference between them is the
//! lifetime contract, not the interface.
//!
//! # Feature Flags
//!
//! - `file` (default): JSON-file-backed durable store via `serde_json`

mod error;
#[cfg(feature = "file")]
mod file;
mod memory;

pub use error::StorageError;
#[cfg(feature = "file")]
pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

/// How long the values in a store live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Durability {
    /// Survives process and browser restarts.
    Durable,
    /// Cleared when the browsing session ends, kept across reloads.
    Session,
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// A synchronous string key-value store.
///
/// All operations are synchronous: the session core never suspends while
/// touching storage, so a read-modify-write sequence is atomic with respect
/// to its single execution context.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// The lifetime contract this store provides.
    fn durability(&self) -> Durability;
}

/// Shared handles: several session managers (one per tab) may read the
/// same underlying store.
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn durability(&self) -> Durability {
        (**self).durability()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_display() {
        assert_eq!(Durability::Durable.to_string(), "durable");
        assert_eq!(Durability::Session.to_string(), "session");
    }

    #[test]
    fn test_arc_store_shares_underlying_values() {
        let store = Arc::new(MemoryStore::session());
        let other = Arc::clone(&store);

        store.set("k", "v").unwrap();

        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(other.durability(), Durability::Session);
    }

    #[test]
    fn test_boxed_dyn_store_delegates() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::durable());
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}

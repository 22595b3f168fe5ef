//! Persisted node-active flag
//!
//! Survives process restarts so an activated node resumes its heartbeat
//! the next time the wallet session comes up.

use super::storage::KeyValueStore;
use crate::error::SessionError;

const FLAG_TRUE: &str = "true";

/// Durable boolean stored under a fixed key
pub struct PersistedFlagStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PersistedFlagStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True only when the stored value is exactly "true"
    pub async fn read(&self) -> Result<bool, SessionError> {
        Ok(self.store.get(&self.key).await?.as_deref() == Some(FLAG_TRUE))
    }

    pub async fn write(&self, value: bool) -> Result<(), SessionError> {
        if value {
            self.store.set(&self.key, FLAG_TRUE).await
        } else {
            self.clear().await
        }
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::storage::MemoryKeyValueStore;

    #[tokio::test]
    async fn test_flag_roundtrip() {
        let flags = PersistedFlagStore::new(MemoryKeyValueStore::new(), "nodeActive");

        assert!(!flags.read().await.unwrap());
        flags.write(true).await.unwrap();
        assert!(flags.read().await.unwrap());
        assert_eq!(flags.store().peek("nodeActive").as_deref(), Some("true"));

        flags.write(false).await.unwrap();
        assert!(!flags.read().await.unwrap());
        assert_eq!(flags.store().peek("nodeActive"), None);
    }

    #[tokio::test]
    async fn test_flag_operations_are_idempotent() {
        let flags = PersistedFlagStore::new(MemoryKeyValueStore::new(), "nodeActive");

        flags.write(true).await.unwrap();
        flags.write(true).await.unwrap();
        assert!(flags.read().await.unwrap());

        flags.clear().await.unwrap();
        flags.clear().await.unwrap();
        assert!(!flags.read().await.unwrap());
    }

    #[tokio::test]
    async fn test_only_exact_true_counts() {
        let store = MemoryKeyValueStore::new();
        KeyValueStore::set(&store, "nodeActive", "TRUE").await.unwrap();

        let flags = PersistedFlagStore::new(store, "nodeActive");
        assert!(!flags.read().await.unwrap());
    }
}

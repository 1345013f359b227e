//! In-memory document store, useful for testing and ephemeral sessions.
//!
//! Records every write in order so tests can assert flush sequences, and can
//! be switched into a failing mode to exercise durable-write errors.

use async_trait::async_trait;
use iqraa_core::error::StorageError;
use iqraa_core::memory::DocumentStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: Arc<RwLock<BTreeMap<String, Value>>>,
    writes: Arc<RwLock<Vec<String>>>,
    fail_writes: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without recording a write.
    pub async fn insert(&self, name: &str, value: Value) {
        self.docs.write().await.insert(name.into(), value);
    }

    /// Names of written documents, in write order.
    pub async fn write_log(&self) -> Vec<String> {
        self.writes.read().await.clone()
    }

    pub async fn get(&self, name: &str) -> Option<Value> {
        self.docs.read().await.get(name).cloned()
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn read(&self, name: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.docs.read().await.get(name).cloned())
    }

    async fn write(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                name: name.into(),
                reason: "simulated write failure".into(),
            });
        }
        self.docs.write().await.insert(name.into(), value.clone());
        self.writes.write().await.push(name.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_write_order() {
        let store = InMemoryDocumentStore::new();
        store.write("session", &json!({})).await.unwrap();
        store.write("project", &json!({})).await.unwrap();
        assert_eq!(store.write_log().await, vec!["session", "project"]);
    }

    #[tokio::test]
    async fn seeded_documents_are_not_logged() {
        let store = InMemoryDocumentStore::new();
        store.insert("project", json!({"x": 1})).await;
        assert_eq!(store.read("project").await.unwrap(), Some(json!({"x": 1})));
        assert!(store.write_log().await.is_empty());
    }

    #[tokio::test]
    async fn failing_mode_rejects_writes() {
        let store = InMemoryDocumentStore::new();
        store.set_fail_writes(true);
        assert!(store.write("session", &json!({})).await.is_err());
        assert!(store.get("session").await.is_none());
    }
}

// # Memory State Store
//
// In-memory implementation of StateStore.
//
// Nothing survives the process, so a one-shot run gains nothing from it
// beyond a second pass in the same process. It backs engine tests and
// library callers that drive several passes themselves.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store
///
/// Clones share the same map, so a test can keep a handle after moving a
/// clone into an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(&self, key: &str) -> Result<Option<StateRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set_record(&self, key: &str, record: &StateRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

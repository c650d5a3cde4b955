use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use skpush_core::SubscriberRecord;

use crate::error::StoreError;
use crate::traits::SubscriberStore;

/// In-memory subscriber store backed by a concurrent map.
///
/// Used by the test suite and as a local backend when no resource
/// provider is reachable. Last write wins on concurrent updates, which
/// matches the external store's semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, SubscriberRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn list(&self) -> Result<HashMap<String, SubscriberRecord>, StoreError> {
        Ok(self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<SubscriberRecord>, StoreError> {
        Ok(self.data.get(id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, id: &str, record: &SubscriberRecord) -> Result<(), StoreError> {
        self.data.insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.data
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

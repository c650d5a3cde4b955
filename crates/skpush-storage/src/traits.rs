//! The subscriber store contract.

use std::collections::HashMap;

use async_trait::async_trait;
use skpush_core::SubscriberRecord;

use crate::error::StoreError;

/// CRUD access to subscriber records, keyed by subscriber id.
///
/// Implementations must be thread-safe (`Send + Sync`). The engine
/// treats every `list` as a snapshot valid only for one notification's
/// dispatch; concurrent writers follow last-write-wins semantics.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Returns every stored subscriber record.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues; an empty store is
    /// an empty map.
    async fn list(&self) -> Result<HashMap<String, SubscriberRecord>, StoreError>;

    /// Reads a single record. Returns `None` if the subscriber does not
    /// exist.
    async fn get(&self, id: &str) -> Result<Option<SubscriberRecord>, StoreError>;

    /// Creates or replaces a record.
    async fn set(&self, id: &str, record: &SubscriberRecord) -> Result<(), StoreError>;

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subscriber does not exist.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that SubscriberStore is object-safe
    fn _assert_store_object_safe(_: &dyn SubscriberStore) {}
}

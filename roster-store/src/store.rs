//! The store adapter boundary
//!
//! One `DocumentStore` wraps one named collection. Every method is a single
//! delegation to the backing store: no retry, no batching, no transactions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{Fields, Record};

/// Record operations against a single collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Collection name, for logging
    fn collection(&self) -> &str;

    /// Store a new document and return its generated id
    async fn add(&self, fields: Fields) -> Result<String>;

    /// Every document in the collection
    async fn list(&self) -> Result<Vec<Record>>;

    /// Point lookup; `StoreError::NotFound` when the id is absent
    async fn get(&self, id: &str) -> Result<Record>;

    /// Overwrite the submitted top-level fields, leaving the rest untouched.
    ///
    /// Fails with `StoreError::NotFound` when the id is absent.
    async fn update(&self, id: &str, fields: Fields) -> Result<()>;

    /// Remove a document. Deleting an absent id succeeds.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Number of documents in the collection
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

/// Shared handle used by the HTTP layer
pub type SharedStore = Arc<dyn DocumentStore>;

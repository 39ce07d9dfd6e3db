//! In-process document store
//!
//! Same contract as the Firestore adapter, backed by a map behind a
//! `tokio::sync::RwLock`. Used by `roster serve --store memory` and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::record::{Fields, Record};
use crate::store::DocumentStore;

/// Length of generated ids, matching Firestore auto-ids
const AUTO_ID_LEN: usize = 20;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// A set of named in-memory collections
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a named collection. Handles with the same name share state.
    pub fn collection(&self, name: impl Into<String>) -> MemoryCollection {
        MemoryCollection {
            name: name.into(),
            collections: Arc::clone(&self.collections),
        }
    }
}

/// One collection inside a [`MemoryStore`]
#[derive(Clone)]
pub struct MemoryCollection {
    name: String,
    collections: Arc<RwLock<Collections>>,
}

fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryCollection {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn add(&self, fields: Fields) -> Result<String> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(self.name.clone()).or_default();

        let mut id = auto_id();
        while docs.contains_key(&id) {
            id = auto_id();
        }
        docs.insert(id.clone(), fields);

        debug!(collection = %self.name, %id, "memory add");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let collections = self.collections.read().await;
        let records = collections
            .get(&self.name)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Record> {
        let collections = self.collections.read().await;
        collections
            .get(&self.name)
            .and_then(|docs| docs.get(id))
            .map(|fields| Record::new(id, fields.clone()))
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn update(&self, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(&self.name)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(id))?;

        for (key, value) in fields {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&self.name) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(&self.name).map_or(0, BTreeMap::len))
    }
}

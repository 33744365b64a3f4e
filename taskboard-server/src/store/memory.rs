//! In-memory document store.
//!
//! [`MemoryStore`] keeps every collection in a map guarded by a [`RwLock`].
//! Queries are evaluated in process with [`Query::apply`]. Contents are lost
//! on restart.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::query::timestamp;
use super::{CREATED_AT_FIELD, Collection, Document, DocumentStore, ID_FIELD, Query, StoreError};

/// Collection name -> (document id -> document).
type Collections = HashMap<Collection, BTreeMap<String, Document>>;

/// Thread-safe in-process [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map_or(0, BTreeMap::len)
    }
}

fn not_found(collection: Collection, id: &str) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Document, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    async fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(docs.values().cloned()))
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        let matching = collections
            .get(&collection)
            .map_or(0, |docs| docs.values().filter(|d| query.matches(d)).count());
        Ok(u64::try_from(matching).unwrap_or(u64::MAX))
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Document,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                collection,
                id: id.to_string(),
            });
        }

        fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        if !fields.contains_key(CREATED_AT_FIELD) {
            fields.insert(CREATED_AT_FIELD.to_string(), timestamp(Utc::now()));
        }
        docs.insert(id.to_string(), fields.clone());
        drop(collections);

        Ok(fields)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;

        for (key, value) in fields {
            if key == ID_FIELD || key == CREATED_AT_FIELD {
                continue;
            }
            doc.insert(key, value);
        }
        let updated = doc.clone();
        drop(collections);

        Ok(updated)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}

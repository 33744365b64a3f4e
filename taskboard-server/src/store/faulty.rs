//! Test double that fails writes to chosen ids.

use std::collections::HashSet;

use super::memory::MemoryStore;
use super::{Collection, Document, DocumentStore, Query, StoreError};

/// [`MemoryStore`] whose `update` and `delete` fail for the listed ids.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    failing_updates: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail_update(mut self, id: &str) -> Self {
        self.failing_updates.insert(id.to_string());
        self
    }

    #[must_use]
    pub fn fail_delete(mut self, id: &str) -> Self {
        self.failing_deletes.insert(id.to_string());
        self
    }

    fn injected(operation: &str, id: &str) -> StoreError {
        StoreError::Backend(format!("injected {operation} failure for {id}"))
    }
}

impl DocumentStore for FaultyStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Document, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection, query).await
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        self.inner.count(collection, query).await
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<Document, StoreError> {
        self.inner.create(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<Document, StoreError> {
        if self.failing_updates.contains(id) {
            return Err(Self::injected("update", id));
        }
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        if self.failing_deletes.contains(id) {
            return Err(Self::injected("delete", id));
        }
        self.inner.delete(collection, id).await
    }
}

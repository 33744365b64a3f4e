//! Timeout-bounded store wrapper.
//!
//! [`TimedStore`] bounds every call to the inner store. A timed-out read is
//! retried up to `read_retries` more times; a timed-out write is surfaced at
//! once, since it may already have been applied.

use std::future::Future;
use std::time::Duration;

use super::{Collection, Document, DocumentStore, Query, StoreError};

/// Wraps a [`DocumentStore`] with per-call timeouts.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
    read_retries: u32,
}

impl<S: DocumentStore> TimedStore<S> {
    #[must_use]
    pub const fn new(inner: S, timeout: Duration, read_retries: u32) -> Self {
        Self {
            inner,
            timeout,
            read_retries,
        }
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn read<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => return result,
                Err(_) if attempt < self.read_retries => {
                    attempt += 1;
                    tracing::warn!(operation, attempt, "store read timed out, retrying");
                }
                Err(_) => {
                    tracing::error!(operation, "store read timed out, giving up");
                    return Err(StoreError::Timeout {
                        operation,
                        after: self.timeout,
                    });
                }
            }
        }
    }

    async fn write<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, call).await.unwrap_or_else(|_| {
            tracing::error!(operation, "store write timed out");
            Err(StoreError::Timeout {
                operation,
                after: self.timeout,
            })
        })
    }
}

impl<S: DocumentStore> DocumentStore for TimedStore<S> {
    async fn get(&self, collection: Collection, id: &str) -> Result<Document, StoreError> {
        let inner = &self.inner;
        self.read("get", move || inner.get(collection, id)).await
    }

    async fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = &self.inner;
        self.read("list", move || inner.list(collection, query)).await
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        let inner = &self.inner;
        self.read("count", move || inner.count(collection, query)).await
    }

    async fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<Document, StoreError> {
        self.write("create", self.inner.create(collection, id, fields))
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<Document, StoreError> {
        self.write("update", self.inner.update(collection, id, fields))
            .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.write("delete", self.inner.delete(collection, id)).await
    }
}

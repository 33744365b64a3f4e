//! Document store abstraction.
//!
//! Defines the [`DocumentStore`] trait every persistence backend must satisfy,
//! the [`Collection`]s the service uses, and typed helpers over [`Record`]s.
//! Concrete implementations:
//! - [`memory::MemoryStore`]: in-process store used by the binary and tests
//! - [`timed::TimedStore`]: wrapper bounding every call with a timeout

#[cfg(test)]
pub(crate) mod faulty;
pub mod memory;
pub mod query;
pub mod record;
pub mod timed;

use std::fmt;
use std::time::Duration;

pub use query::{Order, Predicate, Query};
pub use record::Record;

/// A stored document: a JSON object carrying `$id` and `$createdAt`.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// System field holding the document id.
pub const ID_FIELD: &str = "$id";

/// System field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "$createdAt";

/// The collections of the taskboard database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Workspaces,
    Members,
    Projects,
    Tasks,
    Comments,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspaces => "workspaces",
            Self::Members => "members",
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Comments => "comments",
        }
    }

    /// Singular name of one document, for error messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Workspaces => "workspace",
            Self::Members => "member",
            Self::Projects => "project",
            Self::Tasks => "task",
            Self::Comments => "comment",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by document store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document with the given id exists in the collection.
    #[error("{} {id} not found", .collection.noun())]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Requested id.
        id: String,
    },

    /// A document with the given id already exists.
    #[error("{} {id} already exists", .collection.noun())]
    AlreadyExists {
        /// Target collection.
        collection: Collection,
        /// Conflicting id.
        id: String,
    },

    /// The backend did not answer in time.
    #[error("store operation `{operation}` timed out after {after:?}")]
    Timeout {
        /// Store method that timed out.
        operation: &'static str,
        /// Configured bound.
        after: Duration,
    },

    /// A document could not be converted to or from its record type.
    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether repeating the same read may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Async persistence interface over collections of JSON documents.
///
/// Implementations hold no cross-request locks or transactions: every call
/// is an independent read or write.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    ///
    /// Returns [`StoreError::NotFound`] when the id does not resolve.
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Document, StoreError>> + Send;

    /// List documents matching the query, ordered and limited by it.
    fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> impl std::future::Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Count documents matching the query's predicates (ordering and limit
    /// are ignored).
    fn count(
        &self,
        collection: Collection,
        query: &Query,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Create a document under the given id and return it with system fields.
    ///
    /// A `$createdAt` supplied in `fields` is kept (imports preserve their
    /// original creation time); otherwise the current time is stamped.
    fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> impl std::future::Future<Output = Result<Document, StoreError>> + Send;

    /// Merge `fields` into an existing document and return the result.
    ///
    /// System fields in `fields` are ignored.
    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> impl std::future::Future<Output = Result<Document, StoreError>> + Send;

    /// Delete a document by id.
    fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Generates a fresh, time-ordered document id.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

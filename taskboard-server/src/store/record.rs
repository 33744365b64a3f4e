//! Typed access to documents.
//!
//! Each proto record type is bound to its [`Collection`] through [`Record`],
//! and the helpers below convert between stored documents and records with
//! `serde_json`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use taskboard_proto::model::{Comment, Member, Project, Task, Workspace};

use super::{Collection, Document, DocumentStore, Query, StoreError, new_document_id};

/// A record type persisted in a fixed collection.
pub trait Record: DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

impl Record for Workspace {
    const COLLECTION: Collection = Collection::Workspaces;
}

impl Record for Member {
    const COLLECTION: Collection = Collection::Members;
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
}

impl Record for Comment {
    const COLLECTION: Collection = Collection::Comments;
}

/// Decodes a stored document into a record.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the document does not match the
/// record's shape.
pub fn from_document<R: Record>(document: Document) -> Result<R, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Encodes a serializable value as document fields.
///
/// # Errors
///
/// Returns an error if the value does not serialize to a JSON object.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Backend(format!(
            "expected document fields to be an object, got {other}"
        ))),
    }
}

/// Fetches one record by id.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when the id does not resolve.
pub async fn fetch<R: Record, S: DocumentStore>(store: &S, id: &str) -> Result<R, StoreError> {
    from_document(store.get(R::COLLECTION, id).await?)
}

/// Lists records matching the query.
///
/// # Errors
///
/// Propagates store and decoding failures.
pub async fn find<R: Record, S: DocumentStore>(
    store: &S,
    query: &Query,
) -> Result<Vec<R>, StoreError> {
    store
        .list(R::COLLECTION, query)
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}

/// Returns the first record matching the query, if any.
///
/// # Errors
///
/// Propagates store and decoding failures.
pub async fn find_one<R: Record, S: DocumentStore>(
    store: &S,
    query: Query,
) -> Result<Option<R>, StoreError> {
    let mut found: Vec<R> = find(store, &query.limit(1)).await?;
    Ok(found.pop())
}

/// Creates a record under a fresh id.
///
/// # Errors
///
/// Propagates store and decoding failures.
pub async fn insert<R: Record, S: DocumentStore>(
    store: &S,
    fields: &Value,
) -> Result<R, StoreError> {
    let id = new_document_id();
    from_document(store.create(R::COLLECTION, &id, to_fields(fields)?).await?)
}

/// Merges fields into an existing record and returns the updated record.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when the id does not resolve.
pub async fn patch<R: Record, S: DocumentStore, F: Serialize + Sync + ?Sized>(
    store: &S,
    id: &str,
    fields: &F,
) -> Result<R, StoreError> {
    from_document(store.update(R::COLLECTION, id, to_fields(fields)?).await?)
}

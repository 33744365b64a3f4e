//! Cascade delete.
//!
//! Deletes root documents together with every child document that points at
//! them through a foreign key. Children are removed before their root, so a
//! failure part-way leaves the root (and its remaining children) visible
//! rather than orphaned children. There is no transaction: a failure may
//! leave some children deleted.

use futures_util::future::try_join_all;

use crate::store::{Collection, DocumentStore, ID_FIELD, Query, StoreError};

/// A child collection referencing the root through `foreign_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRelation {
    pub collection: Collection,
    pub foreign_key: &'static str,
}

impl ChildRelation {
    #[must_use]
    pub const fn new(collection: Collection, foreign_key: &'static str) -> Self {
        Self {
            collection,
            foreign_key,
        }
    }
}

/// Counts of deleted documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub roots: usize,
    pub children: usize,
}

/// Deletes every `root` document matching `query` along with its children.
///
/// # Errors
///
/// Returns the first store failure; documents deleted before it stay deleted.
pub async fn cascade_delete<S: DocumentStore>(
    store: &S,
    root: Collection,
    query: &Query,
    children: &[ChildRelation],
) -> Result<CascadeReport, StoreError> {
    let roots = store.list(root, query).await?;
    let mut report = CascadeReport::default();

    for document in roots {
        let Some(root_id) = document.get(ID_FIELD).and_then(|v| v.as_str()) else {
            continue;
        };

        for relation in children {
            let child_query = Query::new().equal(relation.foreign_key, root_id);
            let child_ids: Vec<String> = store
                .list(relation.collection, &child_query)
                .await?
                .iter()
                .filter_map(|child| child.get(ID_FIELD).and_then(|v| v.as_str()))
                .map(str::to_string)
                .collect();

            try_join_all(
                child_ids
                    .iter()
                    .map(|id| store.delete(relation.collection, id)),
            )
            .await?;
            report.children += child_ids.len();
        }

        store.delete(root, root_id).await?;
        report.roots += 1;
        tracing::debug!(
            collection = %root,
            id = root_id,
            "deleted document with its children"
        );
    }

    Ok(report)
}

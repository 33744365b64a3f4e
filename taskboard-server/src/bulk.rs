//! Bulk reorder of tasks across lanes.
//!
//! A reorder batch is validated and authorized as a whole, then every
//! `(status, position)` pair is written independently. The store has no
//! transactions; when some writes fail the batch reports which ids were left
//! behind instead of claiming success.

use std::collections::BTreeSet;

use futures_util::future::join_all;
use serde_json::json;
use taskboard_proto::api::{BulkUpdateRequest, TaskPositionUpdate};
use taskboard_proto::model::Task;

use crate::error::BoardError;
use crate::guard;
use crate::store::{DocumentStore, ID_FIELD, Query, StoreError, record};

/// Applies a reorder batch on behalf of `user_id` and returns the updated
/// tasks in request order.
///
/// # Errors
///
/// - [`BoardError::Validation`] for an empty batch, duplicate ids, an
///   out-of-range position, or tasks spanning several workspaces (including
///   none resolving at all). Nothing is written.
/// - [`BoardError::Unauthorized`] if the caller is not a member of the
///   batch's workspace. Nothing is written.
/// - [`BoardError::NotFound`] if some ids do not resolve. Nothing is written.
/// - [`BoardError::PartialFailure`] if some writes failed.
pub async fn bulk_update<S: DocumentStore>(
    store: &S,
    user_id: &str,
    request: &BulkUpdateRequest,
) -> Result<Vec<Task>, BoardError> {
    request.validate()?;

    let ids = request.task_ids();
    let existing: Vec<Task> =
        record::find(store, &Query::new().one_of(ID_FIELD, ids.iter().cloned())).await?;

    let workspaces: BTreeSet<&str> = existing.iter().map(|t| t.workspace_id.as_str()).collect();
    let Some(workspace_id) = workspaces.first().copied().filter(|_| workspaces.len() == 1) else {
        tracing::debug!(
            user_id,
            workspaces = workspaces.len(),
            "bulk update rejected, tasks do not share one workspace"
        );
        return Err(BoardError::validation(
            "All tasks must belong to the same workspace",
        ));
    };

    guard::require_member(store, workspace_id, user_id).await?;

    if existing.len() != ids.len() {
        let found: BTreeSet<&str> = existing.iter().map(|t| t.id.as_str()).collect();
        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains(id))
            .collect();
        return Err(BoardError::not_found("task", missing.join(", ")));
    }

    let writes = request.tasks.iter().map(|update| write_position(store, update));

    let mut updated = Vec::with_capacity(request.tasks.len());
    let mut failed = Vec::new();
    for (update, result) in request.tasks.iter().zip(join_all(writes).await) {
        match result {
            Ok(task) => updated.push(task),
            Err(e) => {
                tracing::error!(task_id = %update.id, error = %e, "bulk update write failed");
                failed.push(update.id.clone());
            }
        }
    }

    if !failed.is_empty() {
        return Err(BoardError::PartialFailure {
            attempted: request.tasks.len(),
            failed,
        });
    }

    tracing::info!(
        workspace_id,
        user_id,
        count = updated.len(),
        "tasks reordered"
    );
    Ok(updated)
}

async fn write_position<S: DocumentStore>(
    store: &S,
    update: &TaskPositionUpdate,
) -> Result<Task, StoreError> {
    let fields = json!({ "status": update.status, "position": update.position });
    record::patch(store, &update.id, &fields).await
}

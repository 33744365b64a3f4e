//! Position allocation for new tasks.
//!
//! Positions are sparse integers: a task appended to a lane lands
//! [`POSITION_GAP`] after the current highest position, leaving room for
//! manual reordering in between.
//!
//! Allocation is a read followed by a later write with no lock in between.
//! Two concurrent creations in the same lane may receive the same position;
//! ordering is advisory, so this is tolerated.

use taskboard_proto::model::{MIN_POSITION, POSITION_GAP, Task, TaskStatus};

use crate::store::{DocumentStore, Query, StoreError, record};

/// Returns the position for a task appended to the `(workspace, status)` lane.
///
/// An empty lane starts at [`MIN_POSITION`].
///
/// # Errors
///
/// Propagates store failures.
pub async fn next_position<S: DocumentStore>(
    store: &S,
    workspace_id: &str,
    status: TaskStatus,
) -> Result<i64, StoreError> {
    let query = Query::new()
        .equal("workspaceId", workspace_id)
        .equal("status", status.as_str())
        .order_desc("position");
    let highest: Option<Task> = record::find_one(store, query).await?;
    Ok(highest.map_or(MIN_POSITION, |task| {
        task.position.saturating_add(POSITION_GAP)
    }))
}

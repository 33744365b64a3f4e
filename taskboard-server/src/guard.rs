//! Membership guard.
//!
//! Every workspace-scoped operation resolves the caller's membership here
//! first and fails with [`BoardError::Unauthorized`] when there is none.

use taskboard_proto::model::Member;

use crate::error::BoardError;
use crate::store::{DocumentStore, Query, StoreError, record};

/// Looks up the membership of `user_id` in `workspace_id`.
///
/// # Errors
///
/// Propagates store failures.
pub async fn find_member<S: DocumentStore>(
    store: &S,
    workspace_id: &str,
    user_id: &str,
) -> Result<Option<Member>, StoreError> {
    let query = Query::new()
        .equal("workspaceId", workspace_id)
        .equal("userId", user_id);
    record::find_one(store, query).await
}

/// Returns the caller's membership or fails with `Unauthorized`.
///
/// # Errors
///
/// Returns [`BoardError::Unauthorized`] if the user is not a member.
pub async fn require_member<S: DocumentStore>(
    store: &S,
    workspace_id: &str,
    user_id: &str,
) -> Result<Member, BoardError> {
    find_member(store, workspace_id, user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(workspace_id, user_id, "membership check failed");
            BoardError::Unauthorized
        })
}

/// Returns the caller's membership if it carries the `ADMIN` role.
///
/// # Errors
///
/// Returns [`BoardError::Unauthorized`] if the user is not a member or is
/// not an admin.
pub async fn require_admin<S: DocumentStore>(
    store: &S,
    workspace_id: &str,
    user_id: &str,
) -> Result<Member, BoardError> {
    let member = require_member(store, workspace_id, user_id).await?;
    if !member.is_admin() {
        tracing::debug!(workspace_id, user_id, "admin role required");
        return Err(BoardError::Unauthorized);
    }
    Ok(member)
}

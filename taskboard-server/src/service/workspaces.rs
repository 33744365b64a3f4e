//! Workspace operations: creation, settings, invite codes, joining,
//! cascade deletion and analytics.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::{Map, Value, json};
use taskboard_proto::analytics::AnalyticsSnapshot;
use taskboard_proto::api::{
    CreateWorkspaceRequest, DocumentList, DocumentRef, JoinWorkspaceRequest,
    UpdateSettingsRequest, WorkspaceInfo,
};
use taskboard_proto::model::{Member, MemberRole, User, Workspace};

use crate::analytics::{AnalyticsScope, compute_analytics};
use crate::cascade::{ChildRelation, cascade_delete};
use crate::error::BoardError;
use crate::guard;
use crate::state::BoardState;
use crate::store::{CREATED_AT_FIELD, Collection, DocumentStore, ID_FIELD, Query, record};

/// Everything owned by a workspace, deleted leaf-first. Memberships go last
/// so an interrupted delete can be retried by the same admin.
const WORKSPACE_CHILDREN: [ChildRelation; 4] = [
    ChildRelation::new(Collection::Comments, "workspaceId"),
    ChildRelation::new(Collection::Tasks, "workspaceId"),
    ChildRelation::new(Collection::Projects, "workspaceId"),
    ChildRelation::new(Collection::Members, "workspaceId"),
];

/// Generates a random alphanumeric invite code.
#[must_use]
pub fn generate_invite_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

impl<S: DocumentStore> BoardState<S> {
    /// Creates a workspace and makes the creator its admin.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for a blank name or a malformed
    /// image.
    pub async fn create_workspace(
        &self,
        user: &User,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, BoardError> {
        request.validate()?;
        let image_url = self.images.upload(request.image.as_deref())?;

        let workspace: Workspace = record::insert(
            self.store.as_ref(),
            &json!({
                "name": request.name.trim(),
                "userId": user.id,
                "imageUrl": image_url,
                "inviteCode": generate_invite_code(self.invite_code_length),
            }),
        )
        .await?;

        let _: Member = record::insert(
            self.store.as_ref(),
            &json!({
                "workspaceId": workspace.id,
                "userId": user.id,
                "role": MemberRole::Admin,
            }),
        )
        .await?;

        tracing::info!(workspace_id = %workspace.id, user_id = %user.id, "workspace created");
        Ok(workspace)
    }

    /// Lists the workspaces the user belongs to, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_workspaces(
        &self,
        user: &User,
    ) -> Result<DocumentList<Workspace>, BoardError> {
        let memberships: Vec<Member> = record::find(
            self.store.as_ref(),
            &Query::new().equal("userId", user.id.as_str()),
        )
        .await?;
        if memberships.is_empty() {
            return Ok(DocumentList::new(Vec::new()));
        }

        let query = Query::new()
            .one_of(ID_FIELD, memberships.into_iter().map(|m| m.workspace_id))
            .order_desc(CREATED_AT_FIELD);
        let workspaces = record::find(self.store.as_ref(), &query).await?;
        Ok(DocumentList::new(workspaces))
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members.
    pub async fn get_workspace(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> Result<Workspace, BoardError> {
        guard::require_member(self.store.as_ref(), workspace_id, &user.id).await?;
        Ok(record::fetch(self.store.as_ref(), workspace_id).await?)
    }

    /// Public view of a workspace for the join page. Membership is not
    /// required.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown workspace.
    pub async fn workspace_info(&self, workspace_id: &str) -> Result<WorkspaceInfo, BoardError> {
        let workspace: Workspace = record::fetch(self.store.as_ref(), workspace_id).await?;
        Ok(WorkspaceInfo {
            id: workspace.id,
            name: workspace.name,
            image_url: workspace.image_url,
        })
    }

    /// Changes the name and/or image. An empty image removes it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] unless the caller is an admin.
    pub async fn update_workspace(
        &self,
        user: &User,
        workspace_id: &str,
        request: &UpdateSettingsRequest,
    ) -> Result<Workspace, BoardError> {
        request.validate()?;
        guard::require_admin(self.store.as_ref(), workspace_id, &user.id).await?;

        let changes = self.settings_changes(request)?;
        let workspace: Workspace =
            record::patch(self.store.as_ref(), workspace_id, &changes).await?;
        tracing::info!(workspace_id, user_id = %user.id, "workspace settings updated");
        Ok(workspace)
    }

    /// Deletes the workspace with all its members, projects, tasks and
    /// comments.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] unless the caller is an admin.
    pub async fn delete_workspace(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> Result<DocumentRef, BoardError> {
        guard::require_admin(self.store.as_ref(), workspace_id, &user.id).await?;

        let report = cascade_delete(
            self.store.as_ref(),
            Collection::Workspaces,
            &Query::new().equal(ID_FIELD, workspace_id),
            &WORKSPACE_CHILDREN,
        )
        .await?;
        if report.roots == 0 {
            return Err(BoardError::not_found("workspace", workspace_id));
        }

        tracing::info!(
            workspace_id,
            user_id = %user.id,
            children = report.children,
            "workspace deleted"
        );
        Ok(DocumentRef {
            id: workspace_id.to_string(),
        })
    }

    /// Replaces the invite code, invalidating the old one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] unless the caller is an admin.
    pub async fn reset_invite_code(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> Result<Workspace, BoardError> {
        guard::require_admin(self.store.as_ref(), workspace_id, &user.id).await?;
        let workspace: Workspace = record::patch(
            self.store.as_ref(),
            workspace_id,
            &json!({ "inviteCode": generate_invite_code(self.invite_code_length) }),
        )
        .await?;
        tracing::info!(workspace_id, user_id = %user.id, "invite code reset");
        Ok(workspace)
    }

    /// Joins the workspace as a regular member.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] if the user already is a member or
    /// the code does not match exactly.
    pub async fn join_workspace(
        &self,
        user: &User,
        workspace_id: &str,
        request: &JoinWorkspaceRequest,
    ) -> Result<Workspace, BoardError> {
        if guard::find_member(self.store.as_ref(), workspace_id, &user.id)
            .await?
            .is_some()
        {
            tracing::debug!(workspace_id, user_id = %user.id, "join rejected, already a member");
            return Err(BoardError::validation("Already a member"));
        }

        let workspace: Workspace = record::fetch(self.store.as_ref(), workspace_id).await?;
        if workspace.invite_code != request.code {
            tracing::debug!(workspace_id, user_id = %user.id, "join rejected, invalid invite code");
            return Err(BoardError::validation("Invalid invite code"));
        }

        let _: Member = record::insert(
            self.store.as_ref(),
            &json!({
                "workspaceId": workspace_id,
                "userId": user.id,
                "role": MemberRole::Member,
            }),
        )
        .await?;

        tracing::info!(workspace_id, user_id = %user.id, "user joined workspace");
        Ok(workspace)
    }

    /// Month-over-month analytics for the whole workspace.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members.
    pub async fn workspace_analytics(
        &self,
        user: &User,
        workspace_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSnapshot, BoardError> {
        let member = guard::require_member(self.store.as_ref(), workspace_id, &user.id).await?;
        Ok(compute_analytics(
            self.store.as_ref(),
            &AnalyticsScope::workspace(workspace_id),
            &member.id,
            now,
        )
        .await?)
    }

    /// Builds the patch for a name/image settings change.
    pub(crate) fn settings_changes(
        &self,
        request: &UpdateSettingsRequest,
    ) -> Result<Map<String, Value>, BoardError> {
        let mut changes = Map::new();
        if let Some(name) = &request.name {
            changes.insert("name".to_string(), Value::from(name.trim()));
        }
        if let Some(image) = &request.image {
            let image_url = self.images.upload(Some(image))?;
            changes.insert("imageUrl".to_string(), image_url.map_or(Value::Null, Value::from));
        }
        Ok(changes)
    }
}

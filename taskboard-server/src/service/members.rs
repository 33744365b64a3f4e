//! Membership management.

use taskboard_proto::api::{DocumentList, DocumentRef, MemberProfile, UpdateMemberRequest};
use taskboard_proto::model::{Member, MemberRole, User};

use crate::error::BoardError;
use crate::guard;
use crate::state::BoardState;
use crate::store::{CREATED_AT_FIELD, Collection, DocumentStore, Query, record};

impl<S: DocumentStore> BoardState<S> {
    /// Lists a workspace's members with their names and emails, oldest
    /// membership first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members.
    pub async fn list_members(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> Result<DocumentList<MemberProfile>, BoardError> {
        let store = self.store.as_ref();
        guard::require_member(store, workspace_id, &user.id).await?;
        let members: Vec<Member> = record::find(
            store,
            &Query::new()
                .equal("workspaceId", workspace_id)
                .order_asc(CREATED_AT_FIELD),
        )
        .await?;
        Ok(DocumentList::new(
            members.into_iter().map(|m| self.profile(m)).collect(),
        ))
    }

    /// Removes a membership. Admins may remove anyone; members only
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] if the caller may not remove the
    /// member and [`BoardError::Validation`] when it is the workspace's last
    /// member or last admin.
    pub async fn remove_member(
        &self,
        user: &User,
        member_id: &str,
    ) -> Result<DocumentRef, BoardError> {
        let store = self.store.as_ref();
        let target: Member = record::fetch(store, member_id).await?;
        let caller = guard::require_member(store, &target.workspace_id, &user.id).await?;
        if caller.id != target.id && !caller.is_admin() {
            return Err(BoardError::Unauthorized);
        }
        if self.member_count(&target.workspace_id, None).await? <= 1 {
            return Err(BoardError::validation("Cannot remove the only member"));
        }
        if target.is_admin() && self.admin_count(&target.workspace_id).await? <= 1 {
            return Err(BoardError::validation("Cannot remove the only admin"));
        }

        store.delete(Collection::Members, member_id).await?;
        tracing::info!(
            member_id,
            workspace_id = %target.workspace_id,
            removed_by = %user.id,
            "member removed"
        );
        Ok(DocumentRef { id: target.id })
    }

    /// Changes a member's role.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] unless the caller is an admin and
    /// [`BoardError::Validation`] when downgrading the workspace's last
    /// member or last admin.
    pub async fn update_member_role(
        &self,
        user: &User,
        member_id: &str,
        request: &UpdateMemberRequest,
    ) -> Result<Member, BoardError> {
        let store = self.store.as_ref();
        let target: Member = record::fetch(store, member_id).await?;
        guard::require_admin(store, &target.workspace_id, &user.id).await?;
        if request.role == MemberRole::Member {
            if self.member_count(&target.workspace_id, None).await? <= 1 {
                return Err(BoardError::validation("Cannot downgrade the only member"));
            }
            if target.is_admin() && self.admin_count(&target.workspace_id).await? <= 1 {
                return Err(BoardError::validation("Cannot downgrade the only admin"));
            }
        }

        let fields = serde_json::json!({ "role": request.role });
        let member: Member = record::patch(store, member_id, &fields).await?;
        tracing::info!(
            member_id,
            workspace_id = %member.workspace_id,
            role = member.role.as_str(),
            "member role updated"
        );
        Ok(member)
    }

    /// Counts the workspace's members, optionally only those holding `role`.
    async fn member_count(
        &self,
        workspace_id: &str,
        role: Option<MemberRole>,
    ) -> Result<u64, BoardError> {
        let mut query = Query::new().equal("workspaceId", workspace_id);
        if let Some(role) = role {
            query = query.equal("role", role.as_str());
        }
        Ok(self.store.count(Collection::Members, &query).await?)
    }

    async fn admin_count(&self, workspace_id: &str) -> Result<u64, BoardError> {
        self.member_count(workspace_id, Some(MemberRole::Admin)).await
    }
}

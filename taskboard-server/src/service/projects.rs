//! Project operations.

use chrono::{DateTime, Utc};
use serde_json::json;
use taskboard_proto::analytics::AnalyticsSnapshot;
use taskboard_proto::api::{CreateProjectRequest, DocumentList, DocumentRef, UpdateSettingsRequest};
use taskboard_proto::model::{Project, User};

use crate::analytics::{AnalyticsScope, compute_analytics};
use crate::cascade::cascade_delete;
use crate::error::BoardError;
use crate::guard;
use crate::service::TASK_CHILDREN;
use crate::state::BoardState;
use crate::store::{CREATED_AT_FIELD, Collection, DocumentStore, Query, record};

impl<S: DocumentStore> BoardState<S> {
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members of the target
    /// workspace and [`BoardError::Validation`] for a blank name or a
    /// malformed image.
    pub async fn create_project(
        &self,
        user: &User,
        request: &CreateProjectRequest,
    ) -> Result<Project, BoardError> {
        request.validate()?;
        let store = self.store.as_ref();
        guard::require_member(store, &request.workspace_id, &user.id).await?;
        let image_url = self.images.upload(request.image.as_deref())?;

        let project: Project = record::insert(
            store,
            &json!({
                "workspaceId": request.workspace_id,
                "name": request.name.trim(),
                "imageUrl": image_url,
            }),
        )
        .await?;

        tracing::info!(
            project_id = %project.id,
            workspace_id = %project.workspace_id,
            "project created"
        );
        Ok(project)
    }

    /// Lists a workspace's projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members.
    pub async fn list_projects(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> Result<DocumentList<Project>, BoardError> {
        let store = self.store.as_ref();
        guard::require_member(store, workspace_id, &user.id).await?;
        let projects = record::find(
            store,
            &Query::new()
                .equal("workspaceId", workspace_id)
                .order_desc(CREATED_AT_FIELD),
        )
        .await?;
        Ok(DocumentList::new(projects))
    }

    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown project and
    /// [`BoardError::Unauthorized`] for non-members of its workspace.
    pub async fn get_project(&self, user: &User, project_id: &str) -> Result<Project, BoardError> {
        let store = self.store.as_ref();
        let project: Project = record::fetch(store, project_id).await?;
        guard::require_member(store, &project.workspace_id, &user.id).await?;
        Ok(project)
    }

    /// # Errors
    ///
    /// Same as [`Self::get_project`], plus [`BoardError::Validation`] for
    /// invalid settings.
    pub async fn update_project(
        &self,
        user: &User,
        project_id: &str,
        request: &UpdateSettingsRequest,
    ) -> Result<Project, BoardError> {
        request.validate()?;
        let existing = self.get_project(user, project_id).await?;
        let changes = self.settings_changes(request)?;
        let project: Project = record::patch(self.store.as_ref(), project_id, &changes).await?;
        tracing::info!(project_id, workspace_id = %existing.workspace_id, "project updated");
        Ok(project)
    }

    /// Deletes the project along with its tasks and their comments.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_project`].
    pub async fn delete_project(
        &self,
        user: &User,
        project_id: &str,
    ) -> Result<DocumentRef, BoardError> {
        let project = self.get_project(user, project_id).await?;
        let store = self.store.as_ref();

        let report = cascade_delete(
            store,
            Collection::Tasks,
            &Query::new().equal("projectId", project_id),
            &TASK_CHILDREN,
        )
        .await?;
        store.delete(Collection::Projects, project_id).await?;

        tracing::info!(
            project_id,
            workspace_id = %project.workspace_id,
            tasks = report.roots,
            comments = report.children,
            "project deleted"
        );
        Ok(DocumentRef { id: project.id })
    }

    /// Month-over-month analytics restricted to one project.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_project`].
    pub async fn project_analytics(
        &self,
        user: &User,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSnapshot, BoardError> {
        let store = self.store.as_ref();
        let project: Project = record::fetch(store, project_id).await?;
        let member = guard::require_member(store, &project.workspace_id, &user.id).await?;
        Ok(compute_analytics(
            store,
            &AnalyticsScope::project(project.workspace_id, project.id),
            &member.id,
            now,
        )
        .await?)
    }
}

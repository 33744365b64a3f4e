//! `/projects` handlers.

use axum::extract::{Path, State};
use chrono::Utc;
use taskboard_proto::analytics::AnalyticsSnapshot;
use taskboard_proto::api::{
    CreateProjectRequest, DocumentList, DocumentRef, UpdateSettingsRequest, WorkspaceScope,
};
use taskboard_proto::model::Project;

use super::extract::{ApiJson, ApiQuery};
use super::{ApiResult, ok};
use crate::identity::CurrentUser;
use crate::state::BoardState;
use crate::store::DocumentStore;

pub async fn list<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(scope): ApiQuery<WorkspaceScope>,
) -> ApiResult<DocumentList<Project>> {
    ok(state.list_projects(&user, &scope.workspace_id).await?)
}

pub async fn create<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> ApiResult<Project> {
    ok(state.create_project(&user, &request).await?)
}

pub async fn get<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<Project> {
    ok(state.get_project(&user, &project_id).await?)
}

pub async fn update<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<UpdateSettingsRequest>,
) -> ApiResult<Project> {
    ok(state.update_project(&user, &project_id, &request).await?)
}

pub async fn remove<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<DocumentRef> {
    ok(state.delete_project(&user, &project_id).await?)
}

pub async fn analytics<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<String>,
) -> ApiResult<AnalyticsSnapshot> {
    ok(state.project_analytics(&user, &project_id, Utc::now()).await?)
}

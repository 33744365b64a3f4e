//! `/workspaces` handlers.

use axum::extract::{Path, State};
use chrono::Utc;
use taskboard_proto::analytics::AnalyticsSnapshot;
use taskboard_proto::api::{
    CreateWorkspaceRequest, DocumentList, DocumentRef, JoinWorkspaceRequest,
    UpdateSettingsRequest, WorkspaceInfo,
};
use taskboard_proto::model::Workspace;

use super::extract::ApiJson;
use super::{ApiResult, ok};
use crate::identity::CurrentUser;
use crate::state::BoardState;
use crate::store::DocumentStore;

pub async fn list<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<DocumentList<Workspace>> {
    ok(state.list_workspaces(&user).await?)
}

pub async fn create<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateWorkspaceRequest>,
) -> ApiResult<Workspace> {
    ok(state.create_workspace(&user, &request).await?)
}

pub async fn get<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
) -> ApiResult<Workspace> {
    ok(state.get_workspace(&user, &workspace_id).await?)
}

/// Session required, membership not.
pub async fn info<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(_user): CurrentUser,
    Path(workspace_id): Path<String>,
) -> ApiResult<WorkspaceInfo> {
    ok(state.workspace_info(&workspace_id).await?)
}

pub async fn update<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
    ApiJson(request): ApiJson<UpdateSettingsRequest>,
) -> ApiResult<Workspace> {
    ok(state.update_workspace(&user, &workspace_id, &request).await?)
}

pub async fn remove<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
) -> ApiResult<DocumentRef> {
    ok(state.delete_workspace(&user, &workspace_id).await?)
}

pub async fn reset_invite_code<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
) -> ApiResult<Workspace> {
    ok(state.reset_invite_code(&user, &workspace_id).await?)
}

pub async fn join<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
    ApiJson(request): ApiJson<JoinWorkspaceRequest>,
) -> ApiResult<Workspace> {
    ok(state.join_workspace(&user, &workspace_id, &request).await?)
}

pub async fn analytics<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(workspace_id): Path<String>,
) -> ApiResult<AnalyticsSnapshot> {
    ok(state
        .workspace_analytics(&user, &workspace_id, Utc::now())
        .await?)
}

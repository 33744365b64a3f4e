//! `/tasks` handlers.

use axum::extract::{Path, State};
use taskboard_proto::api::{
    BulkUpdateRequest, CreateCommentRequest, CreateTaskRequest, DocumentList, DocumentRef,
    PopulatedTask, TaskDetail, TaskListQuery, UpdateTaskRequest,
};
use taskboard_proto::model::{Comment, Task};

use super::extract::{ApiJson, ApiQuery};
use super::{ApiResult, ok};
use crate::identity::CurrentUser;
use crate::state::BoardState;
use crate::store::DocumentStore;

pub async fn list<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(filter): ApiQuery<TaskListQuery>,
) -> ApiResult<DocumentList<PopulatedTask>> {
    ok(state.list_tasks(&user, &filter).await?)
}

pub async fn create<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<Task> {
    ok(state.create_task(&user, &request).await?)
}

pub async fn get<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<TaskDetail> {
    ok(state.get_task(&user, &task_id).await?)
}

pub async fn update<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Task> {
    ok(state.update_task(&user, &task_id, &request).await?)
}

pub async fn remove<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<DocumentRef> {
    ok(state.delete_task(&user, &task_id).await?)
}

pub async fn bulk_update<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<BulkUpdateRequest>,
) -> ApiResult<Vec<Task>> {
    ok(state.bulk_update_tasks(&user, &request).await?)
}

pub async fn create_comment<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path((workspace_id, task_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> ApiResult<Comment> {
    ok(state
        .create_comment(&user, &workspace_id, &task_id, &request)
        .await?)
}

pub async fn delete_comment<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path((workspace_id, task_id, comment_id)): Path<(String, String, String)>,
) -> ApiResult<DocumentRef> {
    ok(state
        .delete_comment(&user, &workspace_id, &task_id, &comment_id)
        .await?)
}

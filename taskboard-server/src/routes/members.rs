//! `/members` handlers.

use axum::extract::{Path, State};
use taskboard_proto::api::{
    DocumentList, DocumentRef, MemberProfile, UpdateMemberRequest, WorkspaceScope,
};
use taskboard_proto::model::Member;

use super::extract::{ApiJson, ApiQuery};
use super::{ApiResult, ok};
use crate::identity::CurrentUser;
use crate::state::BoardState;
use crate::store::DocumentStore;

pub async fn list<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    ApiQuery(scope): ApiQuery<WorkspaceScope>,
) -> ApiResult<DocumentList<MemberProfile>> {
    ok(state.list_members(&user, &scope.workspace_id).await?)
}

pub async fn update<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(member_id): Path<String>,
    ApiJson(request): ApiJson<UpdateMemberRequest>,
) -> ApiResult<Member> {
    ok(state.update_member_role(&user, &member_id, &request).await?)
}

pub async fn remove<S: DocumentStore>(
    State(state): State<BoardState<S>>,
    CurrentUser(user): CurrentUser,
    Path(member_id): Path<String>,
) -> ApiResult<DocumentRef> {
    ok(state.remove_member(&user, &member_id).await?)
}

//! Integration tests for the workspace lifecycle.
//!
//! Covers creation, the public info view, joining with an invite code,
//! invite code reset, member management, project cascade delete and
//! workspace cascade delete.
//!
//! Verification command: `cargo test --test workspace_lifecycle`

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use taskboard_proto::model::User;
use taskboard_server::identity::StaticIdentity;
use taskboard_server::notify::NoopNotifier;
use taskboard_server::routes::create_router;
use taskboard_server::state::BoardState;
use taskboard_server::store::memory::MemoryStore;
use taskboard_server::store::{Collection, DocumentStore, Query};

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let identity = StaticIdentity::new();
    for id in ["alice", "bob", "carol"] {
        identity.insert(
            id,
            User {
                id: format!("u-{id}"),
                name: id.to_string(),
                email: format!("{id}@example.com"),
            },
        );
    }
    let state = BoardState::new(
        MemoryStore::new(),
        Arc::new(identity),
        Arc::new(NoopNotifier),
        8,
    );
    Harness {
        store: Arc::clone(&state.store),
        app: create_router(state),
    }
}

impl Harness {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>) -> (StatusCode, Value,
    ) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self.app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn data(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> Value {
        let (status, json) = self.call(method, uri, token, body).await;
        assert_eq!(status, StatusCode::OK, "unexpected response: {json}");
        json["data"].clone()
    }

    async fn create_workspace(&self, owner: &str, name: &str) -> Value {
        self.data(Method::POST, "/workspaces", owner, Some(json!({ "name": name })))
            .await
    }

    async fn join(&self, user: &str, workspace: &Value, code: &str) -> (StatusCode, Value) {
        let uri = format!("/workspaces/{}/join", workspace["$id"].as_str().unwrap());
        self.call(Method::POST, &uri, user, Some(json!({ "code": code })))
            .await
    }

    async fn count(&self, collection: Collection, workspace_id: &str) -> u64 {
        self.store
            .count(collection, &Query::new().equal("workspaceId", workspace_id))
            .await
            .unwrap()
    }
}

fn id(value: &Value) -> &str {
    value["$id"].as_str().unwrap()
}

// =============================================================================
// Create and join
// =============================================================================

#[tokio::test]
async fn creator_sees_workspace_others_see_only_info() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    assert_eq!(ws["name"], "Acme");
    assert_eq!(ws["userId"], "u-alice");
    assert_eq!(ws["inviteCode"].as_str().unwrap().len(), 8);

    let listed = h.data(Method::GET, "/workspaces", "alice", None).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(h.data(Method::GET, "/workspaces", "bob", None).await["total"], 0);

    let (status, _) = h
        .call(Method::GET, &format!("/workspaces/{}", id(&ws)), "bob", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let info = h
        .data(Method::GET, &format!("/workspaces/{}/info", id(&ws)), "bob", None)
        .await;
    assert_eq!(info, json!({ "$id": id(&ws), "name": "Acme", "imageUrl": null }));
}

#[tokio::test]
async fn wrong_invite_code_never_creates_membership() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let code = ws["inviteCode"].as_str().unwrap();
    let lowercase = code.to_ascii_lowercase();
    let padded = format!("{code} ");

    for wrong in ["", "nope", lowercase.as_str(), padded.as_str()] {
        if wrong == code {
            continue;
        }
        let (status, body) = h.join("bob", &ws, wrong).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid invite code");
    }
    assert_eq!(h.count(Collection::Members, id(&ws)).await, 1);
}

#[tokio::test]
async fn joining_twice_keeps_one_membership() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let code = ws["inviteCode"].as_str().unwrap();

    let (status, joined) = h.join("bob", &ws, code).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["data"]["$id"], id(&ws));

    let (status, body) = h.join("bob", &ws, code).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already a member");

    let bob_memberships = h
        .store
        .count(
            Collection::Members,
            &Query::new().equal("workspaceId", id(&ws)).equal("userId", "u-bob"),
        )
        .await
        .unwrap();
    assert_eq!(bob_memberships, 1);

    let members = h
        .data(Method::GET, &format!("/members?workspaceId={}", id(&ws)), "bob", None)
        .await;
    assert_eq!(members["total"], 2);
    assert_eq!(members["documents"][1]["role"], "MEMBER");
    assert_eq!(members["documents"][1]["name"], "bob");
}

#[tokio::test]
async fn reset_invite_code_invalidates_old_code() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let old_code = ws["inviteCode"].as_str().unwrap();
    let reset_uri = format!("/workspaces/{}/reset-invite-code", id(&ws));

    let (status, _) = h.join("bob", &ws, old_code).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.call(Method::POST, &reset_uri, "bob", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let reset = h.data(Method::POST, &reset_uri, "alice", None).await;
    let new_code = reset["inviteCode"].as_str().unwrap();
    assert_eq!(new_code.len(), 8);

    if new_code != old_code {
        let (status, _) = h.join("carol", &ws, old_code).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, _) = h.join("carol", &ws, new_code).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Members
// =============================================================================

#[tokio::test]
async fn admin_manages_roles_and_members() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let code = ws["inviteCode"].as_str().unwrap();
    h.join("bob", &ws, code).await;
    h.join("carol", &ws, code).await;

    let members = h
        .data(Method::GET, &format!("/members?workspaceId={}", id(&ws)), "alice", None)
        .await;
    let bob = members["documents"][1].clone();
    let carol = members["documents"][2].clone();

    let (status, _) = h
        .call(Method::DELETE, &format!("/members/{}", id(&carol)), "bob", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let promoted = h
        .data(
            Method::PATCH,
            &format!("/members/{}", id(&bob)),
            "alice",
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
    assert_eq!(promoted["role"], "ADMIN");

    h.data(Method::DELETE, &format!("/members/{}", id(&carol)), "bob", None).await;
    assert_eq!(h.count(Collection::Members, id(&ws)).await, 2);

    let alice = members["documents"][0].clone();
    let demote = json!({ "role": "MEMBER" });
    let uri = format!("/members/{}", id(&bob));
    h.data(Method::PATCH, &uri, "alice", Some(demote.clone())).await;

    let uri = format!("/members/{}", id(&alice));
    let (status, body) = h.call(Method::PATCH, &uri, "alice", Some(demote)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot downgrade the only admin");
    let (status, _) = h.call(Method::DELETE, &uri, "alice", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Cascade delete
// =============================================================================

#[tokio::test]
async fn deleting_project_removes_its_tasks_and_comments() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let ws_id = id(&ws);
    let members = h
        .data(Method::GET, &format!("/members?workspaceId={ws_id}"), "alice", None)
        .await;
    let member_id = id(&members["documents"][0]).to_string();

    let mut projects = Vec::new();
    for name in ["Keep", "Drop"] {
        let project = h
            .data(
                Method::POST,
                "/projects",
                "alice",
                Some(json!({ "name": name, "workspaceId": ws_id })),
            )
            .await;
        let task = h
            .data(
                Method::POST,
                "/tasks",
                "alice",
                Some(json!({
                    "name": format!("{name} task"),
                    "status": "TODO",
                    "priority": "LOW",
                    "workspaceId": ws_id,
                    "projectId": id(&project),
                    "assigneeId": member_id,
                    "dueDate": "2030-01-01T00:00:00Z",
                })),
            )
            .await;
        h.data(
            Method::POST,
            &format!("/tasks/{ws_id}/tasks/{}/comments", id(&task)),
            "alice",
            Some(json!({ "text": "note" })),
        )
        .await;
        projects.push(project);
    }

    h.data(Method::DELETE, &format!("/projects/{}", id(&projects[1])), "alice", None)
        .await;

    assert_eq!(h.count(Collection::Projects, ws_id).await, 1);
    assert_eq!(h.count(Collection::Tasks, ws_id).await, 1);
    assert_eq!(h.count(Collection::Comments, ws_id).await, 1);
    let listed = h
        .data(Method::GET, &format!("/projects?workspaceId={ws_id}"), "alice", None)
        .await;
    assert_eq!(listed["documents"][0]["name"], "Keep");
}

#[tokio::test]
async fn deleting_workspace_leaves_nothing_behind() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    let other = h.create_workspace("alice", "Other").await;
    let ws_id = id(&ws);
    h.join("bob", &ws, ws["inviteCode"].as_str().unwrap()).await;

    for workspace_id in [ws_id, id(&other)] {
        let members = h
            .data(Method::GET, &format!("/members?workspaceId={workspace_id}"), "alice", None)
            .await;
        let project = h
            .data(
                Method::POST,
                "/projects",
                "alice",
                Some(json!({ "name": "P", "workspaceId": workspace_id })),
            )
            .await;
        let task = h
            .data(
                Method::POST,
                "/tasks",
                "alice",
                Some(json!({
                    "name": "T",
                    "status": "BACKLOG",
                    "priority": "MEDIUM",
                    "workspaceId": workspace_id,
                    "projectId": id(&project),
                    "assigneeId": id(&members["documents"][0]),
                    "dueDate": "2030-01-01T00:00:00Z",
                })),
            )
            .await;
        h.data(
            Method::POST,
            &format!("/tasks/{workspace_id}/tasks/{}/comments", id(&task)),
            "alice",
            Some(json!({ "text": "hello" })),
        )
        .await;
    }

    let (status, _) = h
        .call(Method::DELETE, &format!("/workspaces/{ws_id}"), "bob", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let deleted = h
        .data(Method::DELETE, &format!("/workspaces/{ws_id}"), "alice", None)
        .await;
    assert_eq!(deleted, json!({ "$id": ws_id }));

    for collection in [
        Collection::Members,
        Collection::Projects,
        Collection::Tasks,
        Collection::Comments,
    ] {
        assert_eq!(h.count(collection, ws_id).await, 0, "{collection} left behind");
        assert_eq!(h.count(collection, id(&other)).await, 1);
    }
    assert_eq!(h.store.len(Collection::Workspaces).await, 1);

    let (status, _) = h
        .call(Method::GET, &format!("/workspaces/{ws_id}"), "alice", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settings_update_is_admin_only() {
    let h = harness();
    let ws = h.create_workspace("alice", "Acme").await;
    h.join("bob", &ws, ws["inviteCode"].as_str().unwrap()).await;
    let uri = format!("/workspaces/{}", id(&ws));

    let (status, _) = h
        .call(Method::PATCH, &uri, "bob", Some(json!({ "name": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let updated = h
        .data(Method::PATCH, &uri, "alice", Some(json!({ "name": "Acme Inc", "image": "aGk=" })))
        .await;
    assert_eq!(updated["name"], "Acme Inc");
    assert_eq!(updated["imageUrl"], "data:image/png;base64,aGk=");
}

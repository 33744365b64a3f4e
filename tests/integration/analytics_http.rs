//! Integration tests for workspace and project analytics.
//!
//! Tasks are written straight into the store with fixed creation times so
//! the calendar windows are deterministic.
//!
//! Verification command: `cargo test --test analytics_http`

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use taskboard_proto::analytics::{AnalyticsSnapshot, MetricDelta};
use taskboard_proto::api::{CreateProjectRequest, CreateWorkspaceRequest};
use taskboard_proto::model::{Project, User, Workspace};
use taskboard_server::guard;
use taskboard_server::identity::StaticIdentity;
use taskboard_server::notify::NoopNotifier;
use taskboard_server::routes::create_router;
use taskboard_server::state::BoardState;
use taskboard_server::store::memory::MemoryStore;
use taskboard_server::store::query::timestamp;
use taskboard_server::store::record::to_fields;
use taskboard_server::store::{Collection, DocumentStore, new_document_id};

// =============================================================================
// Helpers
// =============================================================================

fn user(id: &str) -> User {
    User {
        id: format!("u-{id}"),
        name: id.to_string(),
        email: format!("{id}@example.com"),
    }
}

fn state() -> BoardState<MemoryStore> {
    let identity = StaticIdentity::new();
    for id in ["alice", "bob"] {
        identity.insert(id, user(id));
    }
    BoardState::new(MemoryStore::new(), Arc::new(identity), Arc::new(NoopNotifier), 6)
}

struct Board {
    state: BoardState<MemoryStore>,
    workspace: Workspace,
    project: Project,
    member_id: String,
}

async fn board() -> Board {
    let state = state();
    let alice = user("alice");
    let workspace = state
        .create_workspace(
            &alice,
            &CreateWorkspaceRequest {
                name: "Acme".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
    let project = state
        .create_project(
            &alice,
            &CreateProjectRequest {
                name: "Launch".to_string(),
                workspace_id: workspace.id.clone(),
                image: None,
            },
        )
        .await
        .unwrap();
    let member_id = guard::require_member(state.store.as_ref(), &workspace.id, &alice.id)
        .await
        .unwrap()
        .id;
    Board {
        state,
        workspace,
        project,
        member_id,
    }
}

impl Board {
    async fn put_task(
        &self,
        created: DateTime<Utc>,
        status: &str,
        due: DateTime<Utc>,
        project_id: &str,
    ) {
        self.state
            .store
            .create(
                Collection::Tasks,
                &new_document_id(),
                to_fields(&json!({
                    "$createdAt": timestamp(created),
                    "name": "task",
                    "status": status,
                    "priority": "MEDIUM",
                    "workspaceId": self.workspace.id,
                    "projectId": project_id,
                    "assigneeId": self.member_id,
                    "position": 1000,
                    "dueDate": timestamp(due),
                }))
                .unwrap(),
            )
            .await
            .unwrap();
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = create_router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

// =============================================================================
// Calendar scenario
// =============================================================================

#[tokio::test]
async fn march_2024_scenario() {
    let b = board().await;
    let project = b.project.id.clone();
    b.put_task(day(2024, 3, 5), "DONE", day(2024, 3, 30), &project).await;
    b.put_task(day(2024, 3, 20), "TODO", day(2024, 3, 1), &project).await;
    b.put_task(day(2024, 2, 10), "DONE", day(2024, 2, 15), &project).await;

    let snapshot = b
        .state
        .workspace_analytics(&user("alice"), &b.workspace.id, day(2024, 3, 25))
        .await
        .unwrap();

    assert_eq!(snapshot.tasks, MetricDelta { count: 2, difference: 1 });
    assert_eq!(snapshot.completed, MetricDelta { count: 1, difference: 0 });
    assert_eq!(snapshot.overdue, MetricDelta { count: 1, difference: 1 });
    assert_eq!(snapshot.incomplete, MetricDelta { count: 1, difference: 1 });
    assert_eq!(snapshot.assigned, MetricDelta { count: 2, difference: 1 });
}

#[tokio::test]
async fn empty_workspace_reports_zeroes() {
    let b = board().await;
    let snapshot = b
        .state
        .workspace_analytics(&user("alice"), &b.workspace.id, day(2024, 3, 25))
        .await
        .unwrap();
    assert_eq!(snapshot, AnalyticsSnapshot::default());
}

#[tokio::test]
async fn tasks_outside_both_windows_are_ignored() {
    let b = board().await;
    let project = b.project.id.clone();
    b.put_task(day(2024, 1, 31), "TODO", day(2024, 2, 1), &project).await;
    b.put_task(day(2024, 4, 1), "TODO", day(2024, 2, 1), &project).await;

    let snapshot = b
        .state
        .workspace_analytics(&user("alice"), &b.workspace.id, day(2024, 3, 25))
        .await
        .unwrap();
    assert_eq!(snapshot, AnalyticsSnapshot::default());
}

#[tokio::test]
async fn project_analytics_ignore_other_projects() {
    let b = board().await;
    let project = b.project.id.clone();
    b.put_task(day(2024, 3, 5), "DONE", day(2024, 3, 30), &project).await;
    b.put_task(day(2024, 3, 6), "DONE", day(2024, 3, 30), "other-project").await;

    let snapshot = b
        .state
        .project_analytics(&user("alice"), &project, day(2024, 3, 25))
        .await
        .unwrap();
    assert_eq!(snapshot.tasks, MetricDelta { count: 1, difference: 1 });
    assert_eq!(snapshot.completed.count, 1);
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn analytics_endpoint_reports_current_month() {
    let b = board().await;
    let project = b.project.id.clone();
    let now = Utc::now();
    let this_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .unwrap();
    let last_month = this_month - Duration::days(1);

    b.put_task(this_month, "DONE", now + Duration::days(30), &project).await;
    b.put_task(this_month, "TODO", this_month - Duration::days(1), &project).await;
    b.put_task(last_month, "DONE", last_month, &project).await;

    let (status, body) = b
        .get(&format!("/workspaces/{}/analytics", b.workspace.id), "alice")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "tasks": { "count": 2, "difference": 1 },
            "assigned": { "count": 2, "difference": 1 },
            "incomplete": { "count": 1, "difference": 1 },
            "completed": { "count": 1, "difference": 0 },
            "overdue": { "count": 1, "difference": 1 },
        })
    );

    let (status, body) = b
        .get(&format!("/projects/{project}/analytics"), "alice")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tasks"]["count"], 2);
}

#[tokio::test]
async fn analytics_require_membership() {
    let b = board().await;
    let (status, body) = b
        .get(&format!("/workspaces/{}/analytics", b.workspace.id), "bob")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = b
        .get(&format!("/projects/{}/analytics", b.project.id), "bob")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

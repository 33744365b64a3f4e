//! HTTP surface.
//!
//! Every response body is an [`Envelope`]: `{ "data": ... }` on success,
//! `{ "error": ... }` otherwise. Every route except `/health` requires a
//! bearer session token.

pub mod extract;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod workspaces;

use std::net::SocketAddr;

use axum::{Json, Router};
use axum::routing::{delete, get, patch, post};
use serde_json::{Value, json};
use taskboard_proto::envelope::Envelope;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::error::BoardError;
use crate::state::BoardState;
use crate::store::DocumentStore;

/// Handler result: enveloped data or an enveloped error.
pub type ApiResult<T> = Result<Json<Envelope<T>>, BoardError>;

/// Wraps a successful payload.
pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::data(data)))
}

/// Builds the API router over any document store.
pub fn create_router<S>(state: BoardState<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        // Tasks
        .route("/tasks", get(tasks::list::<S>).post(tasks::create::<S>))
        .route("/tasks/bulk-update", post(tasks::bulk_update::<S>))
        // Path params at one depth must share a name; handlers extract
        // them by position.
        .route(
            "/tasks/{id}",
            get(tasks::get::<S>)
                .patch(tasks::update::<S>)
                .delete(tasks::remove::<S>),
        )
        .route(
            "/tasks/{id}/tasks/{task_id}/comments",
            post(tasks::create_comment::<S>),
        )
        .route(
            "/tasks/{id}/tasks/{task_id}/comments/{comment_id}",
            delete(tasks::delete_comment::<S>),
        )
        // Workspaces
        .route(
            "/workspaces",
            get(workspaces::list::<S>).post(workspaces::create::<S>),
        )
        .route(
            "/workspaces/{workspace_id}",
            get(workspaces::get::<S>)
                .patch(workspaces::update::<S>)
                .delete(workspaces::remove::<S>),
        )
        .route("/workspaces/{workspace_id}/info", get(workspaces::info::<S>))
        .route(
            "/workspaces/{workspace_id}/reset-invite-code",
            post(workspaces::reset_invite_code::<S>),
        )
        .route("/workspaces/{workspace_id}/join", post(workspaces::join::<S>))
        .route(
            "/workspaces/{workspace_id}/analytics",
            get(workspaces::analytics::<S>),
        )
        // Projects
        .route(
            "/projects",
            get(projects::list::<S>).post(projects::create::<S>),
        )
        .route(
            "/projects/{project_id}",
            get(projects::get::<S>)
                .patch(projects::update::<S>)
                .delete(projects::remove::<S>),
        )
        .route(
            "/projects/{project_id}/analytics",
            get(projects::analytics::<S>),
        )
        // Members
        .route("/members", get(members::list::<S>))
        .route(
            "/members/{member_id}",
            patch(members::update::<S>).delete(members::remove::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Envelope<Value>> {
    Json(Envelope::data(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Starts the server with a pre-built [`BoardState`].
///
/// Binds to `addr` (use port 0 for an OS-assigned port) and returns the bound
/// address and the serve task's handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state<S>(
    addr: &str,
    state: BoardState<S>,
) -> Result<(SocketAddr, JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>>
where
    S: DocumentStore + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "taskboard server error");
        }
    });

    Ok((bound_addr, handle))
}

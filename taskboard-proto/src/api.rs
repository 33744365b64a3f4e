//! Request and response bodies of the taskboard JSON API.
//!
//! Requests carry their own validation ([`CreateTaskRequest::validate`],
//! [`BulkUpdateRequest::validate`], ...) so the server can reject malformed
//! input before touching the store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Comment, MAX_POSITION, MIN_POSITION, Member, MemberRole, Project, Task, TaskPriority,
    TaskStatus,
};

/// Maximum length of a task, project or workspace name in characters.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of a comment body in characters.
pub const MAX_COMMENT_LENGTH: usize = 4096;

/// Request validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    #[error("{0} is required")]
    Required(&'static str),
    /// A text field exceeds its maximum length.
    #[error("{field} is too long (max {max} characters)")]
    TooLong {
        /// Offending field.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },
    /// A bulk reorder position is outside the allowed range.
    #[error("position {0} is out of range ({MIN_POSITION}..={MAX_POSITION})")]
    PositionOutOfRange(i64),
    /// A bulk reorder request listed no tasks.
    #[error("at least one task is required")]
    EmptyBatch,
    /// A bulk reorder request listed the same task twice.
    #[error("task {0} is listed more than once")]
    DuplicateTask(String),
}

fn check_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Checks that a caller-supplied position lies in `[MIN_POSITION, MAX_POSITION]`.
///
/// # Errors
///
/// Returns [`ValidationError::PositionOutOfRange`] otherwise.
pub fn check_position(position: i64) -> Result<(), ValidationError> {
    if position < MIN_POSITION || position > MAX_POSITION {
        return Err(ValidationError::PositionOutOfRange(position));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Body of `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub name: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub workspace_id: String,
    pub project_id: String,
    pub due_date: DateTime<Utc>,
    pub assignee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateTaskRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_name("name", &self.name)
    }
}

/// Body of `PATCH /tasks/{task_id}`. The workspace of a task is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateTaskRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a supplied name is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => check_name("name", name),
            None => Ok(()),
        }
    }
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub workspace_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search: Option<String>,
}

/// One entry of a bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPositionUpdate {
    #[serde(rename = "$id")]
    pub id: String,
    pub status: TaskStatus,
    pub position: i64,
}

/// Body of `POST /tasks/bulk-update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub tasks: Vec<TaskPositionUpdate>,
}

impl BulkUpdateRequest {
    /// Checks every entry before any write happens.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyBatch`] for an empty list,
    /// [`ValidationError::PositionOutOfRange`] for the first entry whose
    /// position is outside the allowed range, and
    /// [`ValidationError::DuplicateTask`] when an id appears twice.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tasks.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for update in &self.tasks {
            check_position(update.position)?;
            if !seen.insert(update.id.as_str()) {
                return Err(ValidationError::DuplicateTask(update.id.clone()));
            }
        }
        Ok(())
    }

    /// Task ids referenced by the batch, in request order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|update| update.id.clone()).collect()
    }
}

/// Body of `POST /tasks/{workspace_id}/tasks/{task_id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

impl CreateCommentRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the text is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::Required("text"));
        }
        if self.text.chars().count() > MAX_COMMENT_LENGTH {
            return Err(ValidationError::TooLong {
                field: "text",
                max: MAX_COMMENT_LENGTH,
            });
        }
        Ok(())
    }
}

/// A member joined with the identity provider's view of the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    #[serde(flatten)]
    pub member: Member,
    pub name: String,
    pub email: String,
}

/// A task joined with its project and assignee for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulatedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub assignee: Option<MemberProfile>,
}

/// `GET /tasks/{task_id}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub project: Option<Project>,
    pub assignee: Option<MemberProfile>,
    pub comments: DocumentList<Comment>,
    /// The caller's user id, so clients can tell their own comments apart.
    pub user_id: String,
}

/// A page of documents with the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentList<T> {
    pub total: usize,
    pub documents: Vec<T>,
}

impl<T> DocumentList<T> {
    #[must_use]
    pub fn new(documents: Vec<T>) -> Self {
        Self {
            total: documents.len(),
            documents,
        }
    }
}

/// Identifier of a deleted (or otherwise referenced) document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "$id")]
    pub id: String,
}

// ---------------------------------------------------------------------------
// Workspaces, projects, members
// ---------------------------------------------------------------------------

/// Body of `POST /workspaces`.
///
/// `image` is base64-encoded image bytes; an empty string means no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreateWorkspaceRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_name("name", &self.name)
    }
}

/// Body of `PATCH /workspaces/{id}` and `PATCH /projects/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UpdateSettingsRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a supplied name is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => check_name("name", name),
            None => Ok(()),
        }
    }
}

/// Body of `POST /workspaces/{id}/join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWorkspaceRequest {
    pub code: String,
}

/// Public view of a workspace shown on the join page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub workspace_id: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreateProjectRequest {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank or too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_name("name", &self.name)
    }
}

/// Query string of `GET /projects` and `GET /members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceScope {
    pub workspace_id: String,
}

/// Body of `PATCH /members/{member_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: MemberRole,
}

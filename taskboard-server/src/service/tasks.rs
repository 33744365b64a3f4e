//! Task operations: listing with joins, detail view, create, update, delete,
//! bulk reorder and comments.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value, json};
use taskboard_proto::api::{
    BulkUpdateRequest, CreateCommentRequest, CreateTaskRequest, DocumentList, DocumentRef,
    PopulatedTask, TaskDetail, TaskListQuery, UpdateTaskRequest,
};
use taskboard_proto::model::{Comment, Member, Project, Task, User};

use crate::bulk;
use crate::cascade::cascade_delete;
use crate::error::BoardError;
use crate::guard;
use crate::notify::NotificationKind;
use crate::position::next_position;
use crate::service::TASK_CHILDREN;
use crate::state::BoardState;
use crate::store::query::timestamp;
use crate::store::{CREATED_AT_FIELD, Collection, DocumentStore, ID_FIELD, Query, record};

fn list_query(filter: &TaskListQuery) -> Query {
    let mut query = Query::new().equal("workspaceId", filter.workspace_id.as_str());
    if let Some(project_id) = &filter.project_id {
        query = query.equal("projectId", project_id.as_str());
    }
    if let Some(assignee_id) = &filter.assignee_id {
        query = query.equal("assigneeId", assignee_id.as_str());
    }
    if let Some(status) = filter.status {
        query = query.equal("status", status.as_str());
    }
    if let Some(priority) = filter.priority {
        query = query.equal("priority", priority.as_str());
    }
    if let Some(due_date) = filter.due_date {
        query = query.equal("dueDate", timestamp(due_date));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.search("name", search);
    }
    query.order_desc(CREATED_AT_FIELD)
}

impl<S: DocumentStore> BoardState<S> {
    /// Lists a workspace's tasks, newest first, each joined with its project
    /// and assignee.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members.
    pub async fn list_tasks(
        &self,
        user: &User,
        filter: &TaskListQuery,
    ) -> Result<DocumentList<PopulatedTask>, BoardError> {
        let store = self.store.as_ref();
        guard::require_member(store, &filter.workspace_id, &user.id).await?;

        let tasks: Vec<Task> = record::find(store, &list_query(filter)).await?;

        let project_ids: BTreeSet<&str> = tasks.iter().map(|t| t.project_id.as_str()).collect();
        let assignee_ids: BTreeSet<&str> = tasks.iter().map(|t| t.assignee_id.as_str()).collect();

        let projects: HashMap<String, Project> = if project_ids.is_empty() {
            HashMap::new()
        } else {
            record::find::<Project, _>(store, &Query::new().one_of(ID_FIELD, project_ids))
                .await?
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect()
        };
        let assignees: HashMap<String, Member> = if assignee_ids.is_empty() {
            HashMap::new()
        } else {
            record::find::<Member, _>(store, &Query::new().one_of(ID_FIELD, assignee_ids))
                .await?
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect()
        };

        let documents = tasks
            .into_iter()
            .map(|task| PopulatedTask {
                project: projects.get(&task.project_id).cloned(),
                assignee: assignees
                    .get(&task.assignee_id)
                    .cloned()
                    .map(|member| self.profile(member)),
                task,
            })
            .collect();
        Ok(DocumentList::new(documents))
    }

    /// Fetches one task with its project, assignee and comments.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown task and
    /// [`BoardError::Unauthorized`] for non-members of its workspace.
    pub async fn get_task(&self, user: &User, task_id: &str) -> Result<TaskDetail, BoardError> {
        let store = self.store.as_ref();
        let task: Task = record::fetch(store, task_id).await?;
        guard::require_member(store, &task.workspace_id, &user.id).await?;

        let project: Option<Project> =
            record::find_one(store, Query::new().equal(ID_FIELD, task.project_id.as_str())).await?;
        let assignee: Option<Member> =
            record::find_one(store, Query::new().equal(ID_FIELD, task.assignee_id.as_str())).await?;
        let comments: Vec<Comment> = record::find(
            store,
            &Query::new()
                .equal("taskId", task.id.as_str())
                .order_asc(CREATED_AT_FIELD),
        )
        .await?;

        Ok(TaskDetail {
            task,
            project,
            assignee: assignee.map(|member| self.profile(member)),
            comments: DocumentList::new(comments),
            user_id: user.id.clone(),
        })
    }

    /// Creates a task at the end of its lane and notifies the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members and
    /// [`BoardError::Validation`] for a blank name or a project or assignee
    /// from another workspace.
    pub async fn create_task(
        &self,
        user: &User,
        request: &CreateTaskRequest,
    ) -> Result<Task, BoardError> {
        request.validate()?;
        let store = self.store.as_ref();
        guard::require_member(store, &request.workspace_id, &user.id).await?;
        self.project_in(&request.workspace_id, &request.project_id).await?;
        self.member_in(&request.workspace_id, &request.assignee_id).await?;

        let position = next_position(store, &request.workspace_id, request.status).await?;
        let mut fields = json!({
            "name": request.name.trim(),
            "status": request.status,
            "priority": request.priority,
            "workspaceId": request.workspace_id,
            "projectId": request.project_id,
            "assigneeId": request.assignee_id,
            "dueDate": timestamp(request.due_date),
            "position": position,
        });
        if let (Some(description), Some(map)) = (&request.description, fields.as_object_mut()) {
            map.insert("description".to_string(), Value::from(description.as_str()));
        }
        let task: Task = record::insert(store, &fields).await?;

        tracing::info!(
            task_id = %task.id,
            workspace_id = %task.workspace_id,
            status = %task.status,
            position,
            "task created"
        );
        self.notify_assignee(NotificationKind::TaskAssigned, &task).await;
        Ok(task)
    }

    /// Applies a partial update. The task's workspace never changes.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown task,
    /// [`BoardError::Unauthorized`] for non-members of its workspace and
    /// [`BoardError::Validation`] for invalid fields.
    pub async fn update_task(
        &self,
        user: &User,
        task_id: &str,
        request: &UpdateTaskRequest,
    ) -> Result<Task, BoardError> {
        request.validate()?;
        let store = self.store.as_ref();
        let existing: Task = record::fetch(store, task_id).await?;
        guard::require_member(store, &existing.workspace_id, &user.id).await?;
        if let Some(project_id) = &request.project_id {
            self.project_in(&existing.workspace_id, project_id).await?;
        }
        if let Some(assignee_id) = &request.assignee_id {
            self.member_in(&existing.workspace_id, assignee_id).await?;
        }

        let changes = update_fields(request);
        let task: Task = record::patch(store, task_id, &changes).await?;

        tracing::info!(
            task_id,
            workspace_id = %task.workspace_id,
            fields = changes.len(),
            "task updated"
        );
        self.notify_assignee(NotificationKind::TaskUpdated, &task).await;
        Ok(task)
    }

    /// Deletes a task and its comments.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] for an unknown task and
    /// [`BoardError::Unauthorized`] for non-members of its workspace.
    pub async fn delete_task(&self, user: &User, task_id: &str) -> Result<DocumentRef, BoardError> {
        let store = self.store.as_ref();
        let task: Task = record::fetch(store, task_id).await?;
        guard::require_member(store, &task.workspace_id, &user.id).await?;

        let report = cascade_delete(
            store,
            Collection::Tasks,
            &Query::new().equal(ID_FIELD, task_id),
            &TASK_CHILDREN,
        )
        .await?;

        tracing::info!(
            task_id,
            workspace_id = %task.workspace_id,
            comments = report.children,
            "task deleted"
        );
        Ok(DocumentRef { id: task.id })
    }

    /// Reorders tasks; see [`bulk::bulk_update`].
    ///
    /// # Errors
    ///
    /// See [`bulk::bulk_update`].
    pub async fn bulk_update_tasks(
        &self,
        user: &User,
        request: &BulkUpdateRequest,
    ) -> Result<Vec<Task>, BoardError> {
        bulk::bulk_update(self.store.as_ref(), &user.id, request).await
    }

    /// Adds a comment by the caller and notifies the task's assignee.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members,
    /// [`BoardError::NotFound`] for an unknown task (or one in another
    /// workspace) and [`BoardError::Validation`] for blank text.
    pub async fn create_comment(
        &self,
        user: &User,
        workspace_id: &str,
        task_id: &str,
        request: &CreateCommentRequest,
    ) -> Result<Comment, BoardError> {
        request.validate()?;
        let store = self.store.as_ref();
        guard::require_member(store, workspace_id, &user.id).await?;

        let task: Task = record::fetch(store, task_id).await?;
        if task.workspace_id != workspace_id {
            return Err(BoardError::not_found("task", task_id));
        }

        let comment: Comment = record::insert(
            store,
            &json!({
                "workspaceId": workspace_id,
                "taskId": task_id,
                "userId": user.id,
                "userName": user.display_name(),
                "text": request.text.trim(),
            }),
        )
        .await?;

        tracing::info!(comment_id = %comment.id, task_id, workspace_id, "comment added");
        self.notify_assignee(NotificationKind::CommentAdded, &task).await;
        Ok(comment)
    }

    /// Deletes a comment and returns the id of its task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unauthorized`] for non-members and
    /// [`BoardError::NotFound`] unless the comment belongs to the task.
    pub async fn delete_comment(
        &self,
        user: &User,
        workspace_id: &str,
        task_id: &str,
        comment_id: &str,
    ) -> Result<DocumentRef, BoardError> {
        let store = self.store.as_ref();
        guard::require_member(store, workspace_id, &user.id).await?;

        let comment: Comment = record::fetch(store, comment_id).await?;
        if comment.task_id != task_id || comment.workspace_id != workspace_id {
            return Err(BoardError::not_found("comment", comment_id));
        }
        store.delete(Collection::Comments, comment_id).await?;

        tracing::info!(comment_id, task_id, workspace_id, "comment deleted");
        Ok(DocumentRef {
            id: task_id.to_string(),
        })
    }
}

fn update_fields(request: &UpdateTaskRequest) -> Map<String, Value> {
    let mut changes = Map::new();
    let mut set = |key: &str, value: Value| {
        changes.insert(key.to_string(), value);
    };
    if let Some(name) = &request.name {
        set("name", Value::from(name.trim()));
    }
    if let Some(status) = request.status {
        set("status", Value::from(status.as_str()));
    }
    if let Some(priority) = request.priority {
        set("priority", Value::from(priority.as_str()));
    }
    if let Some(project_id) = &request.project_id {
        set("projectId", Value::from(project_id.as_str()));
    }
    if let Some(due_date) = request.due_date {
        set("dueDate", timestamp(due_date));
    }
    if let Some(assignee_id) = &request.assignee_id {
        set("assigneeId", Value::from(assignee_id.as_str()));
    }
    if let Some(description) = &request.description {
        set("description", Value::from(description.as_str()));
    }
    changes
}

//! Board operations.
//!
//! Each resource's operations are methods on [`BoardState`]: they take the
//! authenticated [`User`](taskboard_proto::model::User) explicitly, check
//! membership and validate input before writing, and return proto records.

pub mod members;
pub mod projects;
pub mod tasks;
pub mod workspaces;

use taskboard_proto::api::MemberProfile;
use taskboard_proto::model::{Member, Project, Task};

use crate::cascade::ChildRelation;
use crate::error::BoardError;
use crate::notify::{Notification, NotificationKind};
use crate::state::BoardState;
use crate::store::{Collection, DocumentStore, record};

/// Documents removed together with a task.
pub(crate) const TASK_CHILDREN: [ChildRelation; 1] =
    [ChildRelation::new(Collection::Comments, "taskId")];

impl<S: DocumentStore> BoardState<S> {
    /// Joins a member with the user's name and email.
    ///
    /// Users unknown to the identity provider keep the member with empty
    /// profile fields.
    pub(crate) fn profile(&self, member: Member) -> MemberProfile {
        let (name, email) = self
            .identity
            .user(&member.user_id)
            .map(|user| (user.display_name().to_string(), user.email))
            .unwrap_or_default();
        MemberProfile {
            member,
            name,
            email,
        }
    }

    /// Fetches a project and checks it belongs to `workspace_id`.
    pub(crate) async fn project_in(
        &self,
        workspace_id: &str,
        project_id: &str,
    ) -> Result<Project, BoardError> {
        let project: Project = record::fetch(self.store.as_ref(), project_id).await?;
        if project.workspace_id != workspace_id {
            return Err(BoardError::validation(
                "Project does not belong to this workspace",
            ));
        }
        Ok(project)
    }

    /// Fetches a member and checks it belongs to `workspace_id`.
    pub(crate) async fn member_in(
        &self,
        workspace_id: &str,
        member_id: &str,
    ) -> Result<Member, BoardError> {
        let member: Member = record::fetch(self.store.as_ref(), member_id).await?;
        if member.workspace_id != workspace_id {
            return Err(BoardError::validation(
                "Assignee is not a member of this workspace",
            ));
        }
        Ok(member)
    }

    /// Tells the task's assignee about a change.
    ///
    /// Never fails: an unresolvable assignee is logged and skipped.
    pub(crate) async fn notify_assignee(&self, kind: NotificationKind, task: &Task) {
        let assignee: Result<Member, _> =
            record::fetch(self.store.as_ref(), &task.assignee_id).await;
        let recipient = match assignee {
            Ok(member) => member.user_id,
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    assignee_id = %task.assignee_id,
                    error = %e,
                    "notification skipped, assignee not resolvable"
                );
                return;
            }
        };
        let lead = match kind {
            NotificationKind::TaskAssigned => "You have a new task assigned to you",
            NotificationKind::TaskUpdated => "The task has been updated",
            NotificationKind::CommentAdded => "A new comment has been added to your task",
        };
        self.notifier.dispatch(Notification {
            kind,
            recipient,
            workspace_id: task.workspace_id.clone(),
            task_id: task.id.clone(),
            body: format!("{lead}: {}", task.name),
        });
    }
}

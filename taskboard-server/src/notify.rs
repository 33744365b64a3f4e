//! Notification dispatch.
//!
//! Mutations hand a [`Notification`] to a [`Notifier`] and carry on: dispatch
//! is synchronous, never blocks, and never reports failure to the caller.
//! [`ChannelNotifier`] queues onto a bounded channel drained by a background
//! worker that delivers through a [`Mailer`].

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What happened to trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskAssigned,
    TaskUpdated,
    CommentAdded,
}

impl NotificationKind {
    /// Subject line of the delivered message.
    #[must_use]
    pub const fn subject(self) -> &'static str {
        match self {
            Self::TaskAssigned => "New task assigned",
            Self::TaskUpdated => "Task updated",
            Self::CommentAdded => "New comment on your task",
        }
    }
}

/// A message for one user about one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// User id of the recipient.
    pub recipient: String,
    pub workspace_id: String,
    pub task_id: String,
    pub body: String,
}

/// Fire-and-forget sink for notifications.
pub trait Notifier: Send + Sync {
    /// Queues a notification. Must not block and must not fail the caller.
    fn dispatch(&self, notification: Notification);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn dispatch(&self, notification: Notification) {
        tracing::trace!(task_id = %notification.task_id, "notification discarded");
    }
}

/// Delivery failed.
#[derive(Debug, thiserror::Error)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct DeliveryError {
    pub recipient: String,
    pub reason: String,
}

/// Delivers notifications to their recipients.
pub trait Mailer: Send + Sync + 'static {
    fn deliver(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Mailer that writes each notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = notification.kind.subject(),
            workspace_id = %notification.workspace_id,
            task_id = %notification.task_id,
            body = %notification.body,
            "notification delivered"
        );
        Ok(())
    }
}

/// Notifier backed by a bounded queue and a delivery worker.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Spawns the delivery worker on the current runtime.
    ///
    /// The worker stops once every `ChannelNotifier` clone is dropped and the
    /// queue has drained.
    #[must_use]
    pub fn spawn<M: Mailer>(mailer: M, buffer: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Notification>(buffer.max(1));
        let handle = tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                if let Err(e) = mailer.deliver(&notification).await {
                    tracing::warn!(error = %e, "notification delivery failed");
                }
            }
            tracing::debug!("notification worker stopped");
        });
        (Self { sender }, handle)
    }
}

impl Notifier for ChannelNotifier {
    fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.sender.try_send(notification) {
            let reason = match &e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "worker stopped",
            };
            let dropped = e.into_inner();
            tracing::warn!(
                reason,
                recipient = %dropped.recipient,
                task_id = %dropped.task_id,
                "notification dropped"
            );
        }
    }
}

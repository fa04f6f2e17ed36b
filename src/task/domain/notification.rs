//! Notifications emitted by lifecycle transitions.

use super::{NotificationId, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned to the recipient.
    TaskAssigned,
    /// A worker declined a task the recipient created.
    TaskRejected,
    /// A task the recipient created was completed.
    TaskCompleted,
    /// A completion report awaits the recipient's review.
    ReportSubmitted,
    /// The recipient's report was approved.
    TaskApproved,
    /// Free-form system message.
    SystemMessage,
}

impl NotificationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskRejected => "task_rejected",
            Self::TaskCompleted => "task_completed",
            Self::ReportSubmitted => "report_submitted",
            Self::TaskApproved => "task_approved",
            Self::SystemMessage => "system_message",
        }
    }
}

/// A message addressed to one user about one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Addressee.
    pub recipient: UserId,
    /// Category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Task the notification concerns.
    pub related_task: Option<TaskId>,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification about a task.
    #[must_use]
    pub fn about_task(
        recipient: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        task_id: TaskId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            kind,
            title: title.into(),
            message: message.into(),
            related_task: Some(task_id),
            is_read: false,
            created_at: clock.utc(),
        }
    }
}

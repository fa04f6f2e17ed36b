//! Assignment entity binding a task to one worker's attempt.

use super::{AssignmentId, ParseStatusError, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Bound to the worker, work not started.
    Assigned,
    /// The worker declined the task.
    Rejected,
    /// The worker is working on the task.
    InProgress,
    /// The worker submitted a completion report.
    Completed,
    /// An administrator approved the completion report.
    Approved,
    /// Superseded by an administrative edit or cancellation.
    Cancelled,
}

impl AssignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Rejected => "rejected",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when the assignment counts toward the worker's load.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Approved | Self::Cancelled)
    }

    /// Returns `true` when the lifecycle permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Assigned,
                Self::InProgress | Self::Rejected | Self::Completed | Self::Cancelled
            ) | (
                Self::InProgress,
                Self::Rejected | Self::Completed | Self::Cancelled
            ) | (Self::Completed, Self::Approved | Self::Assigned)
        )
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "assigned" => Ok(Self::Assigned),
            "rejected" => Ok(Self::Rejected),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "approved" => Ok(Self::Approved),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError::new("assignment", value)),
        }
    }
}

/// How the assignee was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOrigin {
    /// Selected by the assignment engine.
    Automatic,
    /// Named explicitly by an administrator.
    Manual,
}

impl AssignmentOrigin {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for AssignmentOrigin {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseStatusError::new("assignment origin", value)),
        }
    }
}

/// Validated reason a worker gives for declining a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejectionReason(String);

impl RejectionReason {
    /// Creates a rejection reason no longer than `limit` characters.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyRejectionReason`] for blank input or
    /// [`TaskDomainError::RejectionReasonTooLong`] above the limit.
    pub fn new(value: impl Into<String>, limit: usize) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyRejectionReason);
        }
        let length = trimmed.chars().count();
        if length > limit {
            return Err(TaskDomainError::RejectionReasonTooLong { length, limit });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the reason text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One worker's attempt at a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    task_id: TaskId,
    assignee: UserId,
    assigned_by: UserId,
    origin: AssignmentOrigin,
    status: AssignmentStatus,
    assigned_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    rejection_reason: Option<RejectionReason>,
    completed_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<UserId>,
    cancelled_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssignmentData {
    /// Persisted assignment identifier.
    pub id: AssignmentId,
    /// Task the assignment belongs to.
    pub task_id: TaskId,
    /// Worker bound to the task.
    pub assignee: UserId,
    /// User who made the assignment.
    pub assigned_by: UserId,
    /// Automatic or manual selection.
    pub origin: AssignmentOrigin,
    /// Persisted lifecycle status.
    pub status: AssignmentStatus,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Rejection timestamp.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Reason given on rejection.
    pub rejection_reason: Option<RejectionReason>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Approving administrator.
    pub approved_by: Option<UserId>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Creates a new assignment in the `Assigned` status.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        assignee: UserId,
        assigned_by: UserId,
        origin: AssignmentOrigin,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            task_id,
            assignee,
            assigned_by,
            origin,
            status: AssignmentStatus::Assigned,
            assigned_at: clock.utc(),
            started_at: None,
            rejected_at: None,
            rejection_reason: None,
            completed_at: None,
            approved_at: None,
            approved_by: None,
            cancelled_at: None,
        }
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAssignmentData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            assignee: data.assignee,
            assigned_by: data.assigned_by,
            origin: data.origin,
            status: data.status,
            assigned_at: data.assigned_at,
            started_at: data.started_at,
            rejected_at: data.rejected_at,
            rejection_reason: data.rejection_reason,
            completed_at: data.completed_at,
            approved_at: data.approved_at,
            approved_by: data.approved_by,
            cancelled_at: data.cancelled_at,
        }
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the assigned worker.
    #[must_use]
    pub const fn assignee(&self) -> UserId {
        self.assignee
    }

    /// Returns the user who made the assignment.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns how the assignee was chosen.
    #[must_use]
    pub const fn origin(&self) -> AssignmentOrigin {
        self.origin
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns `true` when the assignment counts toward the worker's load.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the rejection timestamp.
    #[must_use]
    pub const fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    /// Returns the rejection reason, if the worker declined.
    #[must_use]
    pub const fn rejection_reason(&self) -> Option<&RejectionReason> {
        self.rejection_reason.as_ref()
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the approval timestamp.
    #[must_use]
    pub const fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Returns the approving administrator.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Returns the cancellation timestamp.
    #[must_use]
    pub const fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Records that the worker started working.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is `Assigned`.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status != AssignmentStatus::Assigned {
            return Err(self.transition_error(AssignmentStatus::InProgress));
        }
        self.status = AssignmentStatus::InProgress;
        self.started_at = Some(clock.utc());
        Ok(())
    }

    /// Records the worker declining the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is active.
    pub fn reject(
        &mut self,
        reason: RejectionReason,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition(AssignmentStatus::Rejected)?;
        self.rejected_at = Some(clock.utc());
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Records the worker's completion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is active.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(AssignmentStatus::Completed)?;
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Records an administrator's approval of the completion.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is `Completed`.
    pub fn approve(&mut self, approver: UserId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(AssignmentStatus::Approved)?;
        self.approved_at = Some(clock.utc());
        self.approved_by = Some(approver);
        Ok(())
    }

    /// Returns a completed assignment to its worker for correction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is `Completed`.
    pub fn reopen(&mut self) -> Result<(), TaskDomainError> {
        self.transition(AssignmentStatus::Assigned)?;
        self.completed_at = None;
        Ok(())
    }

    /// Supersedes the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignmentTransition`] unless the
    /// assignment is active.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(AssignmentStatus::Cancelled)?;
        self.cancelled_at = Some(clock.utc());
        Ok(())
    }

    fn transition(&mut self, target: AssignmentStatus) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(self.transition_error(target));
        }
        self.status = target;
        Ok(())
    }

    const fn transition_error(&self, target: AssignmentStatus) -> TaskDomainError {
        TaskDomainError::InvalidAssignmentTransition {
            assignment_id: self.id,
            from: self.status,
            to: target,
        }
    }
}

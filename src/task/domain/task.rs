//! Task aggregate root and related task lifecycle types.

use super::{Hours, ParseStatusError, Priority, SkillTier, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has no assignee and waits for one.
    Pending,
    /// Task is bound to a worker who has not started yet.
    Assigned,
    /// The assignee is working on the task.
    InProgress,
    /// The assignee submitted a report and the task awaits review.
    Completed,
    /// An administrator withdrew the task.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when a task in this status must carry an assignee.
    #[must_use]
    pub const fn requires_assignee(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::Completed)
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` when the lifecycle permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Assigned | Self::Cancelled)
                | (
                    Self::Assigned,
                    Self::InProgress | Self::Pending | Self::Completed | Self::Cancelled
                )
                | (
                    Self::InProgress,
                    Self::Pending | Self::Completed | Self::Cancelled
                )
                | (Self::Completed, Self::Assigned)
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError::new("task", value)),
        }
    }
}

/// Validated, editable description of the work a task represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    title: String,
    description: String,
    difficulty: SkillTier,
    deadline: Option<DateTime<Utc>>,
    estimated_hours: Hours,
    priority: Priority,
}

impl TaskDetails {
    /// Creates task details with default effort and priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(title: impl Into<String>, difficulty: SkillTier) -> Result<Self, TaskDomainError> {
        Ok(Self {
            title: normalize_title(title.into())?,
            description: String::new(),
            difficulty,
            deadline: None,
            estimated_hours: Hours::default(),
            priority: Priority::default(),
        })
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the estimated effort.
    #[must_use]
    pub const fn with_estimated_hours(mut self, hours: Hours) -> Self {
        self.estimated_hours = hours;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the required skill tier.
    #[must_use]
    pub const fn difficulty(&self) -> SkillTier {
        self.difficulty
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the estimated effort.
    #[must_use]
    pub const fn estimated_hours(&self) -> Hours {
        self.estimated_hours
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }
}

/// Partial edit applied by an administrator.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement difficulty.
    pub difficulty: Option<SkillTier>,
    /// Replacement deadline; `Some(None)` clears it.
    pub deadline: Option<Option<DateTime<Utc>>>,
    /// Replacement effort estimate.
    pub estimated_hours: Option<Hours>,
    /// Replacement priority.
    pub priority: Option<Priority>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    details: TaskDetails,
    status: TaskStatus,
    created_by: UserId,
    assigned_to: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task details.
    pub details: TaskDetails,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Administrator who created the task.
    pub created_by: UserId,
    /// Current assignee, if any.
    pub assigned_to: Option<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Time of the latest assignment.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Time of the latest completion.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new pending task.
    #[must_use]
    pub fn new(details: TaskDetails, created_by: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            details,
            status: TaskStatus::Pending,
            created_by,
            assigned_to: None,
            created_at: timestamp,
            updated_at: timestamp,
            assigned_at: None,
            completed_at: None,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            details: data.details,
            status: data.status,
            created_by: data.created_by,
            assigned_to: data.assigned_to,
            created_at: data.created_at,
            updated_at: data.updated_at,
            assigned_at: data.assigned_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task details.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.details.title()
    }

    /// Returns the required skill tier.
    #[must_use]
    pub const fn difficulty(&self) -> SkillTier {
        self.details.difficulty
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the administrator who created the task.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the current assignee, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the time of the latest assignment.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns the time of the latest completion.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Applies an administrative edit.
    ///
    /// Returns `true` when the difficulty changed, which invalidates the
    /// current assignee's qualification.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the new title is blank,
    /// or [`TaskDomainError::InvalidTaskTransition`] for cancelled tasks.
    pub fn apply_edit(&mut self, edit: TaskEdit, clock: &impl Clock) -> Result<bool, TaskDomainError> {
        if self.status.is_terminal() {
            return Err(self.transition_error(self.status));
        }
        let title = edit.title.map(normalize_title).transpose()?;
        let previous_difficulty = self.details.difficulty;

        if let Some(new_title) = title {
            self.details.title = new_title;
        }
        if let Some(description) = edit.description {
            self.details.description = description;
        }
        if let Some(difficulty) = edit.difficulty {
            self.details.difficulty = difficulty;
        }
        if let Some(deadline) = edit.deadline {
            self.details.deadline = deadline;
        }
        if let Some(hours) = edit.estimated_hours {
            self.details.estimated_hours = hours;
        }
        if let Some(priority) = edit.priority {
            self.details.priority = priority;
        }
        self.touch(clock);
        Ok(self.details.difficulty != previous_difficulty)
    }

    /// Binds the task to a worker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] unless the task is
    /// pending.
    pub fn assign_to(&mut self, worker: UserId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Assigned, clock)?;
        self.assigned_to = Some(worker);
        self.assigned_at = Some(self.updated_at);
        Ok(())
    }

    /// Clears the assignee and returns the task to the pending pool.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] unless the task is
    /// assigned or in progress.
    pub fn release_assignee(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Pending, clock)?;
        self.assigned_to = None;
        Ok(())
    }

    /// Marks work as started by the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] unless the task is
    /// assigned.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::InProgress, clock)
    }

    /// Marks the task completed pending report review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] unless the task is
    /// assigned or in progress.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Completed, clock)?;
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Reopens a completed task for the same assignee after a rejected
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] unless the task is
    /// completed.
    pub fn reopen_for_correction(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Assigned, clock)?;
        self.completed_at = None;
        Ok(())
    }

    /// Withdraws the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskTransition`] when the task is
    /// completed or already cancelled.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition(TaskStatus::Cancelled, clock)?;
        self.assigned_to = None;
        Ok(())
    }

    fn transition(&mut self, target: TaskStatus, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(self.transition_error(target));
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    const fn transition_error(&self, target: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidTaskTransition {
            task_id: self.id,
            from: self.status,
            to: target,
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn normalize_title(raw: String) -> Result<String, TaskDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

//! Request payloads accepted by [`super::TaskLifecycleService`].

use crate::task::domain::{
    Hours, Priority, ReportId, ReportSubmission, ReviewDecision, SkillTier, TaskDetails,
    TaskDomainError, TaskEdit, TaskId, UserId,
};
use chrono::{DateTime, Utc};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(super) created_by: UserId,
    pub(super) title: String,
    pub(super) difficulty: SkillTier,
    pub(super) description: Option<String>,
    pub(super) deadline: Option<DateTime<Utc>>,
    pub(super) estimated_hours: u32,
    pub(super) priority: u8,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields. Priority defaults to 1
    /// and the effort estimate to one hour.
    #[must_use]
    pub fn new(created_by: UserId, title: impl Into<String>, difficulty: SkillTier) -> Self {
        Self {
            created_by,
            title: title.into(),
            difficulty,
            description: None,
            deadline: None,
            estimated_hours: Hours::ONE.value(),
            priority: Priority::LOWEST.value(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the effort estimate in whole hours.
    #[must_use]
    pub const fn with_estimated_hours(mut self, hours: u32) -> Self {
        self.estimated_hours = hours;
        self
    }

    /// Sets the priority, 1 (lowest) to 5 (highest).
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the creating administrator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    pub(super) fn into_details(self) -> Result<TaskDetails, TaskDomainError> {
        let priority = Priority::new(self.priority)?;
        let hours = Hours::new(self.estimated_hours).ok_or(TaskDomainError::InvalidEstimatedHours)?;
        let mut details = TaskDetails::new(self.title, self.difficulty)?
            .with_priority(priority)
            .with_estimated_hours(hours);
        if let Some(description) = self.description {
            details = details.with_description(description);
        }
        if let Some(deadline) = self.deadline {
            details = details.with_deadline(deadline);
        }
        Ok(details)
    }
}

/// Request payload for a worker declining an assigned task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectTaskRequest {
    pub(super) task_id: TaskId,
    pub(super) worker: UserId,
    pub(super) reason: String,
}

impl RejectTaskRequest {
    /// Creates a rejection request.
    #[must_use]
    pub fn new(task_id: TaskId, worker: UserId, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            worker,
            reason: reason.into(),
        }
    }

    /// Returns the task being declined.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the declining worker.
    #[must_use]
    pub const fn worker(&self) -> UserId {
        self.worker
    }

    /// Returns the free-text reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Request payload for a worker completing a task with a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteTaskRequest {
    pub(super) task_id: TaskId,
    pub(super) worker: UserId,
    pub(super) report_text: String,
    pub(super) hours_worked: u32,
    pub(super) challenges_faced: Option<String>,
    pub(super) solutions_applied: Option<String>,
}

impl CompleteTaskRequest {
    /// Creates a completion request.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        worker: UserId,
        report_text: impl Into<String>,
        hours_worked: u32,
    ) -> Self {
        Self {
            task_id,
            worker,
            report_text: report_text.into(),
            hours_worked,
            challenges_faced: None,
            solutions_applied: None,
        }
    }

    /// Sets the challenges the worker ran into.
    #[must_use]
    pub fn with_challenges(mut self, challenges: impl Into<String>) -> Self {
        self.challenges_faced = Some(challenges.into());
        self
    }

    /// Sets the solutions the worker applied.
    #[must_use]
    pub fn with_solutions(mut self, solutions: impl Into<String>) -> Self {
        self.solutions_applied = Some(solutions.into());
        self
    }

    /// Returns the completed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the completing worker.
    #[must_use]
    pub const fn worker(&self) -> UserId {
        self.worker
    }

    pub(super) fn into_submission(self) -> Result<ReportSubmission, TaskDomainError> {
        let mut submission = ReportSubmission::new(self.report_text, self.hours_worked)?;
        if let Some(challenges) = self.challenges_faced {
            submission = submission.with_challenges(challenges);
        }
        if let Some(solutions) = self.solutions_applied {
            submission = submission.with_solutions(solutions);
        }
        Ok(submission)
    }
}

/// Request payload for an administrator reviewing a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReportRequest {
    pub(super) report_id: ReportId,
    pub(super) reviewer: UserId,
    pub(super) decision: ReviewDecision,
    pub(super) notes: String,
}

impl ReviewReportRequest {
    /// Creates a review request without notes.
    #[must_use]
    pub const fn new(report_id: ReportId, reviewer: UserId, decision: ReviewDecision) -> Self {
        Self {
            report_id,
            reviewer,
            decision,
            notes: String::new(),
        }
    }

    /// Sets the reviewer's notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Returns the reviewed report.
    #[must_use]
    pub const fn report_id(&self) -> ReportId {
        self.report_id
    }

    /// Returns the reviewing administrator.
    #[must_use]
    pub const fn reviewer(&self) -> UserId {
        self.reviewer
    }

    /// Returns the decision.
    #[must_use]
    pub const fn decision(&self) -> ReviewDecision {
        self.decision
    }

    /// Returns the reviewer's notes.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }
}

/// How an edited task should be re-assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reassignment {
    /// Let the assignment engine choose.
    Automatic,
    /// Bind the task to this worker after validating eligibility.
    Manual(UserId),
}

/// Request payload for an administrator editing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub(super) task_id: TaskId,
    pub(super) editor: UserId,
    pub(super) edit: TaskEdit,
    pub(super) reassignment: Option<Reassignment>,
}

impl UpdateTaskRequest {
    /// Creates an edit request that changes nothing yet.
    #[must_use]
    pub fn new(task_id: TaskId, editor: UserId) -> Self {
        Self {
            task_id,
            editor,
            edit: TaskEdit::default(),
            reassignment: None,
        }
    }

    /// Replaces the field edits.
    #[must_use]
    pub fn with_edit(mut self, edit: TaskEdit) -> Self {
        self.edit = edit;
        self
    }

    /// Changes the difficulty.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: SkillTier) -> Self {
        self.edit.difficulty = Some(difficulty);
        self
    }

    /// Requests re-assignment.
    #[must_use]
    pub const fn with_reassignment(mut self, reassignment: Reassignment) -> Self {
        self.reassignment = Some(reassignment);
        self
    }

    /// Returns the edited task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the editing administrator.
    #[must_use]
    pub const fn editor(&self) -> UserId {
        self.editor
    }

    /// Returns the field edits.
    #[must_use]
    pub const fn edit(&self) -> &TaskEdit {
        &self.edit
    }

    /// Returns the requested re-assignment, if any.
    #[must_use]
    pub const fn reassignment(&self) -> Option<Reassignment> {
        self.reassignment
    }
}

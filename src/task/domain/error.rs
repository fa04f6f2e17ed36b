//! Error types for task domain validation, transitions, and parsing.

use super::{
    AssignmentId, AssignmentStatus, ReportId, ReportStatus, TaskId, TaskStatus, UserId,
};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The priority is outside the accepted range.
    #[error("invalid priority {0}, expected a value between 1 and 5")]
    InvalidPriority(u8),

    /// The estimated effort is zero.
    #[error("estimated hours must be a positive integer")]
    InvalidEstimatedHours,

    /// The report text is empty after trimming.
    #[error("report text must not be empty")]
    EmptyReportText,

    /// The reported hours are zero.
    #[error("hours worked must be a positive integer")]
    InvalidHoursWorked,

    /// The rejection reason is empty after trimming.
    #[error("rejection reason must not be empty")]
    EmptyRejectionReason,

    /// The rejection reason exceeds the configured limit.
    #[error("rejection reason is {length} characters long, limit is {limit}")]
    RejectionReasonTooLong {
        /// Submitted reason length in characters.
        length: usize,
        /// Accepted maximum length in characters.
        limit: usize,
    },

    /// A worker profile was configured without capacity.
    #[error("worker {0} must accept at least one concurrent task")]
    InvalidMaxTasks(UserId),

    /// The task lifecycle does not permit the requested transition.
    #[error("task {task_id} cannot move from {} to {}", from.as_str(), to.as_str())]
    InvalidTaskTransition {
        /// Task that rejected the transition.
        task_id: TaskId,
        /// Status before the attempted transition.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The assignment lifecycle does not permit the requested transition.
    #[error("assignment {assignment_id} cannot move from {} to {}", from.as_str(), to.as_str())]
    InvalidAssignmentTransition {
        /// Assignment that rejected the transition.
        assignment_id: AssignmentId,
        /// Status before the attempted transition.
        from: AssignmentStatus,
        /// Requested status.
        to: AssignmentStatus,
    },

    /// The report has already left the pending review state.
    #[error("report {report_id} was already reviewed ({})", status.as_str())]
    ReportAlreadyReviewed {
        /// Reviewed report.
        report_id: ReportId,
        /// Current review status.
        status: ReportStatus,
    },
}

/// Error returned while parsing skill tiers from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown skill tier: {0}")]
pub struct ParseSkillTierError(pub String);

/// Error returned while parsing any lifecycle status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    /// Which status family failed to parse.
    pub kind: &'static str,
    /// The rejected raw value.
    pub value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

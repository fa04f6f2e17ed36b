//! Domain model for task assignment and lifecycle management.
//!
//! The task domain models tasks, the assignments that bind them to workers,
//! completion reports, and worker capacity, keeping every infrastructure
//! concern outside of the domain boundary.

mod assignment;
mod error;
mod ids;
mod notification;
mod report;
mod task;
mod tier;
mod worker;

pub use assignment::{
    Assignment, AssignmentOrigin, AssignmentStatus, PersistedAssignmentData, RejectionReason,
};
pub use error::{ParseSkillTierError, ParseStatusError, TaskDomainError};
pub use ids::{AssignmentId, Hours, NotificationId, Priority, ReportId, TaskId, UserId};
pub use notification::{Notification, NotificationKind};
pub use report::{
    PersistedReportData, Report, ReportFilter, ReportStatus, ReportSubmission, ReviewDecision,
};
pub use task::{PersistedTaskData, Task, TaskDetails, TaskEdit, TaskStatus};
pub use tier::SkillTier;
pub use worker::{
    DEFAULT_MAX_TASKS, Ineligibility, PersistedWorkerData, WorkerCandidate, WorkerCounter,
    WorkerProfile, WorkerStats,
};

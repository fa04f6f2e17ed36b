//! Conversions between domain aggregates and Diesel rows.

use super::models::{AssignmentRow, ReportRow, TaskRow, WorkerProfileChanges, WorkerRow};
use crate::task::domain::{
    Assignment, AssignmentId, AssignmentOrigin, AssignmentStatus, Hours, ParseSkillTierError,
    ParseStatusError, PersistedAssignmentData, PersistedReportData, PersistedTaskData,
    PersistedWorkerData, Priority, RejectionReason, Report, ReportId, ReportStatus,
    ReportSubmission, SkillTier, Task, TaskDetails, TaskDomainError, TaskId, TaskStatus, UserId,
    WorkerProfile, WorkerStats,
};
use thiserror::Error;

/// Errors raised when a stored row cannot be represented in the domain, or
/// a domain value does not fit its column.
#[derive(Debug, Error)]
pub enum RowConversionError {
    /// Stored values fail domain validation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// A stored status is unknown.
    #[error(transparent)]
    Status(#[from] ParseStatusError),
    /// A stored skill tier is unknown.
    #[error(transparent)]
    Tier(#[from] ParseSkillTierError),
    /// A numeric value does not fit its column or domain type.
    #[error("value out of range for column {column}")]
    OutOfRange {
        /// Offending column.
        column: &'static str,
    },
}

fn fit<T, S>(column: &'static str, value: S) -> Result<T, RowConversionError>
where
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| RowConversionError::OutOfRange { column })
}

/// Converts a task into its row.
pub fn task_to_row(task: &Task) -> Result<TaskRow, RowConversionError> {
    let details = task.details();
    Ok(TaskRow {
        id: task.id().into_inner(),
        title: details.title().to_owned(),
        description: details.description().to_owned(),
        difficulty: details.difficulty().as_str().to_owned(),
        deadline: details.deadline(),
        estimated_hours: fit("estimated_hours", details.estimated_hours().value())?,
        priority: i16::from(details.priority().value()),
        status: task.status().as_str().to_owned(),
        created_by: task.created_by().into_inner(),
        assigned_to: task.assigned_to().map(UserId::into_inner),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        assigned_at: task.assigned_at(),
        completed_at: task.completed_at(),
    })
}

/// Rebuilds a task from its row.
pub fn row_to_task(row: TaskRow) -> Result<Task, RowConversionError> {
    let TaskRow {
        id,
        title,
        description,
        difficulty,
        deadline,
        estimated_hours,
        priority,
        status,
        created_by,
        assigned_to,
        created_at,
        updated_at,
        assigned_at,
        completed_at,
    } = row;

    let hours = Hours::new(fit("estimated_hours", estimated_hours)?)
        .ok_or(TaskDomainError::InvalidEstimatedHours)?;
    let mut details = TaskDetails::new(title, SkillTier::try_from(difficulty.as_str())?)?
        .with_description(description)
        .with_estimated_hours(hours)
        .with_priority(Priority::new(fit("priority", priority)?)?);
    if let Some(when) = deadline {
        details = details.with_deadline(when);
    }

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        details,
        status: TaskStatus::try_from(status.as_str())?,
        created_by: UserId::from_uuid(created_by),
        assigned_to: assigned_to.map(UserId::from_uuid),
        created_at,
        updated_at,
        assigned_at,
        completed_at,
    }))
}

/// Converts an assignment into its row.
pub fn assignment_to_row(assignment: &Assignment) -> AssignmentRow {
    AssignmentRow {
        id: assignment.id().into_inner(),
        task_id: assignment.task_id().into_inner(),
        assignee: assignment.assignee().into_inner(),
        assigned_by: assignment.assigned_by().into_inner(),
        origin: assignment.origin().as_str().to_owned(),
        status: assignment.status().as_str().to_owned(),
        assigned_at: assignment.assigned_at(),
        started_at: assignment.started_at(),
        rejected_at: assignment.rejected_at(),
        rejection_reason: assignment
            .rejection_reason()
            .map(|reason| reason.as_str().to_owned()),
        completed_at: assignment.completed_at(),
        approved_at: assignment.approved_at(),
        approved_by: assignment.approved_by().map(UserId::into_inner),
        cancelled_at: assignment.cancelled_at(),
    }
}

/// Rebuilds an assignment from its row.
///
/// Stored reasons were validated on the way in, so no length limit is
/// re-applied.
pub fn row_to_assignment(row: AssignmentRow) -> Result<Assignment, RowConversionError> {
    let rejection_reason = row
        .rejection_reason
        .map(|reason| RejectionReason::new(reason, usize::MAX))
        .transpose()?;
    Ok(Assignment::from_persisted(PersistedAssignmentData {
        id: AssignmentId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        assignee: UserId::from_uuid(row.assignee),
        assigned_by: UserId::from_uuid(row.assigned_by),
        origin: AssignmentOrigin::try_from(row.origin.as_str())?,
        status: AssignmentStatus::try_from(row.status.as_str())?,
        assigned_at: row.assigned_at,
        started_at: row.started_at,
        rejected_at: row.rejected_at,
        rejection_reason,
        completed_at: row.completed_at,
        approved_at: row.approved_at,
        approved_by: row.approved_by.map(UserId::from_uuid),
        cancelled_at: row.cancelled_at,
    }))
}

/// Converts a report into its row.
pub fn report_to_row(report: &Report) -> Result<ReportRow, RowConversionError> {
    let submission = report.submission();
    Ok(ReportRow {
        id: report.id().into_inner(),
        assignment_id: report.assignment_id().into_inner(),
        report_text: submission.report_text().to_owned(),
        hours_worked: fit("hours_worked", submission.hours_worked().value())?,
        challenges_faced: submission.challenges_faced().to_owned(),
        solutions_applied: submission.solutions_applied().to_owned(),
        status: report.status().as_str().to_owned(),
        submitted_at: report.submitted_at(),
        reviewed_at: report.reviewed_at(),
        reviewed_by: report.reviewed_by().map(UserId::into_inner),
        review_notes: report.review_notes().to_owned(),
    })
}

/// Rebuilds a report from its row.
pub fn row_to_report(row: ReportRow) -> Result<Report, RowConversionError> {
    let submission = ReportSubmission::new(row.report_text, fit("hours_worked", row.hours_worked)?)?
        .with_challenges(row.challenges_faced)
        .with_solutions(row.solutions_applied);
    Ok(Report::from_persisted(PersistedReportData {
        id: ReportId::from_uuid(row.id),
        assignment_id: AssignmentId::from_uuid(row.assignment_id),
        submission,
        status: ReportStatus::try_from(row.status.as_str())?,
        submitted_at: row.submitted_at,
        reviewed_at: row.reviewed_at,
        reviewed_by: row.reviewed_by.map(UserId::from_uuid),
        review_notes: row.review_notes,
    }))
}

/// Converts a worker profile into its row.
pub fn worker_to_row(profile: &WorkerProfile) -> Result<WorkerRow, RowConversionError> {
    let stats = profile.stats();
    Ok(WorkerRow {
        user_id: profile.user_id().into_inner(),
        display_name: profile.display_name().to_owned(),
        skill_tier: profile.skill_tier().as_str().to_owned(),
        is_active_worker: profile.is_active_worker(),
        max_tasks: fit("max_tasks", profile.max_tasks())?,
        tasks_assigned: fit("tasks_assigned", stats.tasks_assigned)?,
        tasks_completed: fit("tasks_completed", stats.tasks_completed)?,
        tasks_rejected: fit("tasks_rejected", stats.tasks_rejected)?,
        created_at: profile.created_at(),
        updated_at: profile.updated_at(),
    })
}

/// Extracts the mutable profile fields for an update.
pub fn worker_changes(profile: &WorkerProfile) -> Result<WorkerProfileChanges, RowConversionError> {
    Ok(WorkerProfileChanges {
        display_name: profile.display_name().to_owned(),
        skill_tier: profile.skill_tier().as_str().to_owned(),
        is_active_worker: profile.is_active_worker(),
        max_tasks: fit("max_tasks", profile.max_tasks())?,
        updated_at: profile.updated_at(),
    })
}

/// Rebuilds a worker profile from its row.
pub fn row_to_worker(row: WorkerRow) -> Result<WorkerProfile, RowConversionError> {
    Ok(WorkerProfile::from_persisted(PersistedWorkerData {
        user_id: UserId::from_uuid(row.user_id),
        display_name: row.display_name,
        skill_tier: SkillTier::try_from(row.skill_tier.as_str())?,
        is_active_worker: row.is_active_worker,
        max_tasks: fit("max_tasks", row.max_tasks)?,
        stats: WorkerStats {
            tasks_assigned: fit("tasks_assigned", row.tasks_assigned)?,
            tasks_completed: fit("tasks_completed", row.tasks_completed)?,
            tasks_rejected: fit("tasks_rejected", row.tasks_rejected)?,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

//! Diesel row models for task assignment persistence.

use super::schema::{assignments, reports, tasks, worker_profiles};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row for task records, used for queries, inserts, and full updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Required skill tier.
    pub difficulty: String,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Effort estimate in whole hours.
    pub estimated_hours: i32,
    /// Priority from 1 to 5.
    pub priority: i16,
    /// Task lifecycle status.
    pub status: String,
    /// Creating administrator.
    pub created_by: uuid::Uuid,
    /// Current assignee.
    pub assigned_to: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Latest assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Latest completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Row for assignment records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct AssignmentRow {
    /// Internal assignment identifier.
    pub id: uuid::Uuid,
    /// Assigned task.
    pub task_id: uuid::Uuid,
    /// Bound worker.
    pub assignee: uuid::Uuid,
    /// User who made the assignment.
    pub assigned_by: uuid::Uuid,
    /// Automatic or manual selection.
    pub origin: String,
    /// Assignment lifecycle status.
    pub status: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Rejection timestamp.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Worker's reason for declining.
    pub rejection_reason: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Approving administrator.
    pub approved_by: Option<uuid::Uuid>,
    /// Cancellation timestamp.
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Row for report records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ReportRow {
    /// Internal report identifier.
    pub id: uuid::Uuid,
    /// Reported assignment.
    pub assignment_id: uuid::Uuid,
    /// Description of the work done.
    pub report_text: String,
    /// Hours spent.
    pub hours_worked: i32,
    /// Problems encountered.
    pub challenges_faced: String,
    /// How the problems were solved.
    pub solutions_applied: String,
    /// Review status.
    pub status: String,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Review timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewing administrator.
    pub reviewed_by: Option<uuid::Uuid>,
    /// Reviewer notes.
    pub review_notes: String,
}

/// Row for worker profiles.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = worker_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkerRow {
    /// Worker identity.
    pub user_id: uuid::Uuid,
    /// Human-readable name.
    pub display_name: String,
    /// Qualification tier.
    pub skill_tier: String,
    /// Whether the worker accepts new work.
    pub is_active_worker: bool,
    /// Concurrent assignment cap.
    pub max_tasks: i32,
    /// Assignments received.
    pub tasks_assigned: i64,
    /// Approved completions.
    pub tasks_completed: i64,
    /// Declined assignments.
    pub tasks_rejected: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Profile fields an update may change; counters are owned by commits.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = worker_profiles)]
pub struct WorkerProfileChanges {
    /// Human-readable name.
    pub display_name: String,
    /// Qualification tier.
    pub skill_tier: String,
    /// Whether the worker accepts new work.
    pub is_active_worker: bool,
    /// Concurrent assignment cap.
    pub max_tasks: i32,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

//! Persistence port for tasks, assignments, and reports.
//!
//! Every lifecycle trigger hands its complete effect to [`TaskStore::commit`]
//! as one [`ChangeSet`], which implementations apply atomically.

use crate::task::domain::{
    Assignment, AssignmentId, AssignmentStatus, Report, ReportFilter, ReportId, ReportStatus,
    Task, TaskId, TaskStatus, UserId, WorkerCounter,
};
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Stored state an update was planned against.
///
/// A commit applies an update only while the stored record still reports
/// the guard observed when the trigger read it.
pub trait Guarded {
    /// Fields compared at commit time.
    type Guard: Copy + Eq + fmt::Debug + Send + Sync;

    /// Returns the record's current guard.
    fn guard(&self) -> Self::Guard;
}

impl Guarded for Task {
    type Guard = (TaskStatus, Option<UserId>);

    fn guard(&self) -> Self::Guard {
        (self.status(), self.assigned_to())
    }
}

impl Guarded for Assignment {
    type Guard = AssignmentStatus;

    fn guard(&self) -> Self::Guard {
        self.status()
    }
}

impl Guarded for Report {
    type Guard = ReportStatus;

    fn guard(&self) -> Self::Guard {
        self.status()
    }
}

/// Whether a record in a change set is new or replaces a stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write<T: Guarded> {
    /// Record must not exist yet.
    Insert(T),
    /// Record must already exist with guard `expected` and is replaced.
    Update {
        /// Replacement record.
        record: T,
        /// Guard of the stored record the update was planned from.
        expected: T::Guard,
    },
}

impl<T: Guarded> Write<T> {
    /// Returns the record being written.
    #[must_use]
    pub const fn record(&self) -> &T {
        match self {
            Self::Insert(record) | Self::Update { record, .. } => record,
        }
    }

    /// Returns the guard an update expects, or `None` for inserts.
    #[must_use]
    pub const fn expected(&self) -> Option<T::Guard> {
        match self {
            Self::Insert(_) => None,
            Self::Update { expected, .. } => Some(*expected),
        }
    }
}

/// All mutations produced by one lifecycle trigger.
///
/// Assignment updates are applied before assignment inserts so that a
/// superseded assignment no longer counts toward its worker's load when the
/// replacement is checked against the cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    task: Option<Write<Task>>,
    assignments: Vec<Write<Assignment>>,
    report: Option<Write<Report>>,
    counters: Vec<(UserId, WorkerCounter)>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new task.
    pub fn insert_task(&mut self, task: Task) {
        self.task = Some(Write::Insert(task));
    }

    /// Records a modified task read with guard `expected`. An earlier
    /// insert stays an insert and an earlier update keeps its guard.
    pub fn update_task(&mut self, task: Task, expected: <Task as Guarded>::Guard) {
        self.task = Some(match self.task.take() {
            Some(Write::Insert(_)) => Write::Insert(task),
            Some(Write::Update { expected: read, .. }) => Write::Update {
                record: task,
                expected: read,
            },
            None => Write::Update {
                record: task,
                expected,
            },
        });
    }

    /// Records a new assignment.
    pub fn insert_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(Write::Insert(assignment));
    }

    /// Records a modified assignment read in status `expected`.
    pub fn update_assignment(&mut self, assignment: Assignment, expected: AssignmentStatus) {
        self.assignments.push(Write::Update {
            record: assignment,
            expected,
        });
    }

    /// Records a new report.
    pub fn insert_report(&mut self, report: Report) {
        self.report = Some(Write::Insert(report));
    }

    /// Records a modified report read in status `expected`.
    pub fn update_report(&mut self, report: Report, expected: ReportStatus) {
        self.report = Some(Write::Update {
            record: report,
            expected,
        });
    }

    /// Records a statistics counter increment.
    pub fn increment(&mut self, worker: UserId, counter: WorkerCounter) {
        self.counters.push((worker, counter));
    }

    /// Returns the task write, if any.
    #[must_use]
    pub const fn task(&self) -> Option<&Write<Task>> {
        self.task.as_ref()
    }

    /// Returns the assignment writes in the order they were recorded.
    #[must_use]
    pub fn assignments(&self) -> &[Write<Assignment>] {
        &self.assignments
    }

    /// Returns assignment updates followed by assignment inserts.
    pub fn assignments_in_apply_order(&self) -> impl Iterator<Item = &Write<Assignment>> {
        let updates = self
            .assignments
            .iter()
            .filter(|write| matches!(write, Write::Update { .. }));
        let inserts = self
            .assignments
            .iter()
            .filter(|write| matches!(write, Write::Insert(_)));
        updates.chain(inserts)
    }

    /// Returns the report write, if any.
    #[must_use]
    pub const fn report(&self) -> Option<&Write<Report>> {
        self.report.as_ref()
    }

    /// Returns the counter increments.
    #[must_use]
    pub fn counters(&self) -> &[(UserId, WorkerCounter)] {
        &self.counters
    }

    /// Returns `true` when nothing would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.task.is_none()
            && self.assignments.is_empty()
            && self.report.is_none()
            && self.counters.is_empty()
    }
}

/// Task, assignment, and report persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Returns every task, newest first.
    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>>;

    /// Returns tasks the worker currently holds or has ever been assigned,
    /// newest first.
    async fn tasks_for_worker(&self, worker: UserId) -> TaskStoreResult<Vec<Task>>;

    /// Finds an assignment by identifier.
    async fn find_assignment(&self, id: AssignmentId) -> TaskStoreResult<Option<Assignment>>;

    /// Returns the task's assignment in `assigned` or `in_progress` status.
    async fn active_assignment(&self, task_id: TaskId) -> TaskStoreResult<Option<Assignment>>;

    /// Returns every assignment of the task ordered by assignment time.
    async fn assignments_for_task(&self, task_id: TaskId) -> TaskStoreResult<Vec<Assignment>>;

    /// Finds a report by identifier.
    async fn find_report(&self, id: ReportId) -> TaskStoreResult<Option<Report>>;

    /// Finds the report attached to an assignment.
    async fn report_for_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> TaskStoreResult<Option<Report>>;

    /// Returns reports passing the filter, newest submission first.
    async fn list_reports(&self, filter: ReportFilter) -> TaskStoreResult<Vec<Report>>;

    /// Applies every write in the change set atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::CapacityExceeded`] when an assignment would
    /// become active for a worker already at its cap,
    /// [`TaskStoreError::ActiveAssignmentExists`] when the task would end up
    /// with two active assignments, and [`TaskStoreError::StaleRecord`] when
    /// an updated record no longer matches its expected guard. Nothing is
    /// applied on error.
    async fn commit(&self, changes: &ChangeSet) -> TaskStoreResult<()>;

    /// Removes a task together with its assignments and reports.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task does not exist.
    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// An assignment with the same identifier already exists.
    #[error("duplicate assignment identifier: {0}")]
    DuplicateAssignment(AssignmentId),

    /// A report already exists for the assignment.
    #[error("assignment {0} already has a report")]
    DuplicateReport(AssignmentId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The assignment was not found.
    #[error("assignment not found: {0}")]
    AssignmentNotFound(AssignmentId),

    /// The report was not found.
    #[error("report not found: {0}")]
    ReportNotFound(ReportId),

    /// The worker profile referenced by the change set does not exist.
    #[error("worker not found: {0}")]
    WorkerNotFound(UserId),

    /// The task already has a different active assignment.
    #[error("task {0} already has an active assignment")]
    ActiveAssignmentExists(TaskId),

    /// Committing would push the worker past its concurrent task cap.
    #[error("worker {worker_id} is at capacity")]
    CapacityExceeded {
        /// Worker whose cap would be exceeded.
        worker_id: UserId,
    },

    /// A record changed between planning and commit.
    #[error("{kind} {id} changed since it was read")]
    StaleRecord {
        /// Kind of record.
        kind: RecordKind,
        /// Record identifier.
        id: uuid::Uuid,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Stale task write.
    #[must_use]
    pub const fn stale_task(id: TaskId) -> Self {
        Self::StaleRecord {
            kind: RecordKind::Task,
            id: id.into_inner(),
        }
    }

    /// Stale assignment write.
    #[must_use]
    pub const fn stale_assignment(id: AssignmentId) -> Self {
        Self::StaleRecord {
            kind: RecordKind::Assignment,
            id: id.into_inner(),
        }
    }

    /// Stale report write.
    #[must_use]
    pub const fn stale_report(id: ReportId) -> Self {
        Self::StaleRecord {
            kind: RecordKind::Report,
            id: id.into_inner(),
        }
    }

    /// Returns `true` for conflicts that a fresh plan may avoid.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. }
                | Self::ActiveAssignmentExists(_)
                | Self::StaleRecord { .. }
        )
    }
}

/// Record kinds named by [`TaskStoreError::StaleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A task.
    Task,
    /// An assignment.
    Assignment,
    /// A report.
    Report,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Assignment => "assignment",
            Self::Report => "report",
        })
    }
}

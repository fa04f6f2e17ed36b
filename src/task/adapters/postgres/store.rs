//! `PostgreSQL` task store and worker directory.
//!
//! Commits run in one transaction. Every worker receiving a newly active
//! assignment has its profile row locked with `SELECT ... FOR UPDATE` before
//! its live load is recounted, so concurrent commits for the same worker
//! serialize on that lock. Updated task, assignment, and report rows are
//! locked the same way and compared against the state their trigger read.

use super::{
    conversions::{
        assignment_to_row, report_to_row, row_to_assignment, row_to_report, row_to_task,
        row_to_worker, task_to_row, worker_changes, worker_to_row,
    },
    models::{AssignmentRow, ReportRow, TaskRow, WorkerRow},
    schema::{assignments, reports, tasks, worker_profiles},
};
use crate::task::{
    domain::{
        Assignment, AssignmentId, AssignmentStatus, Report, ReportFilter, ReportId, ReportStatus,
        SkillTier, Task, TaskId, UserId, WorkerCandidate, WorkerCounter, WorkerProfile,
    },
    ports::{
        ChangeSet, TaskStore, TaskStoreError, TaskStoreResult, WorkerDirectory,
        WorkerDirectoryError, WorkerDirectoryResult, Write,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use mockable::Clock;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const ACTIVE_STATUSES: [&str; 2] = [
    AssignmentStatus::Assigned.as_str(),
    AssignmentStatus::InProgress.as_str(),
];
const ONE_ACTIVE_PER_TASK_INDEX: &str = "idx_assignments_one_active_per_task";
const REPORT_PER_ASSIGNMENT_INDEX: &str = "idx_reports_assignment_unique";

/// Port errors that can wrap an infrastructure failure.
trait PersistenceFailure {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

impl PersistenceFailure for TaskStoreError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceFailure for WorkerDirectoryError {
    fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

/// Error type threaded through Diesel transactions.
#[derive(Debug)]
enum CommitError {
    Store(TaskStoreError),
    Diesel(DieselError),
}

impl From<DieselError> for CommitError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<TaskStoreError> for CommitError {
    fn from(err: TaskStoreError) -> Self {
        Self::Store(err)
    }
}

impl From<CommitError> for TaskStoreError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Store(inner) => inner,
            CommitError::Diesel(inner) => Self::persistence(inner),
        }
    }
}

type CommitResult<T> = Result<T, CommitError>;

/// `PostgreSQL`-backed implementation of [`TaskStore`] and
/// [`WorkerDirectory`].
#[derive(Debug, Clone)]
pub struct PostgresTaskStore<C: Clock + Send + Sync> {
    pool: TaskPgPool,
    clock: C,
}

impl<C: Clock + Send + Sync> PostgresTaskStore<C> {
    /// Creates a store from a `PostgreSQL` connection pool, stamping worker
    /// counter updates with `clock`.
    #[must_use]
    pub const fn new(pool: TaskPgPool, clock: C) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: PersistenceFailure + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(E::wrap)?;
            f(&mut connection)
        })
        .await
        .map_err(E::wrap)?
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskStore for PostgresTaskStore<C> {
    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task)
                .transpose()
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            convert_all(rows, row_to_task)
        })
        .await
    }

    async fn tasks_for_worker(&self, worker: UserId) -> TaskStoreResult<Vec<Task>> {
        let worker_id = worker.into_inner();
        self.run_blocking(move |connection| {
            let held = assignments::table
                .filter(assignments::assignee.eq(worker_id))
                .select(assignments::task_id);
            let rows = tasks::table
                .filter(
                    tasks::assigned_to
                        .eq(worker_id)
                        .or(tasks::id.eq_any(held)),
                )
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            convert_all(rows, row_to_task)
        })
        .await
    }

    async fn find_assignment(&self, id: AssignmentId) -> TaskStoreResult<Option<Assignment>> {
        self.run_blocking(move |connection| {
            let row = assignments::table
                .find(id.into_inner())
                .select(AssignmentRow::as_select())
                .first::<AssignmentRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_assignment)
                .transpose()
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn active_assignment(&self, task_id: TaskId) -> TaskStoreResult<Option<Assignment>> {
        self.run_blocking(move |connection| {
            let row = assignments::table
                .filter(assignments::task_id.eq(task_id.into_inner()))
                .filter(assignments::status.eq_any(ACTIVE_STATUSES))
                .select(AssignmentRow::as_select())
                .first::<AssignmentRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_assignment)
                .transpose()
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn assignments_for_task(&self, task_id: TaskId) -> TaskStoreResult<Vec<Assignment>> {
        self.run_blocking(move |connection| {
            let rows = assignments::table
                .filter(assignments::task_id.eq(task_id.into_inner()))
                .order(assignments::assigned_at.asc())
                .select(AssignmentRow::as_select())
                .load::<AssignmentRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            convert_all(rows, row_to_assignment)
        })
        .await
    }

    async fn find_report(&self, id: ReportId) -> TaskStoreResult<Option<Report>> {
        self.run_blocking(move |connection| {
            let row = reports::table
                .find(id.into_inner())
                .select(ReportRow::as_select())
                .first::<ReportRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_report)
                .transpose()
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn report_for_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> TaskStoreResult<Option<Report>> {
        self.run_blocking(move |connection| {
            let row = reports::table
                .filter(reports::assignment_id.eq(assignment_id.into_inner()))
                .select(ReportRow::as_select())
                .first::<ReportRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_report)
                .transpose()
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn list_reports(&self, filter: ReportFilter) -> TaskStoreResult<Vec<Report>> {
        self.run_blocking(move |connection| {
            let mut query = reports::table
                .order(reports::submitted_at.desc())
                .select(ReportRow::as_select())
                .into_boxed();
            match filter {
                ReportFilter::All => {}
                ReportFilter::PendingReview => {
                    query = query.filter(reports::status.eq(ReportStatus::PendingReview.as_str()));
                }
                ReportFilter::Status(status) => {
                    query = query.filter(reports::status.eq(status.as_str()));
                }
            }
            let rows = query
                .load::<ReportRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            convert_all(rows, row_to_report)
        })
        .await
    }

    async fn commit(&self, changes: &ChangeSet) -> TaskStoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let staged = changes.clone();
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            connection
                .transaction::<_, CommitError, _>(|tx| apply_changes(tx, &staged, now))
                .map_err(TaskStoreError::from)
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()> {
        self.run_blocking(move |connection| {
            // Assignments and reports go with the task through ON DELETE CASCADE.
            let deleted = diesel::delete(tasks::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            if deleted == 0 {
                return Err(TaskStoreError::TaskNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> WorkerDirectory for PostgresTaskStore<C> {
    async fn register_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()> {
        let worker_id = profile.user_id();
        let row = worker_to_row(profile).map_err(WorkerDirectoryError::persistence)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(worker_profiles::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkerDirectoryError::DuplicateWorker(worker_id)
                    }
                    _ => WorkerDirectoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()> {
        let worker_id = profile.user_id();
        let changes = worker_changes(profile).map_err(WorkerDirectoryError::persistence)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(worker_profiles::table.find(worker_id.into_inner()))
                .set(&changes)
                .execute(connection)
                .map_err(WorkerDirectoryError::persistence)?;
            if updated == 0 {
                return Err(WorkerDirectoryError::WorkerNotFound(worker_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_worker(&self, worker: UserId) -> WorkerDirectoryResult<Option<WorkerProfile>> {
        self.run_blocking(move |connection| {
            let row = worker_profiles::table
                .find(worker.into_inner())
                .select(WorkerRow::as_select())
                .first::<WorkerRow>(connection)
                .optional()
                .map_err(WorkerDirectoryError::persistence)?;
            row.map(row_to_worker)
                .transpose()
                .map_err(WorkerDirectoryError::persistence)
        })
        .await
    }

    async fn list_workers(&self) -> WorkerDirectoryResult<Vec<WorkerProfile>> {
        self.run_blocking(|connection| {
            let rows = worker_profiles::table
                .order(worker_profiles::user_id.asc())
                .select(WorkerRow::as_select())
                .load::<WorkerRow>(connection)
                .map_err(WorkerDirectoryError::persistence)?;
            rows.into_iter()
                .map(|row| row_to_worker(row).map_err(WorkerDirectoryError::persistence))
                .collect()
        })
        .await
    }

    async fn find_eligible_workers(
        &self,
        tier: SkillTier,
    ) -> WorkerDirectoryResult<Vec<WorkerCandidate>> {
        self.run_blocking(move |connection| {
            let rows = worker_profiles::table
                .filter(worker_profiles::skill_tier.eq(tier.as_str()))
                .filter(worker_profiles::is_active_worker.eq(true))
                .select(WorkerRow::as_select())
                .load::<WorkerRow>(connection)
                .map_err(WorkerDirectoryError::persistence)?;
            let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.user_id).collect();
            let loads: HashMap<uuid::Uuid, i64> = assignments::table
                .filter(assignments::assignee.eq_any(&ids))
                .filter(assignments::status.eq_any(ACTIVE_STATUSES))
                .group_by(assignments::assignee)
                .select((assignments::assignee, diesel::dsl::count_star()))
                .load::<(uuid::Uuid, i64)>(connection)
                .map_err(WorkerDirectoryError::persistence)?
                .into_iter()
                .collect();

            rows.into_iter()
                .map(|row| {
                    let load = loads.get(&row.user_id).copied().unwrap_or(0);
                    let profile = row_to_worker(row).map_err(WorkerDirectoryError::persistence)?;
                    Ok(WorkerCandidate::from_profile(&profile, saturating_load(load)))
                })
                .collect()
        })
        .await
    }

    async fn current_load(&self, worker: UserId) -> WorkerDirectoryResult<u32> {
        self.run_blocking(move |connection| {
            let load = count_active(connection, worker.into_inner())
                .map_err(WorkerDirectoryError::persistence)?;
            Ok(saturating_load(load))
        })
        .await
    }
}

fn convert_all<R, T, E>(rows: Vec<R>, convert: fn(R) -> Result<T, E>) -> TaskStoreResult<Vec<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    rows.into_iter()
        .map(|row| convert(row).map_err(TaskStoreError::persistence))
        .collect()
}

fn saturating_load(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

fn count_active(connection: &mut PgConnection, worker: uuid::Uuid) -> QueryResult<i64> {
    assignments::table
        .filter(assignments::assignee.eq(worker))
        .filter(assignments::status.eq_any(ACTIVE_STATUSES))
        .count()
        .get_result(connection)
}

fn apply_changes(
    connection: &mut PgConnection,
    changes: &ChangeSet,
    now: DateTime<Utc>,
) -> CommitResult<()> {
    lock_activated_workers(connection, changes)?;
    if let Some(write) = changes.task() {
        write_task(connection, write)?;
    }
    for write in changes.assignments_in_apply_order() {
        write_assignment(connection, write)?;
    }
    if let Some(write) = changes.report() {
        write_report(connection, write)?;
    }
    for &(worker, counter) in changes.counters() {
        increment_counter(connection, worker, counter, now)?;
    }
    Ok(())
}

/// Locks the profile rows of every worker that may gain an active
/// assignment, in a stable order so concurrent commits cannot deadlock.
fn lock_activated_workers(connection: &mut PgConnection, changes: &ChangeSet) -> CommitResult<()> {
    let workers: BTreeSet<uuid::Uuid> = changes
        .assignments()
        .iter()
        .map(Write::record)
        .filter(|assignment| assignment.is_active())
        .map(|assignment| assignment.assignee().into_inner())
        .collect();
    for worker in workers {
        let locked = worker_profiles::table
            .find(worker)
            .select(worker_profiles::user_id)
            .for_update()
            .first::<uuid::Uuid>(connection)
            .optional()?;
        if locked.is_none() {
            return Err(TaskStoreError::WorkerNotFound(UserId::from_uuid(worker)).into());
        }
    }
    Ok(())
}

fn write_task(connection: &mut PgConnection, write: &Write<Task>) -> CommitResult<()> {
    let task = write.record();
    let task_id = task.id();
    let row = task_to_row(task).map_err(TaskStoreError::persistence)?;
    match write {
        Write::Insert(_) => {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        CommitError::Store(TaskStoreError::DuplicateTask(task_id))
                    }
                    other => CommitError::Diesel(other),
                })?;
        }
        Write::Update { expected, .. } => {
            let (status, assigned_to) = tasks::table
                .find(task_id.into_inner())
                .select((tasks::status, tasks::assigned_to))
                .for_update()
                .first::<(String, Option<uuid::Uuid>)>(connection)
                .optional()?
                .ok_or(TaskStoreError::TaskNotFound(task_id))?;
            let (expected_status, expected_assignee) = *expected;
            if status != expected_status.as_str()
                || assigned_to != expected_assignee.map(UserId::into_inner)
            {
                return Err(TaskStoreError::stale_task(task_id).into());
            }
            diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)?;
        }
    }
    Ok(())
}

fn write_assignment(connection: &mut PgConnection, write: &Write<Assignment>) -> CommitResult<()> {
    let assignment = write.record();
    let assignment_id = assignment.id();
    let row = assignment_to_row(assignment);

    let previous_status = assignments::table
        .find(assignment_id.into_inner())
        .select(assignments::status)
        .for_update()
        .first::<String>(connection)
        .optional()?;
    let was_active = match (write.expected(), previous_status) {
        (None, Some(_)) => {
            return Err(TaskStoreError::DuplicateAssignment(assignment_id).into());
        }
        (Some(_), None) => {
            return Err(TaskStoreError::AssignmentNotFound(assignment_id).into());
        }
        (Some(expected), Some(found)) if found != expected.as_str() => {
            return Err(TaskStoreError::stale_assignment(assignment_id).into());
        }
        (_, previous) => previous.is_some_and(|status| ACTIVE_STATUSES.contains(&status.as_str())),
    };
    if assignment.is_active() && !was_active {
        check_activation(connection, assignment)?;
    }

    let outcome = match write {
        Write::Insert(_) => diesel::insert_into(assignments::table)
            .values(&row)
            .execute(connection),
        Write::Update { .. } => diesel::update(assignments::table.find(assignment_id.into_inner()))
            .set(&row)
            .execute(connection),
    };
    outcome.map_err(|err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_constraint(info.as_ref(), ONE_ACTIVE_PER_TASK_INDEX) =>
        {
            CommitError::Store(TaskStoreError::ActiveAssignmentExists(assignment.task_id()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            CommitError::Store(TaskStoreError::TaskNotFound(assignment.task_id()))
        }
        other => CommitError::Diesel(other),
    })?;
    Ok(())
}

/// Rejects an assignment becoming active when its task already has another
/// active assignment or its worker is at capacity. The worker row is
/// already locked.
fn check_activation(connection: &mut PgConnection, assignment: &Assignment) -> CommitResult<()> {
    let other_active: i64 = assignments::table
        .filter(assignments::task_id.eq(assignment.task_id().into_inner()))
        .filter(assignments::id.ne(assignment.id().into_inner()))
        .filter(assignments::status.eq_any(ACTIVE_STATUSES))
        .count()
        .get_result(connection)?;
    if other_active > 0 {
        return Err(TaskStoreError::ActiveAssignmentExists(assignment.task_id()).into());
    }

    let worker = assignment.assignee();
    let max_tasks = worker_profiles::table
        .find(worker.into_inner())
        .select(worker_profiles::max_tasks)
        .first::<i32>(connection)
        .optional()?
        .ok_or(TaskStoreError::WorkerNotFound(worker))?;
    let load = count_active(connection, worker.into_inner())?;
    if load >= i64::from(max_tasks) {
        debug!(worker_id = %worker, load, max_tasks, "worker filled up before commit");
        return Err(TaskStoreError::CapacityExceeded { worker_id: worker }.into());
    }
    Ok(())
}

fn write_report(connection: &mut PgConnection, write: &Write<Report>) -> CommitResult<()> {
    let report = write.record();
    let row = report_to_row(report).map_err(TaskStoreError::persistence)?;
    match write {
        Write::Insert(_) => {
            diesel::insert_into(reports::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_constraint(info.as_ref(), REPORT_PER_ASSIGNMENT_INDEX) =>
                    {
                        CommitError::Store(TaskStoreError::DuplicateReport(report.assignment_id()))
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        CommitError::Store(TaskStoreError::AssignmentNotFound(
                            report.assignment_id(),
                        ))
                    }
                    other => CommitError::Diesel(other),
                })?;
        }
        Write::Update { expected, .. } => {
            let status = reports::table
                .find(report.id().into_inner())
                .select(reports::status)
                .for_update()
                .first::<String>(connection)
                .optional()?
                .ok_or(TaskStoreError::ReportNotFound(report.id()))?;
            if status != expected.as_str() {
                return Err(TaskStoreError::stale_report(report.id()).into());
            }
            diesel::update(reports::table.find(report.id().into_inner()))
                .set(&row)
                .execute(connection)?;
        }
    }
    Ok(())
}

fn increment_counter(
    connection: &mut PgConnection,
    worker: UserId,
    counter: WorkerCounter,
    now: DateTime<Utc>,
) -> CommitResult<()> {
    let target = worker_profiles::table.find(worker.into_inner());
    let updated = match counter {
        WorkerCounter::Assigned => diesel::update(target)
            .set((
                worker_profiles::tasks_assigned.eq(worker_profiles::tasks_assigned + 1),
                worker_profiles::updated_at.eq(now),
            ))
            .execute(connection)?,
        WorkerCounter::Completed => diesel::update(target)
            .set((
                worker_profiles::tasks_completed.eq(worker_profiles::tasks_completed + 1),
                worker_profiles::updated_at.eq(now),
            ))
            .execute(connection)?,
        WorkerCounter::Rejected => diesel::update(target)
            .set((
                worker_profiles::tasks_rejected.eq(worker_profiles::tasks_rejected + 1),
                worker_profiles::updated_at.eq(now),
            ))
            .execute(connection)?,
    };
    if updated == 0 {
        return Err(TaskStoreError::WorkerNotFound(worker).into());
    }
    Ok(())
}

fn is_constraint(info: &dyn DatabaseErrorInformation, name: &str) -> bool {
    info.constraint_name()
        .is_some_and(|constraint| constraint == name)
}

//! Schema constraints enforced by `PostgreSQL` itself.

use crate::postgres::helpers::PgBackend;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types;
use eyre::{bail, ensure, eyre};
use foreman::task::{
    domain::{ReportFilter, SkillTier},
    ports::TaskStore,
    services::{CompleteTaskRequest, CreateTaskRequest},
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = sql_types::BigInt)]
    total: i64,
}

#[rstest]
fn one_active_assignment_per_task_is_indexed(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    backend.register("Ana", SkillTier::Regular, 3)?;
    let outcome = backend.run(backend.service.create_task(CreateTaskRequest::new(
        backend.admin,
        "Mop floor",
        SkillTier::Regular,
    )))?;
    let other = backend.register("Ben", SkillTier::Regular, 3)?;

    let mut conn = backend.connect()?;
    let result = diesel::sql_query(
        "INSERT INTO assignments (id, task_id, assignee, assigned_by, origin, status, assigned_at) \
         VALUES (gen_random_uuid(), $1, $2, $3, 'manual', 'in_progress', now())",
    )
    .bind::<sql_types::Uuid, _>(outcome.task.id().into_inner())
    .bind::<sql_types::Uuid, _>(other.into_inner())
    .bind::<sql_types::Uuid, _>(backend.admin.into_inner())
    .execute(&mut conn);

    let Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) = result else {
        bail!("a second active assignment must violate the partial unique index");
    };
    ensure!(info.constraint_name() == Some("idx_assignments_one_active_per_task"));
    Ok(())
}

#[rstest]
#[case::zero_capacity(
    "INSERT INTO worker_profiles (user_id, display_name, skill_tier, max_tasks, created_at, updated_at) \
     VALUES (gen_random_uuid(), 'Zed', 'regular', 0, now(), now())"
)]
#[case::unknown_tier(
    "INSERT INTO worker_profiles (user_id, display_name, skill_tier, created_at, updated_at) \
     VALUES (gen_random_uuid(), 'Zed', 'expert', now(), now())"
)]
#[case::priority_above_five(
    "INSERT INTO tasks (id, title, difficulty, priority, status, created_by, created_at, updated_at) \
     VALUES (gen_random_uuid(), 'Urgent', 'regular', 6, 'pending', gen_random_uuid(), now(), now())"
)]
#[case::assigned_without_assignee(
    "INSERT INTO tasks (id, title, difficulty, status, created_by, created_at, updated_at) \
     VALUES (gen_random_uuid(), 'Orphan', 'regular', 'assigned', gen_random_uuid(), now(), now())"
)]
fn invalid_rows_violate_check_constraints(
    shared_test_cluster: &'static TestCluster,
    #[case] statement: &str,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    let mut conn = backend.connect()?;
    let result = diesel::sql_query(statement).execute(&mut conn);
    ensure!(
        matches!(
            result,
            Err(DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _))
        ),
        "expected a check violation, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn deleting_a_task_cascades_to_assignments_and_reports(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    let worker = backend.register("Cal", SkillTier::Trainee, 2)?;
    let outcome = backend.run(backend.service.create_task(CreateTaskRequest::new(
        backend.admin,
        "Wipe tables",
        SkillTier::Trainee,
    )))?;
    let task_id = outcome.task.id();
    let assignment = outcome
        .assignment
        .ok_or_else(|| eyre!("task should be assigned"))?;
    let completed = backend.run(backend.service.complete_task(CompleteTaskRequest::new(
        task_id,
        worker,
        "Tables wiped",
        1,
    )))?;

    backend.run(backend.service.delete_task(task_id))?;

    ensure!(backend.run(backend.store.find_task(task_id))?.is_none());
    ensure!(backend.run(backend.store.find_assignment(assignment.id()))?.is_none());
    ensure!(
        backend
            .run(backend.store.find_report(completed.report.id()))?
            .is_none()
    );
    ensure!(
        backend
            .run(backend.store.list_reports(ReportFilter::All))?
            .is_empty()
    );
    let mut conn = backend.connect()?;
    let remaining: RowCount = diesel::sql_query(
        "SELECT (SELECT count(*) FROM assignments) + (SELECT count(*) FROM reports) AS total",
    )
    .get_result(&mut conn)?;
    ensure!(remaining.total == 0);
    Ok(())
}

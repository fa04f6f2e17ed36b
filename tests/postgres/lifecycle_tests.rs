//! Task lifecycle flows persisted through `PostgreSQL`.

use crate::postgres::helpers::PgBackend;
use eyre::{bail, ensure, eyre};
use foreman::task::{
    domain::{
        AssignmentStatus, NotificationKind, ReportFilter, ReportStatus, ReviewDecision,
        SkillTier, TaskDomainError, TaskStatus,
    },
    ports::{TaskStore, WorkerDirectory},
    services::{
        CompleteTaskRequest, CreateTaskRequest, RejectTaskRequest, ReviewReportRequest,
        TaskLifecycleError,
    },
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn approved_report_completes_the_task(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    let worker = backend.register("Ana", SkillTier::Specialist, 2)?;
    let task = backend
        .run(backend.service.create_task(CreateTaskRequest::new(
            backend.admin,
            "Migrate ledger",
            SkillTier::Specialist,
        )))?
        .task;
    backend.run(backend.service.start_task(task.id(), worker))?;
    let completed = backend.run(backend.service.complete_task(
        CompleteTaskRequest::new(task.id(), worker, "Ledger migrated", 6)
            .with_challenges("Legacy encodings"),
    ))?;
    let pending = backend.run(backend.service.list_reports(ReportFilter::PendingReview))?;
    ensure!(pending.len() == 1);

    backend.run(backend.service.review_report(ReviewReportRequest::new(
        completed.report.id(),
        backend.admin,
        ReviewDecision::Approve,
    )))?;

    let stored = backend
        .run(backend.store.find_task(task.id()))?
        .ok_or_else(|| eyre!("task should be stored"))?;
    ensure!(stored.status() == TaskStatus::Completed);
    let report = backend
        .run(backend.store.find_report(completed.report.id()))?
        .ok_or_else(|| eyre!("report should be stored"))?;
    ensure!(report.status() == ReportStatus::Approved);
    ensure!(report.submission().challenges_faced() == "Legacy encodings");
    let history = backend.run(backend.service.task_history(task.id()))?;
    ensure!(history.first().map(|assignment| assignment.status()) == Some(AssignmentStatus::Approved));

    let stats = backend.profile(worker)?.stats();
    ensure!(stats.tasks_assigned == 1);
    ensure!(stats.tasks_completed == 1);
    ensure!(
        backend
            .run(backend.service.list_reports(ReportFilter::PendingReview))?
            .is_empty()
    );
    let kinds: Vec<NotificationKind> = backend
        .inbox
        .for_user(worker)?
        .into_iter()
        .map(|notification| notification.kind)
        .collect();
    ensure!(kinds.contains(&NotificationKind::TaskApproved));
    Ok(())
}

#[rstest]
fn racing_approvals_credit_the_worker_once(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    let worker = backend.register("Bea", SkillTier::Regular, 2)?;
    let task = backend
        .run(backend.service.create_task(CreateTaskRequest::new(
            backend.admin,
            "Balance till",
            SkillTier::Regular,
        )))?
        .task;
    let report = backend
        .run(backend.service.complete_task(CompleteTaskRequest::new(
            task.id(),
            worker,
            "Balanced",
            1,
        )))?
        .report;

    let approve = || ReviewReportRequest::new(report.id(), backend.admin, ReviewDecision::Approve);
    let (first, second) = backend.run(async {
        tokio::join!(
            backend.service.review_report(approve()),
            backend.service.review_report(approve()),
        )
    });

    let lost = match (first, second) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        _ => bail!("exactly one approval should win"),
    };
    ensure!(matches!(
        lost,
        TaskLifecycleError::Domain(TaskDomainError::ReportAlreadyReviewed { .. })
    ));
    ensure!(backend.profile(worker)?.stats().tasks_completed == 1);
    Ok(())
}

#[rstest]
fn rejected_task_is_handed_to_another_worker(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let backend = PgBackend::new(shared_test_cluster)?;
    let first = backend.register("Cal", SkillTier::Regular, 2)?;
    let task = backend
        .run(backend.service.create_task(CreateTaskRequest::new(
            backend.admin,
            "Label parcels",
            SkillTier::Regular,
        )))?
        .task;
    let second = backend.register("Dee", SkillTier::Regular, 2)?;

    let outcome = backend.run(backend.service.reject_task(RejectTaskRequest::new(
        task.id(),
        first,
        "Injured wrist",
    )))?;
    ensure!(outcome.task.assigned_to() == Some(second));

    let history = backend.run(backend.service.task_history(task.id()))?;
    let statuses: Vec<AssignmentStatus> = history.iter().map(|assignment| assignment.status()).collect();
    ensure!(statuses.len() == 2);
    ensure!(statuses.contains(&AssignmentStatus::Rejected));
    ensure!(statuses.contains(&AssignmentStatus::Assigned));
    ensure!(backend.profile(first)?.stats().tasks_rejected == 1);
    ensure!(backend.profile(second)?.stats().tasks_assigned == 1);
    ensure!(backend.run(backend.store.current_load(first))? == 0);
    Ok(())
}

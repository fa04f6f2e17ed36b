//! End-to-end lifecycle flows over the in-memory adapters.

use super::helpers::{Backend, backend};
use foreman::task::{
    domain::{
        AssignmentStatus, NotificationId, NotificationKind, ReportFilter, ReportStatus,
        ReviewDecision, SkillTier, TaskStatus,
    },
    ports::{TaskStore, WorkerDirectory},
    services::{CompleteTaskRequest, CreateTaskRequest, RejectTaskRequest, ReviewReportRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_runs_from_creation_to_approval(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Hana", SkillTier::Regular, 2).await?;
    let created = backend
        .service
        .create_task(
            CreateTaskRequest::new(backend.admin, "Replace filters", SkillTier::Regular)
                .with_description("All three air handlers")
                .with_priority(4)
                .with_estimated_hours(6),
        )
        .await?;
    let task_id = created.task.id();
    eyre::ensure!(created.task.details().priority().value() == 4);

    backend.service.start_task(task_id, worker).await?;
    let first = backend
        .service
        .complete_task(CompleteTaskRequest::new(task_id, worker, "Filters swapped", 5))
        .await?;
    backend
        .service
        .review_report(
            ReviewReportRequest::new(first.report.id(), backend.admin, ReviewDecision::Reject)
                .with_notes("Unit two still dirty"),
        )
        .await?;

    let reopened = backend
        .service
        .find_task(task_id)
        .await?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    eyre::ensure!(reopened.status() == TaskStatus::Assigned);
    eyre::ensure!(reopened.completed_at().is_none());

    backend.service.start_task(task_id, worker).await?;
    let second = backend
        .service
        .complete_task(
            CompleteTaskRequest::new(task_id, worker, "Unit two cleaned", 1)
                .with_challenges("Seized bolt")
                .with_solutions("Penetrating oil"),
        )
        .await?;
    eyre::ensure!(second.report.id() == first.report.id());

    let approved = backend
        .service
        .review_report(ReviewReportRequest::new(
            second.report.id(),
            backend.admin,
            ReviewDecision::Approve,
        ))
        .await?;
    eyre::ensure!(approved.task.status() == TaskStatus::Completed);
    eyre::ensure!(approved.assignment.status() == AssignmentStatus::Approved);
    eyre::ensure!(approved.report.submission().report_text() == "Unit two cleaned");

    let kinds: Vec<NotificationKind> = backend
        .inbox
        .for_user(worker)?
        .into_iter()
        .map(|notification| notification.kind)
        .collect();
    eyre::ensure!(
        kinds
            == vec![
                NotificationKind::TaskApproved,
                NotificationKind::SystemMessage,
                NotificationKind::TaskAssigned,
            ]
    );
    let profile = backend
        .store
        .find_worker(worker)
        .await?
        .ok_or_else(|| eyre::eyre!("worker should exist"))?;
    eyre::ensure!(profile.stats().tasks_completed == 1);
    eyre::ensure!(profile.stats().tasks_assigned == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn report_listing_follows_filters(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Ivo", SkillTier::Trainee, 3).await?;
    let mut report_ids = Vec::new();
    for title in ["Stack", "Sort", "Ship"] {
        let created = backend
            .service
            .create_task(CreateTaskRequest::new(backend.admin, title, SkillTier::Trainee))
            .await?;
        let completed = backend
            .service
            .complete_task(CompleteTaskRequest::new(created.task.id(), worker, "Done", 1))
            .await?;
        report_ids.push(completed.report.id());
    }
    let Some(&approved_id) = report_ids.first() else {
        return Err(eyre::eyre!("three reports were submitted"));
    };
    backend
        .service
        .review_report(ReviewReportRequest::new(
            approved_id,
            backend.admin,
            ReviewDecision::Approve,
        ))
        .await?;

    let pending = backend.service.list_reports(ReportFilter::PendingReview).await?;
    eyre::ensure!(pending.len() == 2);
    eyre::ensure!(pending.iter().all(|report| report.id() != approved_id));
    let approved = backend
        .service
        .list_reports(ReportFilter::Status(ReportStatus::Approved))
        .await?;
    eyre::ensure!(approved.len() == 1);
    eyre::ensure!(backend.service.list_reports(ReportFilter::All).await?.len() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn earlier_rejecters_may_be_chosen_again(backend: Backend) -> Result<(), eyre::Report> {
    let first = backend.register("Jae", SkillTier::Specialist, 1).await?;
    let created = backend
        .service
        .create_task(CreateTaskRequest::new(
            backend.admin,
            "Tune database",
            SkillTier::Specialist,
        ))
        .await?;
    let second = backend.register("Kim", SkillTier::Specialist, 1).await?;
    let task_id = created.task.id();

    backend
        .service
        .reject_task(RejectTaskRequest::new(task_id, first, "On leave"))
        .await?;
    backend
        .service
        .reject_task(RejectTaskRequest::new(task_id, second, "Conflict"))
        .await?;

    let task = backend
        .service
        .find_task(task_id)
        .await?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    eyre::ensure!(task.status() == TaskStatus::Assigned);
    eyre::ensure!(task.assigned_to() == Some(first));

    let history = backend.service.task_history(task_id).await?;
    let trail: Vec<_> = history
        .iter()
        .map(|assignment| (assignment.assignee(), assignment.status()))
        .collect();
    eyre::ensure!(
        trail
            == vec![
                (first, AssignmentStatus::Rejected),
                (second, AssignmentStatus::Rejected),
                (first, AssignmentStatus::Assigned),
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbox_tracks_read_state_per_user(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Lou", SkillTier::Trainee, 3).await?;
    for title in ["Alpha", "Beta"] {
        backend
            .service
            .create_task(CreateTaskRequest::new(backend.admin, title, SkillTier::Trainee))
            .await?;
    }
    eyre::ensure!(backend.inbox.unread_count(worker)? == 2);

    let newest: Vec<NotificationId> = backend
        .inbox
        .for_user(worker)?
        .iter()
        .take(1)
        .map(|notification| notification.id)
        .collect();
    eyre::ensure!(backend.inbox.mark_read(backend.admin, &newest)? == 0);
    eyre::ensure!(backend.inbox.mark_read(worker, &newest)? == 1);
    eyre::ensure!(backend.inbox.mark_read(worker, &newest)? == 0);
    eyre::ensure!(backend.inbox.unread_count(worker)? == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_frees_capacity(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Mo", SkillTier::Regular, 1).await?;
    let held = backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Held", SkillTier::Regular))
        .await?;
    let waiting = backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Waiting", SkillTier::Regular))
        .await?;
    eyre::ensure!(waiting.assignment.is_none());

    backend.service.delete_task(held.task.id()).await?;
    eyre::ensure!(backend.store.current_load(worker).await? == 0);
    eyre::ensure!(backend.store.list_tasks().await?.len() == 1);
    Ok(())
}

//! Statistics over a store populated through the lifecycle service.

use super::helpers::{Backend, backend};
use foreman::task::{
    domain::{ReviewDecision, SkillTier},
    services::{CompleteTaskRequest, CreateTaskRequest, ReviewReportRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completers_are_ranked_by_approvals(backend: Backend) -> Result<(), eyre::Report> {
    let prolific = backend.register("Nell", SkillTier::Trainee, 5).await?;
    let occasional = backend.register("Otto", SkillTier::Regular, 5).await?;
    backend.register("Pia", SkillTier::Specialist, 5).await?;

    let plan = [
        (prolific, SkillTier::Trainee),
        (prolific, SkillTier::Trainee),
        (occasional, SkillTier::Regular),
    ];
    for (worker, tier) in plan {
        let created = backend
            .service
            .create_task(CreateTaskRequest::new(backend.admin, "Shift", tier))
            .await?;
        let completed = backend
            .service
            .complete_task(CompleteTaskRequest::new(created.task.id(), worker, "Done", 8))
            .await?;
        backend
            .service
            .review_report(ReviewReportRequest::new(
                completed.report.id(),
                backend.admin,
                ReviewDecision::Approve,
            ))
            .await?;
    }
    backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Open", SkillTier::Specialist))
        .await?;

    let snapshot = backend.statistics().snapshot().await?;
    eyre::ensure!(snapshot.totals.total() == 4);
    eyre::ensure!(snapshot.totals.completed == 3);
    eyre::ensure!(snapshot.totals.assigned == 1);
    eyre::ensure!(snapshot.completion_rate == 75);
    eyre::ensure!(snapshot.worker_count == 3);
    let ranking: Vec<_> = snapshot
        .top_completers
        .iter()
        .map(|row| (row.display_name.as_str(), row.count))
        .collect();
    eyre::ensure!(ranking == vec![("Nell", 2), ("Otto", 1)]);
    eyre::ensure!(snapshot.top_rejecters.is_empty());
    Ok(())
}

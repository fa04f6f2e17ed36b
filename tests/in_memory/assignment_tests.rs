//! Integration tests for assignee selection through the lifecycle service.

use super::helpers::{Backend, backend};
use foreman::task::{
    domain::{SkillTier, TaskStatus, UserId, WorkerProfile},
    ports::{TaskStore, WorkerDirectory},
    services::{
        CreateTaskRequest, LifecycleConfig, Reassignment, TaskLifecycleError, UpdateTaskRequest,
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_spread_evenly_across_workers(backend: Backend) -> Result<(), eyre::Report> {
    let first = backend.register("Ada", SkillTier::Regular, 5).await?;
    let second = backend.register("Bram", SkillTier::Regular, 5).await?;

    for index in 0..4 {
        backend
            .service
            .create_task(CreateTaskRequest::new(
                backend.admin,
                format!("Ticket {index}"),
                SkillTier::Regular,
            ))
            .await?;
    }

    eyre::ensure!(backend.store.current_load(first).await? == 2);
    eyre::ensure!(backend.store.current_load(second).await? == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tier_must_match_exactly(backend: Backend) -> Result<(), eyre::Report> {
    backend.register("Cal", SkillTier::Specialist, 5).await?;

    let outcome = backend
        .service
        .create_task(CreateTaskRequest::new(
            backend.admin,
            "Sweep floor",
            SkillTier::Trainee,
        ))
        .await?;
    eyre::ensure!(outcome.task.status() == TaskStatus::Pending);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inactive_workers_are_skipped(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Dot", SkillTier::Trainee, 5).await?;
    let mut profile = backend
        .store
        .find_worker(worker)
        .await?
        .ok_or_else(|| eyre::eyre!("registered worker should exist"))?;
    profile.set_active(false, &DefaultClock);
    backend.store.update_worker(&profile).await?;

    let outcome = backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Dust", SkillTier::Trainee))
        .await?;
    eyre::ensure!(outcome.assignment.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directory_updates_keep_counters(backend: Backend) -> Result<(), eyre::Report> {
    let worker = backend.register("Eve", SkillTier::Trainee, 5).await?;
    backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Mop", SkillTier::Trainee))
        .await?;

    let stale = WorkerProfile::new(worker, "Eve R.", SkillTier::Regular, &DefaultClock);
    backend.store.update_worker(&stale).await?;

    let stored = backend
        .store
        .find_worker(worker)
        .await?
        .ok_or_else(|| eyre::eyre!("worker should still exist"))?;
    eyre::ensure!(stored.display_name() == "Eve R.");
    eyre::ensure!(stored.skill_tier() == SkillTier::Regular);
    eyre::ensure!(stored.stats().tasks_assigned == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_never_exceed_capacity() -> Result<(), eyre::Report> {
    let backend = Backend::with_config(LifecycleConfig::default().with_max_commit_attempts(64));
    let first = backend.register("Fin", SkillTier::Regular, 3).await?;
    let second = backend.register("Gil", SkillTier::Regular, 3).await?;

    let mut handles = Vec::new();
    for index in 0..20 {
        let service = Arc::clone(&backend.service);
        let request =
            CreateTaskRequest::new(backend.admin, format!("Burst {index}"), SkillTier::Regular);
        handles.push(tokio::spawn(async move { service.create_task(request).await }));
    }

    let mut assigned = 0_usize;
    for handle in handles {
        let outcome = handle.await??;
        if outcome.assignment.is_some() {
            assigned += 1;
        }
    }

    eyre::ensure!(assigned == 6, "expected six assignments, found {assigned}");
    eyre::ensure!(backend.store.current_load(first).await? == 3);
    eyre::ensure!(backend.store.current_load(second).await? == 3);
    let pending = backend
        .store
        .list_tasks()
        .await?
        .into_iter()
        .filter(|task| task.status() == TaskStatus::Pending)
        .count();
    eyre::ensure!(pending == 14);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_manual_target_is_reported(backend: Backend) -> Result<(), eyre::Report> {
    let outcome = backend
        .service
        .create_task(CreateTaskRequest::new(backend.admin, "Plan", SkillTier::Regular))
        .await?;
    let missing = UserId::new();

    let result = backend
        .service
        .update_task(
            UpdateTaskRequest::new(outcome.task.id(), backend.admin)
                .with_reassignment(Reassignment::Manual(missing)),
        )
        .await;
    eyre::ensure!(matches!(
        result,
        Err(TaskLifecycleError::WorkerNotFound(id)) if id == missing
    ));
    Ok(())
}

//! Then steps for task assignment BDD scenarios.

use super::world::{AssignmentWorld, run_async};
use foreman::task::{
    domain::{AssignmentStatus, ReportStatus, TaskStatus, WorkerStats},
    ports::{TaskStore, WorkerDirectory},
};
use eyre::{WrapErr, eyre};
use rstest_bdd_macros::then;

fn stats_of(world: &AssignmentWorld, name: &str) -> Result<WorkerStats, eyre::Report> {
    let worker = world.worker(name)?;
    let profile = run_async(world.store.find_worker(worker))
        .wrap_err("look up scenario worker")?
        .ok_or_else(|| eyre!("worker {name} vanished from the directory"))?;
    Ok(profile.stats())
}

#[then(r#"the task is assigned to "{name}""#)]
fn task_is_assigned_to(world: &AssignmentWorld, name: String) -> Result<(), eyre::Report> {
    let worker = world.worker(&name)?;
    let task = world.task()?;
    if task.assigned_to() != Some(worker) {
        return Err(eyre!(
            "expected {name} to hold the task, found {:?}",
            task.assigned_to()
        ));
    }
    let active = run_async(world.store.active_assignment(task.id()))
        .wrap_err("load active assignment")?
        .ok_or_else(|| eyre!("assigned task has no active assignment"))?;
    eyre::ensure!(active.assignee() == worker, "active assignment names another worker");
    Ok(())
}

#[then("no worker holds the task")]
fn no_worker_holds_task(world: &AssignmentWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    eyre::ensure!(task.assigned_to().is_none(), "task unexpectedly has an assignee");
    eyre::ensure!(world.assignment.is_none(), "trigger unexpectedly produced an assignment");
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &AssignmentWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;
    let stored = run_async(world.store.find_task(task.id()))
        .wrap_err("reload task")?
        .ok_or_else(|| eyre!("task vanished from the store"))?;
    if stored.status() != expected {
        return Err(eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            stored.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"the report status is "{status}""#)]
fn report_status_is(world: &AssignmentWorld, status: String) -> Result<(), eyre::Report> {
    let expected = ReportStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let found = world.report()?.status();
    eyre::ensure!(
        found == expected,
        "expected report status {}, found {}",
        expected.as_str(),
        found.as_str()
    );
    Ok(())
}

#[then(r#"the assignment status is "{status}""#)]
fn assignment_status_is(world: &AssignmentWorld, status: String) -> Result<(), eyre::Report> {
    let expected = AssignmentStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let assignment = world
        .assignment
        .as_ref()
        .ok_or_else(|| eyre!("missing assignment in scenario world"))?;
    eyre::ensure!(
        assignment.status() == expected,
        "expected assignment status {}, found {}",
        expected.as_str(),
        assignment.status().as_str()
    );
    Ok(())
}

#[then(r#""{name}" has {count:u64} rejected tasks"#)]
fn worker_rejected_count(
    world: &AssignmentWorld,
    name: String,
    count: u64,
) -> Result<(), eyre::Report> {
    let found = stats_of(world, &name)?.tasks_rejected;
    eyre::ensure!(found == count, "expected {count} rejections for {name}, found {found}");
    Ok(())
}

#[then(r#""{name}" has {count:u64} completed tasks"#)]
fn worker_completed_count(
    world: &AssignmentWorld,
    name: String,
    count: u64,
) -> Result<(), eyre::Report> {
    let found = stats_of(world, &name)?.tasks_completed;
    eyre::ensure!(found == count, "expected {count} completions for {name}, found {found}");
    Ok(())
}

#[then("{count:usize} notifications were sent")]
fn notifications_were_sent(world: &AssignmentWorld, count: usize) -> Result<(), eyre::Report> {
    let sent = world
        .inbox
        .all()?
        .len()
        .saturating_sub(world.notifications_before);
    eyre::ensure!(sent == count, "expected {count} notifications, found {sent}");
    Ok(())
}

#[then("the task creator was notified")]
fn creator_was_notified(world: &AssignmentWorld) -> Result<(), eyre::Report> {
    let creator = world.task()?.created_by();
    eyre::ensure!(
        !world.inbox.for_user(creator)?.is_empty(),
        "the task creator received no notification"
    );
    Ok(())
}

#[then(r#""{name}" was notified"#)]
fn worker_was_notified(world: &AssignmentWorld, name: String) -> Result<(), eyre::Report> {
    let worker = world.worker(&name)?;
    eyre::ensure!(
        !world.inbox.for_user(worker)?.is_empty(),
        "{name} received no notification"
    );
    Ok(())
}

//! Given steps for task assignment BDD scenarios.

use super::world::{AssignmentWorld, parse_tier, run_async};
use foreman::task::{
    domain::{
        Assignment, AssignmentOrigin, PersistedWorkerData, SkillTier, Task, TaskDetails, UserId,
        WorkerProfile, WorkerStats,
    },
    ports::{ChangeSet, TaskStore, WorkerDirectory},
    services::{CompleteTaskRequest, CreateTaskRequest},
};
use eyre::{WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use rstest_bdd_macros::given;

/// Gives `worker` one active assignment on a filler task.
fn occupy(world: &AssignmentWorld, worker: UserId, tier: SkillTier) -> Result<(), eyre::Report> {
    let clock = DefaultClock;
    let mut filler = Task::new(TaskDetails::new("Filler", tier)?, world.admin, &clock);
    filler.assign_to(worker, &clock)?;
    let assignment = Assignment::new(
        filler.id(),
        worker,
        world.admin,
        AssignmentOrigin::Manual,
        &clock,
    );
    let mut changes = ChangeSet::new();
    changes.insert_task(filler);
    changes.insert_assignment(assignment);
    run_async(world.store.commit(&changes)).wrap_err("seed filler assignment")
}

#[given(
    r#"a {tier} worker "{name}" with load {load:u32} of {cap:u32} and {rejected:u64} rejections"#
)]
fn worker_with_load(
    world: &mut AssignmentWorld,
    tier: String,
    name: String,
    load: u32,
    cap: u32,
    rejected: u64,
) -> Result<(), eyre::Report> {
    let skill_tier = parse_tier(&tier)?;
    let now = DefaultClock.utc();
    let profile = WorkerProfile::from_persisted(PersistedWorkerData {
        user_id: UserId::new(),
        display_name: name.clone(),
        skill_tier,
        is_active_worker: true,
        max_tasks: cap,
        stats: WorkerStats {
            tasks_rejected: rejected,
            ..WorkerStats::default()
        },
        created_at: now,
        updated_at: now,
    });
    run_async(world.store.register_worker(&profile)).wrap_err("register scenario worker")?;
    for _ in 0..load {
        occupy(world, profile.user_id(), skill_tier)?;
    }
    world.workers.insert(name, profile.user_id());
    Ok(())
}

#[given(r#"a {tier} task "{title}" has been created"#)]
fn task_has_been_created(
    world: &mut AssignmentWorld,
    tier: String,
    title: String,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(world.admin, title, parse_tier(&tier)?);
    let outcome =
        run_async(world.service.create_task(request)).wrap_err("create task in scenario setup")?;
    world.task = Some(outcome.task);
    world.assignment = outcome.assignment;
    Ok(())
}

#[given(r#""{name}" has completed the task"#)]
fn worker_has_completed_task(world: &mut AssignmentWorld, name: String) -> Result<(), eyre::Report> {
    let worker = world.worker(&name)?;
    let task_id = world.task()?.id();
    if world.task()?.assigned_to() != Some(worker) {
        return Err(eyre!("{name} does not hold the scenario task"));
    }
    let request = CompleteTaskRequest::new(task_id, worker, "Replaced the valve", 3);
    let outcome =
        run_async(world.service.complete_task(request)).wrap_err("complete task in scenario setup")?;
    world.task = Some(outcome.task);
    world.assignment = Some(outcome.assignment);
    world.report = Some(outcome.report);
    Ok(())
}

//! When steps for task assignment BDD scenarios.

use super::world::{AssignmentWorld, parse_tier, run_async};
use foreman::task::{
    domain::ReviewDecision,
    services::{CreateTaskRequest, RejectTaskRequest, ReviewReportRequest},
};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"a {tier} task "{title}" is created"#)]
fn task_is_created(
    world: &mut AssignmentWorld,
    tier: String,
    title: String,
) -> Result<(), eyre::Report> {
    world.mark_inbox()?;
    let request = CreateTaskRequest::new(world.admin, title, parse_tier(&tier)?);
    let outcome = run_async(world.service.create_task(request)).wrap_err("create task")?;
    world.task = Some(outcome.task);
    world.assignment = outcome.assignment;
    Ok(())
}

#[when(r#""{name}" rejects the task with reason "{reason}""#)]
fn worker_rejects_task(
    world: &mut AssignmentWorld,
    name: String,
    reason: String,
) -> Result<(), eyre::Report> {
    world.mark_inbox()?;
    let worker = world.worker(&name)?;
    let request = RejectTaskRequest::new(world.task()?.id(), worker, reason);
    let outcome = run_async(world.service.reject_task(request)).wrap_err("reject task")?;
    world.task = Some(outcome.task);
    world.assignment = outcome.assignment;
    Ok(())
}

fn review(world: &mut AssignmentWorld, decision: ReviewDecision) -> Result<(), eyre::Report> {
    world.mark_inbox()?;
    let request = ReviewReportRequest::new(world.report()?.id(), world.admin, decision);
    let outcome = run_async(world.service.review_report(request)).wrap_err("review report")?;
    world.task = Some(outcome.task);
    world.assignment = Some(outcome.assignment);
    world.report = Some(outcome.report);
    Ok(())
}

#[when("the administrator approves the report")]
fn administrator_approves(world: &mut AssignmentWorld) -> Result<(), eyre::Report> {
    review(world, ReviewDecision::Approve)
}

#[when("the administrator asks for corrections")]
fn administrator_asks_for_corrections(world: &mut AssignmentWorld) -> Result<(), eyre::Report> {
    review(world, ReviewDecision::NeedsCorrection)
}

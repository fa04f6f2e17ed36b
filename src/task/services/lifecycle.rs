//! Service layer driving tasks through their lifecycle.
//!
//! Each trigger is planned against current state into a [`ChangeSet`],
//! committed atomically, and only then announced through the [`Notifier`].
//! A commit that loses a race, whether on worker capacity or because a record
//! it updates changed after it was read, is re-planned from fresh state up to
//! [`LifecycleConfig::max_commit_attempts`] times.

use super::{
    assignment::{AssignmentDecision, AssignmentEngine, AssignmentEngineError, Selection},
    config::LifecycleConfig,
    requests::{
        CompleteTaskRequest, CreateTaskRequest, Reassignment, RejectTaskRequest,
        ReviewReportRequest, UpdateTaskRequest,
    },
};
use crate::task::{
    domain::{
        Assignment, Ineligibility, Notification, NotificationKind, RejectionReason, Report,
        ReportFilter, ReportId, ReportSubmission, ReviewDecision, Task, TaskDomainError, TaskEdit,
        TaskId, TaskStatus, UserId, WorkerCounter,
    },
    ports::{
        ChangeSet, Guarded, Notifier, TaskStore, TaskStoreError, WorkerDirectory,
        WorkerDirectoryError,
    },
};
use mockable::Clock;
use std::{future::Future, slice, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation or a state transition failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The report does not exist.
    #[error("report not found: {0}")]
    ReportNotFound(ReportId),

    /// The worker does not exist.
    #[error("worker not found: {0}")]
    WorkerNotFound(UserId),

    /// The caller is not the task's current assignee.
    #[error("worker {worker_id} is not assigned to task {task_id}")]
    NotAssignee {
        /// Task the caller acted on.
        task_id: TaskId,
        /// Calling worker.
        worker_id: UserId,
    },

    /// The task has no assignment in `assigned` or `in_progress` status.
    #[error("task {0} has no active assignment")]
    NoActiveAssignment(TaskId),

    /// The worker cannot take the task.
    #[error("worker {worker_id} is not eligible: {reason}")]
    WorkerNotEligible {
        /// Rejected worker.
        worker_id: UserId,
        /// Why the worker was rejected.
        reason: Ineligibility,
    },

    /// Every commit attempt lost a race with a concurrent trigger.
    #[error("gave up after {attempts} conflicting commit attempts")]
    ConcurrencyConflict {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Task store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// Worker directory operation failed.
    #[error(transparent)]
    Directory(#[from] WorkerDirectoryError),
}

impl From<AssignmentEngineError> for TaskLifecycleError {
    fn from(err: AssignmentEngineError) -> Self {
        match err {
            AssignmentEngineError::Directory(inner) => Self::Directory(inner),
            AssignmentEngineError::WorkerNotFound(worker_id) => Self::WorkerNotFound(worker_id),
            AssignmentEngineError::NotEligible { worker_id, reason } => {
                Self::WorkerNotEligible { worker_id, reason }
            }
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// A task together with its assignment after a trigger.
///
/// `assignment` is `None` when the task is left unassigned, including when
/// no eligible worker was available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Task after the trigger.
    pub task: Task,
    /// Active assignment after the trigger.
    pub assignment: Option<Assignment>,
}

/// A task, its assignment, and the report after a completion or review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    /// Task after the trigger.
    pub task: Task,
    /// Assignment the report belongs to.
    pub assignment: Assignment,
    /// Report after the trigger.
    pub report: Report,
}

/// Writes and notifications produced by planning one trigger.
#[derive(Debug, Default)]
struct Effects {
    changes: ChangeSet,
    notifications: Vec<Notification>,
}

impl Effects {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

type Planned<T> = TaskLifecycleResult<(Effects, T)>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<S, D, N, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    directory: Arc<D>,
    engine: AssignmentEngine<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: LifecycleConfig,
}

impl<S, D, N, C> TaskLifecycleService<S, D, N, C>
where
    S: TaskStore,
    D: WorkerDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: LifecycleConfig,
    ) -> Self {
        let engine = AssignmentEngine::new(Arc::clone(&directory));
        Self {
            store,
            directory,
            engine,
            notifier,
            clock,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Creates a task and tries to assign it immediately.
    ///
    /// The task stays pending when no eligible worker is available.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the request is invalid,
    /// or a store or directory error when persistence fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<TaskOutcome> {
        let creator = request.created_by();
        let details = request.into_details()?;
        let draft = Task::new(details, creator, &*self.clock);
        let outcome = self.run("create_task", || self.plan_create(&draft)).await?;
        info!(
            task_id = %outcome.task.id(),
            assignee = ?outcome.task.assigned_to(),
            "task created"
        );
        Ok(outcome)
    }

    async fn plan_create(&self, draft: &Task) -> Planned<TaskOutcome> {
        let mut task = draft.clone();
        let mut effects = Effects::default();
        let decision = self
            .engine
            .auto_assign(&task, task.created_by(), Selection::any(), &*self.clock)
            .await?;
        let assignment = decision
            .map(|chosen| self.bind(&mut task, chosen, &mut effects, false))
            .transpose()?;
        effects.changes.insert_task(task.clone());
        Ok((effects, TaskOutcome { task, assignment }))
    }

    /// Records that the assignee started working on the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotAssignee`] when `worker` does not
    /// hold the task and [`TaskLifecycleError::Domain`] when the assignment
    /// is not in `assigned` status.
    pub async fn start_task(
        &self,
        task_id: TaskId,
        worker: UserId,
    ) -> TaskLifecycleResult<TaskOutcome> {
        let outcome = self
            .run("start_task", || self.plan_start(task_id, worker))
            .await?;
        debug!(%task_id, %worker, "task started");
        Ok(outcome)
    }

    async fn plan_start(&self, task_id: TaskId, worker: UserId) -> Planned<TaskOutcome> {
        let (mut task, mut assignment) = self.held_assignment(task_id, worker).await?;
        let (task_read, assignment_read) = (task.guard(), assignment.guard());
        let mut effects = Effects::default();
        assignment.start(&*self.clock)?;
        task.start(&*self.clock)?;
        effects.changes.update_assignment(assignment.clone(), assignment_read);
        effects.changes.update_task(task.clone(), task_read);
        Ok((
            effects,
            TaskOutcome {
                task,
                assignment: Some(assignment),
            },
        ))
    }

    /// Declines an assigned task and re-assigns it to someone else.
    ///
    /// The rejecting worker is never chosen again by the same trigger. When
    /// nobody else qualifies the task is left pending.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an empty or overlong
    /// reason, [`TaskLifecycleError::NotAssignee`] when `worker` does not
    /// hold the task, and [`TaskLifecycleError::NoActiveAssignment`] when no
    /// active assignment exists.
    pub async fn reject_task(&self, request: RejectTaskRequest) -> TaskLifecycleResult<TaskOutcome> {
        let RejectTaskRequest {
            task_id,
            worker,
            reason,
        } = request;
        let rejection = RejectionReason::new(reason, self.config.max_rejection_reason_len)?;
        let outcome = self
            .run("reject_task", || self.plan_reject(task_id, worker, &rejection))
            .await?;
        info!(
            %task_id,
            rejected_by = %worker,
            reassigned_to = ?outcome.task.assigned_to(),
            "task rejected"
        );
        Ok(outcome)
    }

    async fn plan_reject(
        &self,
        task_id: TaskId,
        worker: UserId,
        reason: &RejectionReason,
    ) -> Planned<TaskOutcome> {
        let (mut task, mut rejected) = self.held_assignment(task_id, worker).await?;
        let (task_read, rejected_read) = (task.guard(), rejected.guard());
        let mut effects = Effects::default();

        rejected.reject(reason.clone(), &*self.clock)?;
        effects.changes.update_assignment(rejected, rejected_read);
        effects.changes.increment(worker, WorkerCounter::Rejected);
        task.release_assignee(&*self.clock)?;
        effects.notify(self.notice(
            task.created_by(),
            NotificationKind::TaskRejected,
            "Task rejected",
            format!(
                "The task \"{}\" was rejected by its assignee. Reason: {}",
                task.title(),
                reason.as_str()
            ),
            task.id(),
        ));

        let selection = Selection::any().excluding(slice::from_ref(&worker));
        let decision = self
            .engine
            .auto_assign(&task, task.created_by(), selection, &*self.clock)
            .await?;
        let assignment = decision
            .map(|chosen| self.bind(&mut task, chosen, &mut effects, false))
            .transpose()?;
        effects.changes.update_task(task.clone(), task_read);
        Ok((effects, TaskOutcome { task, assignment }))
    }

    /// Completes a task and submits its report for review.
    ///
    /// A report previously rejected by a reviewer is replaced by the new
    /// submission and returns to the review queue.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an invalid report,
    /// [`TaskLifecycleError::NotAssignee`] when `worker` does not hold the
    /// task, and [`TaskLifecycleError::NoActiveAssignment`] when no active
    /// assignment exists.
    pub async fn complete_task(
        &self,
        request: CompleteTaskRequest,
    ) -> TaskLifecycleResult<ReportOutcome> {
        let task_id = request.task_id();
        let worker = request.worker();
        let submission = request.into_submission()?;
        let outcome = self
            .run("complete_task", || self.plan_complete(task_id, worker, &submission))
            .await?;
        info!(%task_id, %worker, report_id = %outcome.report.id(), "task completed");
        Ok(outcome)
    }

    async fn plan_complete(
        &self,
        task_id: TaskId,
        worker: UserId,
        submission: &ReportSubmission,
    ) -> Planned<ReportOutcome> {
        let (mut task, mut assignment) = self.held_assignment(task_id, worker).await?;
        let (task_read, assignment_read) = (task.guard(), assignment.guard());
        let mut effects = Effects::default();
        let report = match self.store.report_for_assignment(assignment.id()).await? {
            Some(mut previous) => {
                let report_read = previous.guard();
                previous.resubmit(submission.clone(), &*self.clock)?;
                effects.changes.update_report(previous.clone(), report_read);
                previous
            }
            None => {
                let fresh = Report::submit(assignment.id(), submission.clone(), &*self.clock);
                effects.changes.insert_report(fresh.clone());
                fresh
            }
        };
        assignment.complete(&*self.clock)?;
        task.complete(&*self.clock)?;
        effects.changes.update_assignment(assignment.clone(), assignment_read);
        effects.changes.update_task(task.clone(), task_read);
        effects.notify(self.notice(
            task.created_by(),
            NotificationKind::ReportSubmitted,
            "Completion report submitted",
            format!("A completion report was submitted for \"{}\".", task.title()),
            task.id(),
        ));
        Ok((
            effects,
            ReportOutcome {
                task,
                assignment,
                report,
            },
        ))
    }

    /// Records an administrator's decision on a pending report.
    ///
    /// Approval credits the worker's `tasks_completed` counter. Rejection
    /// reopens the task for the same worker without consulting the
    /// assignment engine. Needs-correction only marks the report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::ReportNotFound`] for unknown reports,
    /// [`TaskLifecycleError::Domain`] when the report was already reviewed,
    /// and [`TaskLifecycleError::WorkerNotEligible`] when a rejection would
    /// reopen the task for a worker already at capacity.
    pub async fn review_report(
        &self,
        request: ReviewReportRequest,
    ) -> TaskLifecycleResult<ReportOutcome> {
        let ReviewReportRequest {
            report_id,
            reviewer,
            decision,
            notes,
        } = request;
        let outcome = self
            .run("review_report", || {
                self.plan_review(report_id, reviewer, decision, &notes)
            })
            .await?;
        info!(
            %report_id,
            %reviewer,
            decision = decision.resulting_status().as_str(),
            "report reviewed"
        );
        Ok(outcome)
    }

    async fn plan_review(
        &self,
        report_id: ReportId,
        reviewer: UserId,
        decision: ReviewDecision,
        notes: &str,
    ) -> Planned<ReportOutcome> {
        let mut report = self
            .store
            .find_report(report_id)
            .await?
            .ok_or(TaskLifecycleError::ReportNotFound(report_id))?;
        let assignment_id = report.assignment_id();
        let mut assignment = self
            .store
            .find_assignment(assignment_id)
            .await?
            .ok_or(TaskStoreError::AssignmentNotFound(assignment_id))?;
        let mut task = self.load_task(assignment.task_id()).await?;
        let worker = assignment.assignee();
        let (task_read, assignment_read, report_read) =
            (task.guard(), assignment.guard(), report.guard());
        let mut effects = Effects::default();

        report.review(decision, reviewer, notes, &*self.clock)?;
        match decision {
            ReviewDecision::Approve => {
                assignment.approve(reviewer, &*self.clock)?;
                effects.changes.update_assignment(assignment.clone(), assignment_read);
                effects.changes.increment(worker, WorkerCounter::Completed);
                effects.notify(self.notice(
                    worker,
                    NotificationKind::TaskApproved,
                    "Task approved",
                    format!("Your work on \"{}\" was approved.", task.title()),
                    task.id(),
                ));
            }
            ReviewDecision::Reject => {
                self.ensure_capacity(worker).await?;
                assignment.reopen()?;
                task.reopen_for_correction(&*self.clock)?;
                effects.changes.update_assignment(assignment.clone(), assignment_read);
                effects.changes.update_task(task.clone(), task_read);
                effects.notify(self.notice(
                    worker,
                    NotificationKind::SystemMessage,
                    "Report rejected",
                    format!(
                        "Your report for \"{}\" was rejected and the task is back in your queue. {notes}",
                        task.title()
                    ),
                    task.id(),
                ));
            }
            ReviewDecision::NeedsCorrection => {}
        }
        effects.changes.update_report(report.clone(), report_read);
        Ok((
            effects,
            ReportOutcome {
                task,
                assignment,
                report,
            },
        ))
    }

    /// Applies an administrator's edit and re-assigns when required.
    ///
    /// A difficulty change or an explicit [`Reassignment`] supersedes the
    /// current assignment. A manual target that fails validation aborts the
    /// whole edit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks,
    /// [`TaskLifecycleError::Domain`] for invalid edits or cancelled tasks,
    /// and [`TaskLifecycleError::WorkerNotFound`] or
    /// [`TaskLifecycleError::WorkerNotEligible`] for a rejected manual
    /// target.
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskLifecycleResult<TaskOutcome> {
        let UpdateTaskRequest {
            task_id,
            editor,
            edit,
            reassignment,
        } = request;
        let outcome = self
            .run("update_task", || {
                self.plan_update(task_id, editor, &edit, reassignment)
            })
            .await?;
        info!(
            %task_id,
            %editor,
            assignee = ?outcome.task.assigned_to(),
            "task updated"
        );
        Ok(outcome)
    }

    async fn plan_update(
        &self,
        task_id: TaskId,
        editor: UserId,
        edit: &TaskEdit,
        requested: Option<Reassignment>,
    ) -> Planned<TaskOutcome> {
        let mut task = self.load_task(task_id).await?;
        let task_read = task.guard();
        let difficulty_changed = task.apply_edit(edit.clone(), &*self.clock)?;
        let mut effects = Effects::default();

        let Some(reassignment) = requested
            .or_else(|| difficulty_changed.then_some(Reassignment::Automatic))
            .filter(|_| task.status() != TaskStatus::Completed)
        else {
            if requested.is_some() {
                return Err(TaskDomainError::InvalidTaskTransition {
                    task_id: task.id(),
                    from: task.status(),
                    to: TaskStatus::Assigned,
                }
                .into());
            }
            let assignment = self.store.active_assignment(task.id()).await?;
            effects.changes.update_task(task.clone(), task_read);
            return Ok((effects, TaskOutcome { task, assignment }));
        };

        let mut selection = Selection::any();
        if let Some(mut superseded) = self.store.active_assignment(task.id()).await? {
            let superseded_read = superseded.guard();
            superseded.cancel(&*self.clock)?;
            selection = selection.releasing(superseded.assignee());
            effects.changes.update_assignment(superseded, superseded_read);
            task.release_assignee(&*self.clock)?;
        }

        let decision = match reassignment {
            Reassignment::Manual(worker) => Some(
                self.engine
                    .validate_manual(&task, worker, editor, selection, &*self.clock)
                    .await?,
            ),
            Reassignment::Automatic => {
                self.engine
                    .auto_assign(&task, editor, selection, &*self.clock)
                    .await?
            }
        };
        let manual = matches!(reassignment, Reassignment::Manual(_));
        let assignment = decision
            .map(|chosen| self.bind(&mut task, chosen, &mut effects, manual))
            .transpose()?;
        effects.changes.update_task(task.clone(), task_read);
        Ok((effects, TaskOutcome { task, assignment }))
    }

    /// Withdraws a task that has not been completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the task is completed or already
    /// cancelled.
    pub async fn cancel_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self
            .run("cancel_task", || self.plan_cancel(task_id))
            .await?;
        info!(%task_id, "task cancelled");
        Ok(task)
    }

    async fn plan_cancel(&self, task_id: TaskId) -> Planned<Task> {
        let mut task = self.load_task(task_id).await?;
        let task_read = task.guard();
        let mut effects = Effects::default();
        task.cancel(&*self.clock)?;
        if let Some(mut active) = self.store.active_assignment(task_id).await? {
            let active_read = active.guard();
            active.cancel(&*self.clock)?;
            effects.changes.update_assignment(active, active_read);
        }
        effects.changes.update_task(task.clone(), task_read);
        Ok((effects, task))
    }

    /// Removes a task together with its assignments and reports.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks.
    pub async fn delete_task(&self, task_id: TaskId) -> TaskLifecycleResult<()> {
        self.store
            .delete_task(task_id)
            .await
            .map_err(|err| match err {
                TaskStoreError::TaskNotFound(missing) => TaskLifecycleError::TaskNotFound(missing),
                other => TaskLifecycleError::Store(other),
            })?;
        info!(%task_id, "task deleted");
        Ok(())
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the store query fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.store.find_task(task_id).await?)
    }

    /// Returns every assignment the task has had, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks.
    pub async fn task_history(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Assignment>> {
        self.load_task(task_id).await?;
        Ok(self.store.assignments_for_task(task_id).await?)
    }

    /// Returns tasks the worker holds or has held, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the store query fails.
    pub async fn tasks_for_worker(&self, worker: UserId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.store.tasks_for_worker(worker).await?)
    }

    /// Returns reports passing the filter, newest submission first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the store query fails.
    pub async fn list_reports(&self, filter: ReportFilter) -> TaskLifecycleResult<Vec<Report>> {
        Ok(self.store.list_reports(filter).await?)
    }

    async fn run<T, F, Fut>(&self, trigger: &'static str, mut plan: F) -> TaskLifecycleResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Planned<T>>,
    {
        let attempts = self.config.max_commit_attempts.max(1);
        for attempt in 1..=attempts {
            let (effects, outcome) = plan().await?;
            match self.store.commit(&effects.changes).await {
                Ok(()) => {
                    self.deliver(effects.notifications).await;
                    return Ok(outcome);
                }
                Err(err) if err.is_conflict() => {
                    debug!(trigger, attempt, error = %err, "commit lost a race; re-planning");
                }
                Err(err) => return Err(err.into()),
            }
        }
        warn!(trigger, attempts, "giving up after repeated commit conflicts");
        Err(TaskLifecycleError::ConcurrencyConflict { attempts })
    }

    async fn deliver(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            let recipient = notification.recipient;
            let kind = notification.kind;
            if let Err(err) = self.notifier.notify(notification).await {
                warn!(%recipient, kind = kind.as_str(), error = %err, "notification not delivered");
            }
        }
    }

    async fn load_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    /// Loads the task and its active assignment, checking that `worker`
    /// holds both.
    async fn held_assignment(
        &self,
        task_id: TaskId,
        worker: UserId,
    ) -> TaskLifecycleResult<(Task, Assignment)> {
        let task = self.load_task(task_id).await?;
        let not_assignee = TaskLifecycleError::NotAssignee {
            task_id,
            worker_id: worker,
        };
        if task.assigned_to() != Some(worker) {
            return Err(not_assignee);
        }
        let assignment = self
            .store
            .active_assignment(task_id)
            .await?
            .ok_or(TaskLifecycleError::NoActiveAssignment(task_id))?;
        if assignment.assignee() != worker {
            return Err(not_assignee);
        }
        Ok((task, assignment))
    }

    async fn ensure_capacity(&self, worker: UserId) -> TaskLifecycleResult<()> {
        let profile = self
            .directory
            .find_worker(worker)
            .await?
            .ok_or(TaskLifecycleError::WorkerNotFound(worker))?;
        let current_load = self.directory.current_load(worker).await?;
        if current_load >= profile.max_tasks() {
            return Err(TaskLifecycleError::WorkerNotEligible {
                worker_id: worker,
                reason: Ineligibility::AtCapacity {
                    current_load,
                    max_tasks: profile.max_tasks(),
                },
            });
        }
        Ok(())
    }

    fn bind(
        &self,
        task: &mut Task,
        decision: AssignmentDecision,
        effects: &mut Effects,
        reassigned: bool,
    ) -> TaskLifecycleResult<Assignment> {
        let worker = decision.worker_id();
        task.assign_to(worker, &*self.clock)?;
        let (title, message) = if reassigned {
            (
                "Task reassigned",
                format!("The task \"{}\" has been reassigned to you.", task.title()),
            )
        } else {
            (
                "New task assigned",
                format!("You have been assigned the task \"{}\".", task.title()),
            )
        };
        effects.notify(self.notice(
            worker,
            NotificationKind::TaskAssigned,
            title,
            message,
            task.id(),
        ));
        Ok(decision.record_into(&mut effects.changes))
    }

    fn notice(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: &str,
        message: String,
        task_id: TaskId,
    ) -> Notification {
        Notification::about_task(recipient, kind, title, message, task_id, &*self.clock)
    }
}

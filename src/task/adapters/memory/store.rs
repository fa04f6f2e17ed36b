//! In-memory task store and worker directory for tests and embedding.
//!
//! Both ports share one lock so that a commit's capacity check and its
//! writes observe the same worker loads.

use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        Assignment, AssignmentId, AssignmentStatus, PersistedWorkerData, Report, ReportFilter,
        ReportId, SkillTier, Task, TaskId, UserId, WorkerCandidate, WorkerProfile,
    },
    ports::{
        ChangeSet, Guarded, TaskStore, TaskStoreError, TaskStoreResult, WorkerDirectory,
        WorkerDirectoryError, WorkerDirectoryResult, Write,
    },
};

/// Thread-safe in-memory implementation of [`TaskStore`] and
/// [`WorkerDirectory`].
#[derive(Debug)]
pub struct InMemoryTaskStore<C: Clock + Send + Sync> {
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: C,
}

#[derive(Debug, Clone, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    assignments: HashMap<AssignmentId, Assignment>,
    reports: HashMap<ReportId, Report>,
    report_index: HashMap<AssignmentId, ReportId>,
    workers: HashMap<UserId, WorkerProfile>,
}

impl<C: Clock + Send + Sync> InMemoryTaskStore<C> {
    /// Creates an empty store stamping worker updates with `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, InMemoryTaskState>, std::io::Error> {
        self.state
            .read()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, InMemoryTaskState>, std::io::Error> {
        self.state
            .write()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

impl InMemoryTaskState {
    fn live_load(&self, worker: UserId) -> u32 {
        let count = self
            .assignments
            .values()
            .filter(|assignment| assignment.assignee() == worker && assignment.is_active())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn apply(&mut self, changes: &ChangeSet, clock: &impl Clock) -> TaskStoreResult<()> {
        if let Some(write) = changes.task() {
            self.apply_task(write)?;
        }
        for write in changes.assignments_in_apply_order() {
            self.apply_assignment(write)?;
        }
        if let Some(write) = changes.report() {
            self.apply_report(write)?;
        }
        for &(worker, counter) in changes.counters() {
            self.workers
                .get_mut(&worker)
                .ok_or(TaskStoreError::WorkerNotFound(worker))?
                .record(counter, clock);
        }
        Ok(())
    }

    fn apply_task(&mut self, write: &Write<Task>) -> TaskStoreResult<()> {
        let task = write.record();
        let stored = self.tasks.get(&task.id()).map(Guarded::guard);
        match (write.expected(), stored) {
            (None, Some(_)) => return Err(TaskStoreError::DuplicateTask(task.id())),
            (Some(_), None) => return Err(TaskStoreError::TaskNotFound(task.id())),
            (Some(expected), Some(found)) if expected != found => {
                return Err(TaskStoreError::stale_task(task.id()));
            }
            _ => {}
        }
        self.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    fn apply_assignment(&mut self, write: &Write<Assignment>) -> TaskStoreResult<()> {
        let assignment = write.record();
        let previous = self.assignments.get(&assignment.id()).map(Assignment::status);
        match (write.expected(), previous) {
            (None, Some(_)) => {
                return Err(TaskStoreError::DuplicateAssignment(assignment.id()));
            }
            (Some(_), None) => {
                return Err(TaskStoreError::AssignmentNotFound(assignment.id()));
            }
            (Some(expected), Some(found)) if expected != found => {
                return Err(TaskStoreError::stale_assignment(assignment.id()));
            }
            _ => {}
        }
        if !self.tasks.contains_key(&assignment.task_id()) {
            return Err(TaskStoreError::TaskNotFound(assignment.task_id()));
        }

        let becomes_active =
            assignment.is_active() && !previous.is_some_and(AssignmentStatus::is_active);
        if becomes_active {
            self.check_activation(assignment)?;
        }
        self.assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    fn check_activation(&self, assignment: &Assignment) -> TaskStoreResult<()> {
        let other_active = self.assignments.values().any(|existing| {
            existing.task_id() == assignment.task_id()
                && existing.id() != assignment.id()
                && existing.is_active()
        });
        if other_active {
            return Err(TaskStoreError::ActiveAssignmentExists(assignment.task_id()));
        }

        let worker = self
            .workers
            .get(&assignment.assignee())
            .ok_or(TaskStoreError::WorkerNotFound(assignment.assignee()))?;
        if self.live_load(worker.user_id()) >= worker.max_tasks() {
            return Err(TaskStoreError::CapacityExceeded {
                worker_id: worker.user_id(),
            });
        }
        Ok(())
    }

    fn apply_report(&mut self, write: &Write<Report>) -> TaskStoreResult<()> {
        let report = write.record();
        match write {
            Write::Insert(_) => {
                if self.report_index.contains_key(&report.assignment_id()) {
                    return Err(TaskStoreError::DuplicateReport(report.assignment_id()));
                }
                if !self.assignments.contains_key(&report.assignment_id()) {
                    return Err(TaskStoreError::AssignmentNotFound(report.assignment_id()));
                }
            }
            Write::Update { expected, .. } => {
                let stored = self
                    .reports
                    .get(&report.id())
                    .ok_or(TaskStoreError::ReportNotFound(report.id()))?;
                if stored.status() != *expected {
                    return Err(TaskStoreError::stale_report(report.id()));
                }
            }
        }
        self.report_index.insert(report.assignment_id(), report.id());
        self.reports.insert(report.id(), report.clone());
        Ok(())
    }

    fn sorted_assignments(&self, task_id: TaskId) -> Vec<Assignment> {
        let mut history: Vec<Assignment> = self
            .assignments
            .values()
            .filter(|assignment| assignment.task_id() == task_id)
            .cloned()
            .collect();
        history.sort_by_key(Assignment::assigned_at);
        history
    }
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| std::cmp::Reverse(task.created_at()));
    tasks
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskStore for InMemoryTaskStore<C> {
    async fn find_task(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> TaskStoreResult<Vec<Task>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(newest_first(state.tasks.values().cloned().collect()))
    }

    async fn tasks_for_worker(&self, worker: UserId) -> TaskStoreResult<Vec<Task>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        let tasks = state
            .tasks
            .values()
            .filter(|task| {
                task.assigned_to() == Some(worker)
                    || state.assignments.values().any(|assignment| {
                        assignment.task_id() == task.id() && assignment.assignee() == worker
                    })
            })
            .cloned()
            .collect();
        Ok(newest_first(tasks))
    }

    async fn find_assignment(&self, id: AssignmentId) -> TaskStoreResult<Option<Assignment>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state.assignments.get(&id).cloned())
    }

    async fn active_assignment(&self, task_id: TaskId) -> TaskStoreResult<Option<Assignment>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state
            .assignments
            .values()
            .find(|assignment| assignment.task_id() == task_id && assignment.is_active())
            .cloned())
    }

    async fn assignments_for_task(&self, task_id: TaskId) -> TaskStoreResult<Vec<Assignment>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state.sorted_assignments(task_id))
    }

    async fn find_report(&self, id: ReportId) -> TaskStoreResult<Option<Report>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state.reports.get(&id).cloned())
    }

    async fn report_for_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> TaskStoreResult<Option<Report>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        Ok(state
            .report_index
            .get(&assignment_id)
            .and_then(|report_id| state.reports.get(report_id))
            .cloned())
    }

    async fn list_reports(&self, filter: ReportFilter) -> TaskStoreResult<Vec<Report>> {
        let state = self.read().map_err(TaskStoreError::persistence)?;
        let mut reports: Vec<Report> = state
            .reports
            .values()
            .filter(|report| filter.matches(report.status()))
            .cloned()
            .collect();
        reports.sort_by_key(|report| std::cmp::Reverse(report.submitted_at()));
        Ok(reports)
    }

    async fn commit(&self, changes: &ChangeSet) -> TaskStoreResult<()> {
        let mut state = self.write().map_err(TaskStoreError::persistence)?;
        let mut staged = state.clone();
        staged.apply(changes, &self.clock)?;
        *state = staged;
        Ok(())
    }

    async fn delete_task(&self, id: TaskId) -> TaskStoreResult<()> {
        let mut state = self.write().map_err(TaskStoreError::persistence)?;
        state
            .tasks
            .remove(&id)
            .ok_or(TaskStoreError::TaskNotFound(id))?;

        let removed: Vec<AssignmentId> = state
            .assignments
            .values()
            .filter(|assignment| assignment.task_id() == id)
            .map(Assignment::id)
            .collect();
        for assignment_id in removed {
            state.assignments.remove(&assignment_id);
            if let Some(report_id) = state.report_index.remove(&assignment_id) {
                state.reports.remove(&report_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> WorkerDirectory for InMemoryTaskStore<C> {
    async fn register_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()> {
        let mut state = self.write().map_err(WorkerDirectoryError::persistence)?;
        if state.workers.contains_key(&profile.user_id()) {
            return Err(WorkerDirectoryError::DuplicateWorker(profile.user_id()));
        }
        state.workers.insert(profile.user_id(), profile.clone());
        Ok(())
    }

    async fn update_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()> {
        let mut state = self.write().map_err(WorkerDirectoryError::persistence)?;
        let stored = state
            .workers
            .get_mut(&profile.user_id())
            .ok_or(WorkerDirectoryError::WorkerNotFound(profile.user_id()))?;
        *stored = WorkerProfile::from_persisted(PersistedWorkerData {
            user_id: profile.user_id(),
            display_name: profile.display_name().to_owned(),
            skill_tier: profile.skill_tier(),
            is_active_worker: profile.is_active_worker(),
            max_tasks: profile.max_tasks(),
            stats: stored.stats(),
            created_at: stored.created_at(),
            updated_at: profile.updated_at(),
        });
        Ok(())
    }

    async fn find_worker(&self, worker: UserId) -> WorkerDirectoryResult<Option<WorkerProfile>> {
        let state = self.read().map_err(WorkerDirectoryError::persistence)?;
        Ok(state.workers.get(&worker).cloned())
    }

    async fn list_workers(&self) -> WorkerDirectoryResult<Vec<WorkerProfile>> {
        let state = self.read().map_err(WorkerDirectoryError::persistence)?;
        let mut workers: Vec<WorkerProfile> = state.workers.values().cloned().collect();
        workers.sort_by_key(WorkerProfile::user_id);
        Ok(workers)
    }

    async fn find_eligible_workers(
        &self,
        tier: SkillTier,
    ) -> WorkerDirectoryResult<Vec<WorkerCandidate>> {
        let state = self.read().map_err(WorkerDirectoryError::persistence)?;
        let mut candidates: Vec<WorkerCandidate> = state
            .workers
            .values()
            .filter(|profile| profile.skill_tier() == tier && profile.is_active_worker())
            .map(|profile| {
                WorkerCandidate::from_profile(profile, state.live_load(profile.user_id()))
            })
            .collect();
        candidates.sort_by_key(|candidate| {
            (
                candidate.current_load,
                candidate.rejected_count,
                candidate.worker_id,
            )
        });
        Ok(candidates)
    }

    async fn current_load(&self, worker: UserId) -> WorkerDirectoryResult<u32> {
        let state = self.read().map_err(WorkerDirectoryError::persistence)?;
        if !state.workers.contains_key(&worker) {
            return Err(WorkerDirectoryError::WorkerNotFound(worker));
        }
        Ok(state.live_load(worker))
    }
}

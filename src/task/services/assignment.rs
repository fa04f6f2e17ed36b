//! Assignment engine selecting the least-loaded qualified worker.
//!
//! Candidates come from the [`WorkerDirectory`] and are ordered by live
//! load, then by historical rejection count, then by worker identifier so
//! that the same snapshot always yields the same worker. Each candidate's
//! load is re-read before it is chosen because other triggers may have
//! assigned work to it since the directory query. The final guard against
//! exceeding a cap is the store's commit-time check.

use crate::task::{
    domain::{
        Assignment, AssignmentOrigin, Ineligibility, SkillTier, Task, UserId, WorkerCandidate,
        WorkerCounter,
    },
    ports::{ChangeSet, WorkerDirectory, WorkerDirectoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while choosing or validating an assignee.
#[derive(Debug, Error)]
pub enum AssignmentEngineError {
    /// The directory could not be queried.
    #[error(transparent)]
    Directory(#[from] WorkerDirectoryError),

    /// The explicitly named worker does not exist.
    #[error("worker not found: {0}")]
    WorkerNotFound(UserId),

    /// The explicitly named worker cannot take the task.
    #[error("worker {worker_id} cannot take the task: {reason}")]
    NotEligible {
        /// Rejected worker.
        worker_id: UserId,
        /// Why the worker was rejected.
        reason: Ineligibility,
    },
}

/// Result type for assignment engine operations.
pub type AssignmentEngineResult<T> = Result<T, AssignmentEngineError>;

/// A chosen worker together with the assignment record binding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDecision {
    worker_id: UserId,
    assignment: Assignment,
}

impl AssignmentDecision {
    /// Returns the chosen worker.
    #[must_use]
    pub const fn worker_id(&self) -> UserId {
        self.worker_id
    }

    /// Returns the new assignment record.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Adds the assignment and the worker's `tasks_assigned` increment to a
    /// change set, returning the assignment.
    pub fn record_into(self, changes: &mut ChangeSet) -> Assignment {
        changes.insert_assignment(self.assignment.clone());
        changes.increment(self.worker_id, WorkerCounter::Assigned);
        self.assignment
    }
}

/// Constraints on a single selection.
///
/// A trigger that supersedes the task's current assignment in the same
/// commit names that worker as `released`; their live load is counted one
/// lower because the superseded assignment stops being active on commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection<'a> {
    excluded: &'a [UserId],
    released: Option<UserId>,
}

impl<'a> Selection<'a> {
    /// Considers every qualified worker.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            excluded: &[],
            released: None,
        }
    }

    /// Never selects the listed workers.
    #[must_use]
    pub const fn excluding(mut self, excluded: &'a [UserId]) -> Self {
        self.excluded = excluded;
        self
    }

    /// Counts one fewer active assignment for `worker`.
    #[must_use]
    pub const fn releasing(mut self, worker: UserId) -> Self {
        self.released = Some(worker);
        self
    }

    fn allows(&self, worker: UserId) -> bool {
        !self.excluded.contains(&worker)
    }

    fn effective_load(&self, worker: UserId, live_load: u32) -> u32 {
        if self.released == Some(worker) {
            live_load.saturating_sub(1)
        } else {
            live_load
        }
    }
}

/// Automatic and manual assignee selection.
#[derive(Clone)]
pub struct AssignmentEngine<D>
where
    D: WorkerDirectory,
{
    directory: Arc<D>,
}

impl<D> AssignmentEngine<D>
where
    D: WorkerDirectory,
{
    /// Creates an engine backed by the given directory.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Returns the first candidate of `tier` that still has capacity under
    /// the given selection constraints.
    ///
    /// Returns `Ok(None)` when nobody qualifies, which is an ordinary
    /// outcome rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentEngineError::Directory`] when the directory
    /// cannot be queried.
    pub async fn select(
        &self,
        tier: SkillTier,
        selection: Selection<'_>,
    ) -> AssignmentEngineResult<Option<WorkerCandidate>> {
        let mut candidates: Vec<WorkerCandidate> = self
            .directory
            .find_eligible_workers(tier)
            .await?
            .into_iter()
            .filter(|candidate| selection.allows(candidate.worker_id))
            .map(|candidate| WorkerCandidate {
                current_load: selection.effective_load(candidate.worker_id, candidate.current_load),
                ..candidate
            })
            .filter(WorkerCandidate::has_capacity)
            .collect();
        candidates.sort_by_key(|candidate| {
            (
                candidate.current_load,
                candidate.rejected_count,
                candidate.worker_id,
            )
        });

        for candidate in candidates {
            let live_load = selection.effective_load(
                candidate.worker_id,
                self.directory.current_load(candidate.worker_id).await?,
            );
            if live_load < candidate.max_tasks {
                return Ok(Some(WorkerCandidate {
                    current_load: live_load,
                    ..candidate
                }));
            }
            debug!(
                worker_id = %candidate.worker_id,
                live_load,
                max_tasks = candidate.max_tasks,
                "candidate filled up since directory query; skipping"
            );
        }
        Ok(None)
    }

    /// Chooses a worker for `task` and builds the assignment record.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentEngineError::Directory`] when the directory
    /// cannot be queried.
    pub async fn auto_assign(
        &self,
        task: &Task,
        assigner: UserId,
        selection: Selection<'_>,
        clock: &impl Clock,
    ) -> AssignmentEngineResult<Option<AssignmentDecision>> {
        let Some(candidate) = self.select(task.difficulty(), selection).await? else {
            debug!(task_id = %task.id(), tier = %task.difficulty(), "no eligible worker");
            return Ok(None);
        };
        let assignment = Assignment::new(
            task.id(),
            candidate.worker_id,
            assigner,
            AssignmentOrigin::Automatic,
            clock,
        );
        Ok(Some(AssignmentDecision {
            worker_id: candidate.worker_id,
            assignment,
        }))
    }

    /// Validates an administrator's explicit choice and builds the
    /// assignment record.
    ///
    /// Applies the same tier, availability, and capacity rules as
    /// automatic selection.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentEngineError::WorkerNotFound`] for unknown
    /// workers and [`AssignmentEngineError::NotEligible`] when the worker
    /// fails the eligibility check.
    pub async fn validate_manual(
        &self,
        task: &Task,
        worker_id: UserId,
        assigner: UserId,
        selection: Selection<'_>,
        clock: &impl Clock,
    ) -> AssignmentEngineResult<AssignmentDecision> {
        let profile = self
            .directory
            .find_worker(worker_id)
            .await?
            .ok_or(AssignmentEngineError::WorkerNotFound(worker_id))?;
        let live_load =
            selection.effective_load(worker_id, self.directory.current_load(worker_id).await?);
        profile
            .check_eligibility(task.difficulty(), live_load)
            .map_err(|reason| AssignmentEngineError::NotEligible { worker_id, reason })?;

        let assignment = Assignment::new(
            task.id(),
            worker_id,
            assigner,
            AssignmentOrigin::Manual,
            clock,
        );
        Ok(AssignmentDecision {
            worker_id,
            assignment,
        })
    }
}

//! Read-only aggregate statistics over tasks and workers.

use crate::task::{
    domain::{TaskStatus, UserId, WorkerProfile},
    ports::{TaskStore, TaskStoreError, WorkerDirectory, WorkerDirectoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while gathering statistics.
#[derive(Debug, Error)]
pub enum StatisticsError {
    /// Task store query failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// Worker directory query failed.
    #[error(transparent)]
    Directory(#[from] WorkerDirectoryError),
}

/// Number of tasks in each lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTotals {
    /// Tasks waiting for an assignee.
    pub pending: u64,
    /// Tasks bound to a worker who has not started.
    pub assigned: u64,
    /// Tasks being worked on.
    pub in_progress: u64,
    /// Tasks with a submitted report.
    pub completed: u64,
    /// Withdrawn tasks.
    pub cancelled: u64,
}

impl StatusTotals {
    const fn count(&mut self, status: TaskStatus) {
        let slot = match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::Assigned => &mut self.assigned,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Cancelled => &mut self.cancelled,
        };
        *slot = slot.saturating_add(1);
    }

    /// Returns the number of tasks across every status.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending
            .saturating_add(self.assigned)
            .saturating_add(self.in_progress)
            .saturating_add(self.completed)
            .saturating_add(self.cancelled)
    }

    /// Returns completed tasks as a whole percentage of all tasks, rounded
    /// down. An empty store reports zero.
    #[must_use]
    pub fn completion_rate(&self) -> u64 {
        self.completed
            .saturating_mul(100)
            .checked_div(self.total())
            .unwrap_or(0)
    }
}

/// One row of a worker ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRanking {
    /// Ranked worker.
    pub worker_id: UserId,
    /// Worker's display name.
    pub display_name: String,
    /// Counter value the ranking is ordered by.
    pub count: u64,
}

/// Snapshot returned by [`StatisticsService::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatistics {
    /// Per-status task counts.
    pub totals: StatusTotals,
    /// Completed tasks as a whole percentage of all tasks.
    pub completion_rate: u64,
    /// Registered worker profiles.
    pub worker_count: u64,
    /// Workers with the most approved completions.
    pub top_completers: Vec<WorkerRanking>,
    /// Workers with the most rejections.
    pub top_rejecters: Vec<WorkerRanking>,
}

/// Aggregates task totals and worker rankings.
#[derive(Clone)]
pub struct StatisticsService<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    store: Arc<S>,
    directory: Arc<D>,
    top_n: usize,
}

impl<S, D> StatisticsService<S, D>
where
    S: TaskStore,
    D: WorkerDirectory,
{
    /// Creates a statistics service returning `top_n` workers per ranking.
    #[must_use]
    pub const fn new(store: Arc<S>, directory: Arc<D>, top_n: usize) -> Self {
        Self {
            store,
            directory,
            top_n,
        }
    }

    /// Gathers the current statistics.
    ///
    /// Rankings only include workers whose counter is above zero; ties are
    /// broken by worker identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError`] when the store or directory cannot be
    /// queried.
    pub async fn snapshot(&self) -> Result<TaskStatistics, StatisticsError> {
        let mut totals = StatusTotals::default();
        for task in self.store.list_tasks().await? {
            totals.count(task.status());
        }
        let workers = self.directory.list_workers().await?;

        Ok(TaskStatistics {
            totals,
            completion_rate: totals.completion_rate(),
            worker_count: u64::try_from(workers.len()).unwrap_or(u64::MAX),
            top_completers: self.rank(&workers, |profile| profile.stats().tasks_completed),
            top_rejecters: self.rank(&workers, |profile| profile.stats().tasks_rejected),
        })
    }

    fn rank(
        &self,
        workers: &[WorkerProfile],
        counter: impl Fn(&WorkerProfile) -> u64,
    ) -> Vec<WorkerRanking> {
        let mut ranking: Vec<WorkerRanking> = workers
            .iter()
            .map(|profile| WorkerRanking {
                worker_id: profile.user_id(),
                display_name: profile.display_name().to_owned(),
                count: counter(profile),
            })
            .filter(|row| row.count > 0)
            .collect();
        ranking.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.worker_id.cmp(&right.worker_id))
        });
        ranking.truncate(self.top_n);
        ranking
    }
}

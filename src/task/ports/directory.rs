//! Worker directory port used by the assignment engine.

use crate::task::domain::{SkillTier, UserId, WorkerCandidate, WorkerProfile};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for worker directory operations.
pub type WorkerDirectoryResult<T> = Result<T, WorkerDirectoryError>;

/// Lookup and registration of worker profiles.
///
/// Loads reported by the directory are always live counts of active
/// assignments, never the historical `tasks_assigned` counter.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Stores a new worker profile.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerDirectoryError::DuplicateWorker`] when the worker is
    /// already registered.
    async fn register_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()>;

    /// Persists changes to a worker's tier, availability, or capacity.
    ///
    /// Statistics counters on `profile` are ignored; they change only
    /// through task store commits.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerDirectoryError::WorkerNotFound`] when the worker is
    /// unknown.
    async fn update_worker(&self, profile: &WorkerProfile) -> WorkerDirectoryResult<()>;

    /// Finds a worker profile.
    async fn find_worker(&self, worker: UserId) -> WorkerDirectoryResult<Option<WorkerProfile>>;

    /// Returns every registered worker profile.
    async fn list_workers(&self) -> WorkerDirectoryResult<Vec<WorkerProfile>>;

    /// Returns active workers of the given tier with their live loads.
    async fn find_eligible_workers(
        &self,
        tier: SkillTier,
    ) -> WorkerDirectoryResult<Vec<WorkerCandidate>>;

    /// Returns the live count of the worker's active assignments.
    async fn current_load(&self, worker: UserId) -> WorkerDirectoryResult<u32>;
}

/// Errors returned by worker directory implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkerDirectoryError {
    /// A profile for the worker already exists.
    #[error("duplicate worker: {0}")]
    DuplicateWorker(UserId),

    /// The worker was not found.
    #[error("worker not found: {0}")]
    WorkerNotFound(UserId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkerDirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

//! Worker capacity, qualification, and statistics.

use super::{SkillTier, TaskDomainError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of concurrently active assignments per worker.
pub const DEFAULT_MAX_TASKS: u32 = 5;

/// Historical statistics counter on a worker profile.
///
/// Counters only ever grow and never gate capacity; capacity is derived
/// from the live count of active assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCounter {
    /// A task was assigned to the worker.
    Assigned,
    /// A report by the worker was approved.
    Completed,
    /// The worker declined a task.
    Rejected,
}

/// Running per-worker totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Tasks ever assigned.
    pub tasks_assigned: u64,
    /// Reports ever approved.
    pub tasks_completed: u64,
    /// Tasks ever declined.
    pub tasks_rejected: u64,
}

impl WorkerStats {
    /// Increments one counter by exactly one.
    pub const fn record(&mut self, counter: WorkerCounter) {
        match counter {
            WorkerCounter::Assigned => self.tasks_assigned = self.tasks_assigned.saturating_add(1),
            WorkerCounter::Completed => {
                self.tasks_completed = self.tasks_completed.saturating_add(1);
            }
            WorkerCounter::Rejected => self.tasks_rejected = self.tasks_rejected.saturating_add(1),
        }
    }
}

/// Why a worker cannot take a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// The worker's tier differs from the task difficulty.
    TierMismatch {
        /// Tier the task requires.
        required: SkillTier,
        /// Tier the worker holds.
        actual: SkillTier,
    },
    /// The worker is not currently accepting work.
    Inactive,
    /// The worker already holds `max_tasks` active assignments.
    AtCapacity {
        /// Live active-assignment count.
        current_load: u32,
        /// Configured cap.
        max_tasks: u32,
    },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TierMismatch { required, actual } => {
                write!(f, "task requires {required}, worker is {actual}")
            }
            Self::Inactive => f.write_str("worker is not active"),
            Self::AtCapacity {
                current_load,
                max_tasks,
            } => write!(f, "worker holds {current_load} of {max_tasks} tasks"),
        }
    }
}

/// Per-worker capacity and statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerProfile {
    user_id: UserId,
    display_name: String,
    skill_tier: SkillTier,
    is_active_worker: bool,
    max_tasks: u32,
    stats: WorkerStats,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted worker profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkerData {
    /// Worker identity.
    pub user_id: UserId,
    /// Human-readable name used in notifications.
    pub display_name: String,
    /// Qualification tier.
    pub skill_tier: SkillTier,
    /// Whether the worker accepts new work.
    pub is_active_worker: bool,
    /// Concurrent assignment cap.
    pub max_tasks: u32,
    /// Historical counters.
    pub stats: WorkerStats,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WorkerProfile {
    /// Creates an active worker with the default capacity.
    #[must_use]
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        skill_tier: SkillTier,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            user_id,
            display_name: display_name.into(),
            skill_tier,
            is_active_worker: true,
            max_tasks: DEFAULT_MAX_TASKS,
            stats: WorkerStats::default(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a worker profile from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkerData) -> Self {
        Self {
            user_id: data.user_id,
            display_name: data.display_name,
            skill_tier: data.skill_tier,
            is_active_worker: data.is_active_worker,
            max_tasks: data.max_tasks,
            stats: data.stats,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Sets the concurrent assignment cap.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidMaxTasks`] when `max_tasks` is zero.
    pub fn with_max_tasks(mut self, max_tasks: u32) -> Result<Self, TaskDomainError> {
        if max_tasks == 0 {
            return Err(TaskDomainError::InvalidMaxTasks(self.user_id));
        }
        self.max_tasks = max_tasks;
        Ok(self)
    }

    /// Returns the worker identity.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the qualification tier.
    #[must_use]
    pub const fn skill_tier(&self) -> SkillTier {
        self.skill_tier
    }

    /// Returns whether the worker accepts new work.
    #[must_use]
    pub const fn is_active_worker(&self) -> bool {
        self.is_active_worker
    }

    /// Returns the concurrent assignment cap.
    #[must_use]
    pub const fn max_tasks(&self) -> u32 {
        self.max_tasks
    }

    /// Returns the historical counters.
    #[must_use]
    pub const fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Turns the worker's availability on or off.
    pub fn set_active(&mut self, active: bool, clock: &impl Clock) {
        self.is_active_worker = active;
        self.updated_at = clock.utc();
    }

    /// Moves the worker to another tier.
    pub fn set_skill_tier(&mut self, tier: SkillTier, clock: &impl Clock) {
        self.skill_tier = tier;
        self.updated_at = clock.utc();
    }

    /// Increments one statistics counter.
    pub fn record(&mut self, counter: WorkerCounter, clock: &impl Clock) {
        self.stats.record(counter);
        self.updated_at = clock.utc();
    }

    /// Checks whether the worker may take a task of `required` difficulty
    /// while holding `current_load` active assignments.
    ///
    /// # Errors
    ///
    /// Returns the first [`Ineligibility`] found, checking tier, then the
    /// active flag, then capacity.
    pub fn check_eligibility(
        &self,
        required: SkillTier,
        current_load: u32,
    ) -> Result<(), Ineligibility> {
        if self.skill_tier != required {
            return Err(Ineligibility::TierMismatch {
                required,
                actual: self.skill_tier,
            });
        }
        if !self.is_active_worker {
            return Err(Ineligibility::Inactive);
        }
        if current_load >= self.max_tasks {
            return Err(Ineligibility::AtCapacity {
                current_load,
                max_tasks: self.max_tasks,
            });
        }
        Ok(())
    }
}

/// Snapshot of a worker as seen by the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCandidate {
    /// Worker identity.
    pub worker_id: UserId,
    /// Live count of active assignments at query time.
    pub current_load: u32,
    /// Concurrent assignment cap.
    pub max_tasks: u32,
    /// Historical rejection count used as a tie-break.
    pub rejected_count: u64,
    /// Whether the worker accepts new work.
    pub is_active: bool,
}

impl WorkerCandidate {
    /// Builds a candidate from a profile and its live load.
    #[must_use]
    pub const fn from_profile(profile: &WorkerProfile, current_load: u32) -> Self {
        Self {
            worker_id: profile.user_id,
            current_load,
            max_tasks: profile.max_tasks,
            rejected_count: profile.stats.tasks_rejected,
            is_active: profile.is_active_worker,
        }
    }

    /// Returns `true` when the snapshot shows spare capacity.
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.is_active && self.current_load < self.max_tasks
    }
}

//! Shared world state for task assignment BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use eyre::eyre;
use foreman::task::{
    adapters::memory::{InMemoryNotificationInbox, InMemoryTaskStore},
    domain::{Assignment, Report, SkillTier, Task, UserId},
    services::{LifecycleConfig, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Store type used by the BDD world.
pub type TestStore = InMemoryTaskStore<DefaultClock>;

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskLifecycleService<TestStore, TestStore, InMemoryNotificationInbox, DefaultClock>;

/// Scenario world for task assignment behaviour tests.
pub struct AssignmentWorld {
    pub store: Arc<TestStore>,
    pub inbox: Arc<InMemoryNotificationInbox>,
    pub service: TestTaskService,
    pub admin: UserId,
    pub workers: HashMap<String, UserId>,
    pub task: Option<Task>,
    pub assignment: Option<Assignment>,
    pub report: Option<Report>,
    pub notifications_before: usize,
}

impl AssignmentWorld {
    /// Creates a world with an empty store and inbox.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new(DefaultClock));
        let inbox = Arc::new(InMemoryNotificationInbox::new());
        let service = TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&inbox),
            Arc::new(DefaultClock),
            LifecycleConfig::default(),
        );

        Self {
            store,
            inbox,
            service,
            admin: UserId::new(),
            workers: HashMap::new(),
            task: None,
            assignment: None,
            report: None,
            notifications_before: 0,
        }
    }

    /// Looks up a worker registered under `name`.
    pub fn worker(&self, name: &str) -> Result<UserId, eyre::Report> {
        self.workers
            .get(name)
            .copied()
            .ok_or_else(|| eyre!("no worker named {name} in scenario world"))
    }

    /// Returns the task the scenario is tracking.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre!("missing task in scenario world"))
    }

    /// Returns the report the scenario is tracking.
    pub fn report(&self) -> Result<&Report, eyre::Report> {
        self.report
            .as_ref()
            .ok_or_else(|| eyre!("missing report in scenario world"))
    }

    /// Remembers the inbox size so later steps can count new notifications.
    pub fn mark_inbox(&mut self) -> Result<(), eyre::Report> {
        self.notifications_before = self.inbox.all()?.len();
        Ok(())
    }
}

impl Default for AssignmentWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> AssignmentWorld {
    AssignmentWorld::default()
}

/// Parses a tier name used in feature files.
pub fn parse_tier(tier: &str) -> Result<SkillTier, eyre::Report> {
    SkillTier::try_from(tier).map_err(|err| eyre!("invalid tier in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use foreman::task::{
    adapters::memory::{InMemoryNotificationInbox, InMemoryTaskStore},
    domain::{SkillTier, UserId, WorkerProfile},
    ports::WorkerDirectory,
    services::{LifecycleConfig, StatisticsService, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Store type shared by the integration tests.
pub type TestStore = InMemoryTaskStore<DefaultClock>;

/// Lifecycle service wired to in-memory adapters.
pub type TestService =
    TaskLifecycleService<TestStore, TestStore, InMemoryNotificationInbox, DefaultClock>;

/// Store, inbox, and services sharing one in-memory state.
pub struct Backend {
    pub store: Arc<TestStore>,
    pub inbox: Arc<InMemoryNotificationInbox>,
    pub service: Arc<TestService>,
    pub admin: UserId,
}

impl Backend {
    /// Builds a backend with the given lifecycle configuration.
    #[must_use]
    pub fn with_config(config: LifecycleConfig) -> Self {
        let store = Arc::new(InMemoryTaskStore::new(DefaultClock));
        let inbox = Arc::new(InMemoryNotificationInbox::new());
        let service = Arc::new(TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&inbox),
            Arc::new(DefaultClock),
            config,
        ));
        Self {
            store,
            inbox,
            service,
            admin: UserId::new(),
        }
    }

    /// Returns a statistics service over the same store.
    #[must_use]
    pub fn statistics(&self) -> StatisticsService<TestStore, TestStore> {
        StatisticsService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            self.service.config().statistics_top_n,
        )
    }

    /// Registers an active worker and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when the capacity is zero or registration fails.
    pub async fn register(
        &self,
        name: &str,
        tier: SkillTier,
        max_tasks: u32,
    ) -> Result<UserId, eyre::Report> {
        let profile =
            WorkerProfile::new(UserId::new(), name, tier, &DefaultClock).with_max_tasks(max_tasks)?;
        self.store.register_worker(&profile).await?;
        Ok(profile.user_id())
    }
}

/// Provides a backend with default configuration.
#[fixture]
pub fn backend() -> Backend {
    Backend::with_config(LifecycleConfig::default())
}

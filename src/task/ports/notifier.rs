//! Outbound notification port.

use crate::task::domain::Notification;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Delivery of notifications produced by lifecycle transitions.
///
/// Delivery is fire-and-forget from the lifecycle's point of view: callers
/// log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hands a notification to the delivery mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the notification could not be
    /// accepted.
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError>;
}

/// Error returned when a notification cannot be accepted.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifierError(pub Arc<dyn std::error::Error + Send + Sync>);

impl NotifierError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

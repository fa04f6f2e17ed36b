//! In-memory notification inbox.

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Notification, NotificationId, UserId},
    ports::{Notifier, NotifierError},
};

/// Records every notification and serves per-user inbox queries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationInbox {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationInbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Notification>>, NotifierError> {
        self.notifications
            .read()
            .map_err(|err| NotifierError::delivery(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Notification>>, NotifierError> {
        self.notifications
            .write()
            .map_err(|err| NotifierError::delivery(std::io::Error::other(err.to_string())))
    }

    /// Returns every notification in delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the inbox lock is poisoned.
    pub fn all(&self) -> Result<Vec<Notification>, NotifierError> {
        Ok(self.read()?.clone())
    }

    /// Returns a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the inbox lock is poisoned.
    pub fn for_user(&self, user: UserId) -> Result<Vec<Notification>, NotifierError> {
        let notifications = self.read()?;
        Ok(notifications
            .iter()
            .rev()
            .filter(|notification| notification.recipient == user)
            .cloned()
            .collect())
    }

    /// Returns how many of the user's notifications are unread.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the inbox lock is poisoned.
    pub fn unread_count(&self, user: UserId) -> Result<usize, NotifierError> {
        let notifications = self.read()?;
        Ok(notifications
            .iter()
            .filter(|notification| notification.recipient == user && !notification.is_read)
            .count())
    }

    /// Marks the given notifications of `user` as read.
    ///
    /// Identifiers belonging to other users are ignored. Returns how many
    /// notifications changed.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the inbox lock is poisoned.
    pub fn mark_read(&self, user: UserId, ids: &[NotificationId]) -> Result<usize, NotifierError> {
        let mut notifications = self.write()?;
        let mut changed = 0;
        for notification in notifications.iter_mut().filter(|notification| {
            notification.recipient == user && !notification.is_read && ids.contains(&notification.id)
        }) {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl Notifier for InMemoryNotificationInbox {
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        self.write()?.push(notification);
        Ok(())
    }
}

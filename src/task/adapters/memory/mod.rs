//! In-memory adapters for task assignment and lifecycle management.

mod notifications;
mod store;

pub use notifications::InMemoryNotificationInbox;
pub use store::InMemoryTaskStore;

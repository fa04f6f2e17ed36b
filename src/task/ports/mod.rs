//! Port contracts for task assignment and lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod directory;
pub mod notifier;
pub mod store;

pub use directory::{WorkerDirectory, WorkerDirectoryError, WorkerDirectoryResult};
pub use notifier::{Notifier, NotifierError};
pub use store::{
    ChangeSet, Guarded, RecordKind, TaskStore, TaskStoreError, TaskStoreResult, Write,
};

//! Foreman: task assignment backend.
//!
//! This crate provides the core of a task-assignment system: tiered
//! workers with concurrency caps, an assignment engine that balances load
//! across them, and a lifecycle state machine taking tasks from creation
//! through review.
//!
//! # Architecture
//!
//! Foreman follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task assignment, lifecycle tracking, and statistics

pub mod task;

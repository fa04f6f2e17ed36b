//! Task assignment and lifecycle management.
//!
//! Administrators create tasks that are bound to the least-loaded qualified
//! worker of the task's skill tier. Workers start, decline, or complete
//! their tasks; completions carry a report that an administrator reviews.
//! Every transition is committed atomically together with the worker
//! counters it affects. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! Adapter implementations for task assignment and lifecycle ports.

pub mod memory;
pub mod postgres;

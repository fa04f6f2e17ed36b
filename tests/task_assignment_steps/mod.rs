//! Step definitions for task assignment BDD scenarios.

mod given;
mod then;
mod when;
pub mod world;

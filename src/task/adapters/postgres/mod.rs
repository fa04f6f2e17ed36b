//! `PostgreSQL` adapters for task assignment persistence.

mod conversions;
mod models;
mod schema;
mod store;

pub use conversions::RowConversionError;
pub use store::{PostgresTaskStore, TaskPgPool};

//! Application services for task assignment and lifecycle orchestration.

mod assignment;
mod config;
mod lifecycle;
mod requests;
mod statistics;

pub use assignment::{
    AssignmentDecision, AssignmentEngine, AssignmentEngineError, AssignmentEngineResult,
    Selection,
};
pub use config::LifecycleConfig;
pub use lifecycle::{
    ReportOutcome, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, TaskOutcome,
};
pub use requests::{
    CompleteTaskRequest, CreateTaskRequest, Reassignment, RejectTaskRequest, ReviewReportRequest,
    UpdateTaskRequest,
};
pub use statistics::{
    StatisticsError, StatisticsService, StatusTotals, TaskStatistics, WorkerRanking,
};

//! Scheduler and job error types.

use thiserror::Error;

/// Registration-time errors. Fatal to startup.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Duplicate job name: {0}")]
    DuplicateJobName(String),

    #[error("Invalid interval for job {0}: must be positive")]
    InvalidInterval(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors a job run may surface.
///
/// Contained at the scheduler's per-job execution boundary; never
/// propagated across jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] pulse_gateway::GatewayError),

    #[error("Feed error: {0}")]
    Feed(#[from] pulse_feed::FeedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task error: {0}")]
    Task(String),
}

pub type JobResult<T> = Result<T, JobError>;

// Error handling framework

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("cron expression '{expression}' has no occurrence after {after}")]
    ScheduleExhausted {
        expression: String,
        after: DateTime<Utc>,
    },

    #[error(
        "first deadline {deadline} for '{expression}' is not in the future (anchored at {anchor})"
    )]
    InitialDeadlineInPast {
        expression: String,
        deadline: DateTime<Utc>,
        anchor: DateTime<Utc>,
    },
}

/// Container runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    #[error("container runtime API call failed: {0}")]
    Api(String),

    #[error("exec in container {container} failed: {reason}")]
    Exec { container: String, reason: String },
}

/// Scheduling loop errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("scheduling cycle ran with an empty job registry")]
    EmptyRegistry,
}

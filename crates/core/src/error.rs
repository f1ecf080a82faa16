//! Error types for schedsync core domain logic

use thiserror::Error;

/// Core schedule-pipeline errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Result type alias for schedule operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

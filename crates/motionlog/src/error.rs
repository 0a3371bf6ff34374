//! Error types for motionlog.
//!
//! This module defines all error types used throughout the motionlog crate,
//! providing detailed context for debugging and operator-facing messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::sample::InvalidReading;
use crate::state::SystemState;

/// The main error type for motionlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Initialization Errors ===
    /// The sensor driver could not be brought up.
    #[error("sensor '{name}' failed to initialize: {message}")]
    SensorInit {
        /// Name of the sensor driver.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The durable log could not be prepared at startup.
    #[error("failed to initialize log storage at {path}: {source}")]
    StorageInit {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Storage Errors ===
    /// The durable log could not be opened for appending.
    #[error("failed to open log {path} for append: {source}")]
    StorageOpen {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or syncing a record to the durable log failed.
    #[error("failed to write log {path}: {source}")]
    StorageWrite {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The durable log could not be read back.
    #[error("failed to read log {path}: {source}")]
    StorageRead {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Pipeline Errors ===
    /// A sensor sample failed validation.
    #[error("invalid reading: {0}")]
    InvalidReading(#[from] InvalidReading),

    /// A record could not be pushed because the channel was torn down.
    #[error("channel closed, record for cycle {cycle} dropped")]
    ChannelClosed {
        /// Cycle number of the dropped record.
        cycle: u64,
    },

    /// A system state transition was attempted that does not move forward.
    #[error("illegal state transition from {from} to {to}")]
    InvalidTransition {
        /// State the system was in.
        from: SystemState,
        /// State that was requested.
        to: SystemState,
    },

    /// Sampling stopped because the system left `Running` without a fault
    /// from the sensor.
    #[error("pipeline stopped in state {state} before any fault was detected")]
    Stopped {
        /// State the producer observed when it stopped.
        state: SystemState,
    },

    /// A line of the durable log could not be parsed as a record.
    #[error("malformed log record '{line}': {message}")]
    RecordParse {
        /// The offending line.
        line: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for motionlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a sensor initialization error.
    #[must_use]
    pub fn sensor_init(name: &'static str, message: impl Into<String>) -> Self {
        Self::SensorInit {
            name,
            message: message.into(),
        }
    }

    /// Create a record parse error.
    #[must_use]
    pub fn record_parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordParse {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Check if this error is fatal at startup.
    #[must_use]
    pub fn is_init_failure(&self) -> bool {
        matches!(self, Self::SensorInit { .. } | Self::StorageInit { .. })
    }

    /// Check if this error only costs a single record and the task may
    /// keep running.
    #[must_use]
    pub fn is_record_drop(&self) -> bool {
        matches!(
            self,
            Self::ChannelClosed { .. } | Self::StorageOpen { .. } | Self::StorageWrite { .. }
        )
    }
}

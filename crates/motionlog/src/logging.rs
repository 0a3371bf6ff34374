//! The monitoring stream.
//!
//! Operators follow the pipeline through `tracing` events written to stderr.
//! Messages keep the informal line tags the log has always used (`[TASK 1]`,
//! `[ERROR]`, `[INFO]`, `[ENTRY n]`); nothing downstream parses them. Stdout
//! is left to the CLI for reports.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for the monitoring stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// State changes, audit entries and faults.
    #[default]
    Normal,
    /// Adds per-record producer and persister progress.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Initialize the monitoring stream.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
/// Thread names are shown so producer and persister activity can be told
/// apart on a multi-threaded runtime.
///
/// # Examples
///
/// ```no_run
/// use motionlog::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let default_filter = format!("motionlog={}", verbosity.to_level_filter());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(true)
            .with_file(false)
            .with_line_number(false),
    );

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("motionlog=debug")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }

    #[tokio::test]
    async fn test_pipeline_events_with_subscriber_installed() {
        use std::sync::Arc;
        use std::time::Duration;

        use crate::pipeline::Pipeline;
        use crate::test_support::{nan_sample, resting, MemoryStorage, ScriptedSensor};

        init_test_logging();

        let sensor = ScriptedSensor::new([resting(0.0), resting(0.1), nan_sample()]);
        let report = Pipeline::new(sensor, Arc::new(MemoryStorage::new()))
            .with_sample_period(Duration::from_millis(1))
            .with_recovery_wait(Duration::ZERO)
            .run()
            .await
            .unwrap();
        assert_eq!(report.audit.len(), 2);
    }
}

//! `motionlog` - Motion-sensor telemetry with fail-stop fault escalation
//!
//! This library samples a 6-axis motion sensor on a fixed period, hands each
//! reading to a storage task over a bounded channel and appends it durably to
//! a line-oriented log. The first untrustworthy reading escalates the system
//! through an audit dump and a stand-in recovery into a permanent halt.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod escalation;
pub mod logging;
pub mod persister;
pub mod pipeline;
pub mod producer;
pub mod record;
pub mod sample;
pub mod sensor;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Error, Result};
pub use escalation::HaltReport;
pub use logging::init_logging;
pub use pipeline::Pipeline;
pub use record::LogRecord;
pub use sample::{InvalidReading, SensorSample};
pub use sensor::SensorDriver;
pub use state::{SharedState, SystemState};
pub use storage::{FileStorage, LogStats, LogStorage};

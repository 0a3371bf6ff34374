//! Configuration management for motionlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensor::SimulatedSensorConfig;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "motionlog";

/// Default log file name.
const LOG_FILE_NAME: &str = "motion_log.txt";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MOTIONLOG_`, sections split by `__`)
/// 2. TOML config file at `~/.config/motionlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Sampling and channel configuration.
    pub pipeline: PipelineConfig,
    /// Fault escalation configuration.
    pub escalation: EscalationConfig,
    /// Simulated sensor configuration.
    pub sensor: SensorConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the durable log file.
    /// Defaults to `~/.local/share/motionlog/motion_log.txt`
    pub log_path: Option<PathBuf>,
}

/// Pipeline-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interval between sensor reads in milliseconds.
    pub sample_period_ms: u64,
    /// Number of records the channel holds before the producer stalls.
    pub channel_capacity: usize,
    /// Runtime worker threads; two lets producer and persister run in parallel.
    pub worker_threads: usize,
}

/// Escalation-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Length of the stand-in repositioning wait in milliseconds.
    pub recovery_wait_ms: u64,
}

/// Simulated sensor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Seed for the noise generator.
    pub seed: u64,
    /// Peak noise added to each component.
    pub noise: f32,
    /// Cycle on which a NaN reading is injected.
    pub fault_at_cycle: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 1_000,
            channel_capacity: crate::channel::DEFAULT_CAPACITY,
            worker_threads: 2,
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            recovery_wait_ms: 2_000,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        let sim = SimulatedSensorConfig::default();
        Self {
            seed: sim.seed,
            noise: sim.noise,
            fault_at_cycle: sim.fault_at_read,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `MOTIONLOG_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("MOTIONLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.sample_period_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "sample_period_ms must be greater than 0".to_string(),
            });
        }

        if self.pipeline.channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "channel_capacity must be greater than 0".to_string(),
            });
        }

        if self.pipeline.worker_threads == 0 {
            return Err(Error::ConfigValidation {
                message: "worker_threads must be greater than 0".to_string(),
            });
        }

        if !self.sensor.noise.is_finite() || self.sensor.noise < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "sensor noise must be finite and non-negative, got {}",
                    self.sensor.noise
                ),
            });
        }

        if self.sensor.fault_at_cycle == Some(0) {
            return Err(Error::ConfigValidation {
                message: "fault_at_cycle counts from 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get the log path, resolving defaults if not set.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.storage
            .log_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOG_FILE_NAME))
    }

    /// Get the sample period as a Duration.
    #[must_use]
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.pipeline.sample_period_ms)
    }

    /// Get the recovery wait as a Duration.
    #[must_use]
    pub fn recovery_wait(&self) -> Duration {
        Duration::from_millis(self.escalation.recovery_wait_ms)
    }

    /// Get the simulated sensor settings.
    #[must_use]
    pub fn simulated_sensor(&self) -> SimulatedSensorConfig {
        SimulatedSensorConfig {
            seed: self.sensor.seed,
            noise: self.sensor.noise,
            fault_at_read: self.sensor.fault_at_cycle,
        }
    }
}

//! The telemetry pipeline session.
//!
//! A [`Pipeline`] owns everything one run needs: the sensor, the log
//! storage, the shared [`SystemState`](crate::state::SystemState) and the
//! timing settings. [`Pipeline::run`] brings both collaborators up, spawns
//! the producer and persister tasks and returns once the system has halted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::channel::{self, DEFAULT_CAPACITY};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::escalation::{FaultEscalation, HaltReport, DEFAULT_RECOVERY_WAIT};
use crate::persister::StoragePersister;
use crate::producer::{SampleProducer, DEFAULT_SAMPLE_PERIOD};
use crate::sensor::SensorDriver;
use crate::state::SharedState;
use crate::storage::LogStorage;

/// One run of the telemetry pipeline.
pub struct Pipeline<S> {
    sensor: S,
    storage: Arc<dyn LogStorage>,
    state: SharedState,
    sample_period: Duration,
    channel_capacity: usize,
    recovery_wait: Duration,
}

impl<S: SensorDriver + 'static> Pipeline<S> {
    /// Create a pipeline with default timing and capacity.
    #[must_use]
    pub fn new(sensor: S, storage: Arc<dyn LogStorage>) -> Self {
        Self {
            sensor,
            storage,
            state: SharedState::new(),
            sample_period: DEFAULT_SAMPLE_PERIOD,
            channel_capacity: DEFAULT_CAPACITY,
            recovery_wait: DEFAULT_RECOVERY_WAIT,
        }
    }

    /// Create a pipeline using the timing and capacity from `config`.
    #[must_use]
    pub fn from_config(config: &Config, sensor: S, storage: Arc<dyn LogStorage>) -> Self {
        Self::new(sensor, storage)
            .with_sample_period(config.sample_period())
            .with_channel_capacity(config.pipeline.channel_capacity)
            .with_recovery_wait(config.recovery_wait())
    }

    /// Set the time between sensor reads.
    #[must_use]
    pub fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period = period;
        self
    }

    /// Set the number of records the channel holds.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the stand-in repositioning wait.
    #[must_use]
    pub fn with_recovery_wait(mut self, wait: Duration) -> Self {
        self.recovery_wait = wait;
        self
    }

    /// A handle to the shared system state.
    #[must_use]
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Run until the system halts.
    ///
    /// Returns through fault escalation, or once the shared state is moved
    /// out of `Running` from outside. With a healthy sensor and nobody
    /// touching the state this never completes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero sample period or channel
    /// capacity, or an init failure if the sensor or storage cannot be
    /// brought up. No task is started in those cases. Returns
    /// [`Error::Stopped`] if sampling ended without a fault, and an internal
    /// error if a task dies unexpectedly.
    pub async fn run(mut self) -> Result<HaltReport> {
        if self.sample_period.is_zero() {
            return Err(Error::ConfigValidation {
                message: "sample period must be greater than 0".to_string(),
            });
        }
        if let Err(err) = self.sensor.initialize().await {
            error!(sensor = self.sensor.name(), error = %err, "[ERROR] Sensor not available");
            return Err(err);
        }
        if let Err(err) = self.storage.initialize().await {
            error!(location = %self.storage.location(), error = %err, "[ERROR] Storage initialization failed");
            return Err(err);
        }

        let (tx, rx) = channel::bounded(self.channel_capacity)?;

        let persister = tokio::spawn(
            StoragePersister::new(Arc::clone(&self.storage), rx, self.state.clone()).run(),
        );

        let producer = SampleProducer::new(self.sensor, self.sample_period, self.state.clone());
        let state = self.state.clone();
        let escalation = FaultEscalation::new(self.state, self.storage, self.recovery_wait);
        let producer = tokio::spawn(async move {
            let Some(fault) = producer.run(tx).await else {
                let stats = match persister.await {
                    Ok(stats) => stats,
                    Err(err) => {
                        return Err(Error::internal(format!("persister task failed: {err}")));
                    }
                };
                info!(
                    persisted = stats.persisted,
                    dropped = stats.dropped,
                    "Pipeline stopped without a fault"
                );
                return Err(Error::Stopped { state: state.get() });
            };
            escalation.escalate(fault, persister).await
        });

        info!(
            capacity = self.channel_capacity,
            "Pipeline started: producer and persister running"
        );

        producer
            .await
            .map_err(|err| Error::internal(format!("producer task failed: {err}")))?
    }
}

impl<S> fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("location", &self.storage.location())
            .field("state", &self.state.get())
            .field("sample_period", &self.sample_period)
            .field("channel_capacity", &self.channel_capacity)
            .field("recovery_wait", &self.recovery_wait)
            .finish_non_exhaustive()
    }
}

//! Sample producer task.
//!
//! Reads the sensor once per period, stamps each reading with a cycle
//! number, validates it and pushes it to the channel. The producer owns the
//! cycle counter and the initial-pose latch outright; nothing else writes
//! them.
//!
//! The first invalid reading ends sampling for good. The producer hands back
//! a [`Fault`] describing it, and its channel sender is dropped on the way
//! out so the persister can drain and stop. Sampling also ends, without a
//! fault, as soon as the shared system state leaves `Running`.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::channel::RecordSender;
use crate::record::LogRecord;
use crate::sample::{InvalidReading, SensorSample};
use crate::sensor::SensorDriver;
use crate::state::SharedState;

/// Default time between sensor reads.
pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Acceleration vector of the first sample that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialPose {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl From<&SensorSample> for InitialPose {
    fn from(sample: &SensorSample) -> Self {
        let [x, y, z] = sample.accel;
        Self { x, y, z }
    }
}

impl std::fmt::Display for InitialPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X={} Y={} Z={}", self.x, self.y, self.z)
    }
}

/// Write-once holder for the [`InitialPose`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseLatch {
    pose: Option<InitialPose>,
}

impl PoseLatch {
    /// Latch `sample` if nothing has been latched yet.
    ///
    /// Returns `true` only on the call that set the pose.
    pub fn latch(&mut self, sample: &SensorSample) -> bool {
        if self.pose.is_some() {
            return false;
        }
        self.pose = Some(InitialPose::from(sample));
        true
    }

    /// The latched pose, if any.
    #[must_use]
    pub const fn get(&self) -> Option<InitialPose> {
        self.pose
    }
}

/// Counters kept by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProducerStats {
    /// Sensor reads taken, valid or not.
    pub sampled: u64,
    /// Records accepted by the channel.
    pub sent: u64,
    /// Records lost because the channel was torn down.
    pub dropped: u64,
}

/// The invalid reading that stopped the producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fault {
    /// Cycle on which the invalid reading was taken.
    pub cycle: u64,
    /// What was wrong with it.
    pub reading: InvalidReading,
    /// The rejected sample.
    pub sample: SensorSample,
    /// Pose latched before the fault, if any sample was ever valid.
    pub initial_pose: Option<InitialPose>,
    /// Producer counters at the time of the fault.
    pub stats: ProducerStats,
}

/// Producer side of the pipeline.
#[derive(Debug)]
pub struct SampleProducer<S> {
    sensor: S,
    period: Duration,
    state: SharedState,
    cycle: u64,
    pose: PoseLatch,
    stats: ProducerStats,
}

impl<S: SensorDriver> SampleProducer<S> {
    /// Create a producer reading `sensor` every `period` while `state` is
    /// `Running`.
    ///
    /// `period` must be non-zero.
    #[must_use]
    pub fn new(sensor: S, period: Duration, state: SharedState) -> Self {
        Self {
            sensor,
            period,
            state,
            cycle: 0,
            pose: PoseLatch::default(),
            stats: ProducerStats::default(),
        }
    }

    /// Sample until the first invalid reading and return it.
    ///
    /// Returns `None` if the system left `Running` first; the state is
    /// checked before every read. Takes ownership of `tx`; it is dropped
    /// when this returns.
    pub async fn run(mut self, tx: RecordSender) -> Option<Fault> {
        info!(
            sensor = self.sensor.name(),
            period_ms = self.period.as_millis(),
            "[TASK 1] Producer running"
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.state.is_running() {
                warn!(
                    state = %self.state.get(),
                    cycle = self.cycle,
                    "[TASK 1] System no longer running, sampling stopped"
                );
                return None;
            }
            if let Err(fault) = self.step(&tx).await {
                return Some(fault);
            }
        }
    }

    /// One read/validate/push cycle.
    async fn step(&mut self, tx: &RecordSender) -> Result<(), Fault> {
        let sample = self.sensor.read().await;
        self.cycle += 1;
        self.stats.sampled += 1;
        let cycle = self.cycle;

        if let Err(reading) = sample.validate() {
            error!(cycle, %reading, "[ERROR] Sensor data invalid! Stopping system...");
            return Err(Fault {
                cycle,
                reading,
                sample,
                initial_pose: self.pose.get(),
                stats: self.stats,
            });
        }

        if self.pose.latch(&sample) {
            info!(cycle, "[INFO] Initial position set");
        }

        let record = LogRecord::new(cycle, sample);
        match tx.push(record).await {
            Ok(()) => {
                self.stats.sent += 1;
                debug!(cycle, "[TASK 1 -> QUEUE] Data sent: {record}");
            }
            Err(err) => {
                self.stats.dropped += 1;
                error!(cycle, error = %err, "[TASK 1 ERROR] Record lost");
            }
        }
        Ok(())
    }
}

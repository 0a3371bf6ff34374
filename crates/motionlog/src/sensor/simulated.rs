//! Simulated 6-axis motion sensor.
//!
//! Produces a device at rest: gravity along +Z plus bounded uniform noise on
//! every axis. The noise source is seeded, so two sensors built from the same
//! config produce the same stream. A fault can be injected on a chosen read
//! to exercise the escalation path without hardware.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::SensorDriver;
use crate::error::{Error, Result};
use crate::sample::SensorSample;

/// Standard gravity, m/s².
const GRAVITY: f32 = 9.81;

/// Configuration for [`SimulatedSensor`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSensorConfig {
    /// Seed for the noise generator.
    pub seed: u64,
    /// Peak noise added to each component. Must be finite and non-negative;
    /// [`SensorDriver::initialize`] rejects anything else and reads treat it
    /// as zero.
    pub noise: f32,
    /// 1-based read on which `ax` is reported as NaN.
    pub fault_at_read: Option<u64>,
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            noise: 0.05,
            fault_at_read: None,
        }
    }
}

/// A seeded stand-in for a real IMU.
#[derive(Debug)]
pub struct SimulatedSensor {
    config: SimulatedSensorConfig,
    rng: StdRng,
    reads: u64,
}

impl SimulatedSensor {
    /// Create a simulated sensor.
    #[must_use]
    pub fn new(config: SimulatedSensorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            reads: 0,
        }
    }

    /// Number of reads served so far.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn noise_is_valid(&self) -> bool {
        self.config.noise.is_finite() && self.config.noise >= 0.0
    }

    fn jitter(&mut self) -> f32 {
        let noise = self.config.noise;
        if !self.noise_is_valid() || noise <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-noise..=noise)
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(SimulatedSensorConfig::default())
    }
}

#[async_trait::async_trait]
impl SensorDriver for SimulatedSensor {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn initialize(&mut self) -> Result<()> {
        if !self.noise_is_valid() {
            return Err(Error::sensor_init(
                self.name(),
                format!(
                    "noise must be finite and non-negative, got {}",
                    self.config.noise
                ),
            ));
        }
        info!(
            seed = self.config.seed,
            noise = self.config.noise,
            "[OK] Simulated motion sensor ready"
        );
        if let Some(read) = self.config.fault_at_read {
            warn!(read, "Fault injection armed");
        }
        Ok(())
    }

    async fn read(&mut self) -> SensorSample {
        self.reads += 1;

        let accel = [self.jitter(), self.jitter(), GRAVITY + self.jitter()];
        let gyro = [self.jitter(), self.jitter(), self.jitter()];
        let mut sample = SensorSample::new(accel, gyro);

        if self.config.fault_at_read == Some(self.reads) {
            debug!(read = self.reads, "Injecting NaN on ax");
            sample.accel[0] = f32::NAN;
        }

        sample
    }
}

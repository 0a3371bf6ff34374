//! Sensor driver abstraction.
//!
//! The pipeline only needs two things from a motion sensor: a one-time
//! bring-up and an atomic 6-axis read. Bus access, calibration and range
//! configuration belong to the driver behind [`SensorDriver`].

mod simulated;

pub use simulated::{SimulatedSensor, SimulatedSensorConfig};

use crate::error::Result;
use crate::sample::SensorSample;

/// A trait for motion sensor drivers.
///
/// Implementors own the hardware (or simulation) and hand out one
/// [`SensorSample`] per call to [`read`](Self::read).
#[async_trait::async_trait]
pub trait SensorDriver: Send {
    /// The name of this driver (for logging).
    fn name(&self) -> &'static str;

    /// Bring the sensor up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SensorInit`](crate::Error::SensorInit) if the sensor
    /// is absent or refuses configuration. This is fatal at startup.
    async fn initialize(&mut self) -> Result<()>;

    /// Take one reading.
    ///
    /// Always returns a sample; values may be invalid and are checked by the
    /// caller.
    async fn read(&mut self) -> SensorSample;
}

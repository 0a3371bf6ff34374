//! Motion sensor samples and their validation rules.
//!
//! A [`SensorSample`] is one atomic read of a 6-axis motion sensor: three
//! acceleration components and three angular-rate components. Samples are
//! transient; they only become durable once wrapped in a
//! [`LogRecord`](crate::record::LogRecord).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest acceleration magnitude, per axis, that is still trusted.
///
/// Expressed in the engineering units reported by the sensor driver.
pub const ACCEL_LIMIT: f32 = 100.0;

/// One of the six sample components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Acceleration along X.
    AccelX,
    /// Acceleration along Y.
    AccelY,
    /// Acceleration along Z.
    AccelZ,
    /// Angular rate around X.
    GyroX,
    /// Angular rate around Y.
    GyroY,
    /// Angular rate around Z.
    GyroZ,
}

impl Axis {
    /// All axes in wire order.
    pub const ALL: [Self; 6] = [
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::GyroX,
        Self::GyroY,
        Self::GyroZ,
    ];

    /// Whether this axis carries acceleration.
    #[must_use]
    pub const fn is_accel(self) -> bool {
        matches!(self, Self::AccelX | Self::AccelY | Self::AccelZ)
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccelX => write!(f, "ax"),
            Self::AccelY => write!(f, "ay"),
            Self::AccelZ => write!(f, "az"),
            Self::GyroX => write!(f, "gx"),
            Self::GyroY => write!(f, "gy"),
            Self::GyroZ => write!(f, "gz"),
        }
    }
}

/// Why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReading {
    /// A component is NaN or infinite.
    #[error("{axis} is not finite ({value})")]
    NonFinite {
        /// The offending axis.
        axis: Axis,
        /// The value reported by the sensor.
        value: f32,
    },

    /// An acceleration component exceeds [`ACCEL_LIMIT`] in magnitude.
    #[error("|{axis}| = {value} exceeds {limit}")]
    AccelOutOfRange {
        /// The offending axis.
        axis: Axis,
        /// The value reported by the sensor.
        value: f32,
        /// The limit that was exceeded.
        limit: f32,
    },
}

impl InvalidReading {
    /// The axis that failed validation.
    #[must_use]
    pub const fn axis(&self) -> Axis {
        match self {
            Self::NonFinite { axis, .. } | Self::AccelOutOfRange { axis, .. } => *axis,
        }
    }
}

/// A single 6-axis reading from the motion sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Acceleration `[x, y, z]`.
    pub accel: [f32; 3],
    /// Angular rate `[x, y, z]`.
    pub gyro: [f32; 3],
}

impl SensorSample {
    /// Create a sample from its acceleration and angular-rate vectors.
    #[must_use]
    pub const fn new(accel: [f32; 3], gyro: [f32; 3]) -> Self {
        Self { accel, gyro }
    }

    /// The six components paired with their axis, in wire order.
    #[must_use]
    pub fn components(&self) -> [(Axis, f32); 6] {
        [
            (Axis::AccelX, self.accel[0]),
            (Axis::AccelY, self.accel[1]),
            (Axis::AccelZ, self.accel[2]),
            (Axis::GyroX, self.gyro[0]),
            (Axis::GyroY, self.gyro[1]),
            (Axis::GyroZ, self.gyro[2]),
        ]
    }

    /// Check the sample against the trust rules.
    ///
    /// A sample is rejected when any component is non-finite, or when the
    /// magnitude of any acceleration component exceeds [`ACCEL_LIMIT`].
    /// Angular rate has no magnitude limit.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidReading`] found, non-finite checks first.
    pub fn validate(&self) -> Result<(), InvalidReading> {
        let components = self.components();

        if let Some(&(axis, value)) = components.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InvalidReading::NonFinite { axis, value });
        }

        if let Some(&(axis, value)) = components
            .iter()
            .find(|(axis, v)| axis.is_accel() && v.abs() > ACCEL_LIMIT)
        {
            return Err(InvalidReading::AccelOutOfRange {
                axis,
                value,
                limit: ACCEL_LIMIT,
            });
        }

        Ok(())
    }

    /// Whether the sample passes [`validate`](Self::validate).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resting() -> SensorSample {
        SensorSample::new([0.12, -0.05, 9.81], [0.01, 0.0, -0.02])
    }

    #[test]
    fn test_axis_display() {
        let names: Vec<String> = Axis::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["ax", "ay", "az", "gx", "gy", "gz"]);
    }

    #[test]
    fn test_axis_is_accel() {
        assert!(Axis::AccelZ.is_accel());
        assert!(!Axis::GyroX.is_accel());
    }

    #[test]
    fn test_resting_sample_is_valid() {
        assert!(resting().validate().is_ok());
        assert!(resting().is_valid());
    }

    #[test]
    fn test_nan_on_any_axis_is_rejected() {
        for (index, axis) in Axis::ALL.iter().enumerate() {
            let mut sample = resting();
            if index < 3 {
                sample.accel[index] = f32::NAN;
            } else {
                sample.gyro[index - 3] = f32::NAN;
            }
            let err = sample.validate().unwrap_err();
            assert!(matches!(err, InvalidReading::NonFinite { .. }));
            assert_eq!(err.axis(), *axis);
        }
    }

    #[test]
    fn test_infinity_is_rejected() {
        let mut sample = resting();
        sample.gyro[2] = f32::NEG_INFINITY;
        assert_eq!(sample.validate().unwrap_err().axis(), Axis::GyroZ);

        let mut sample = resting();
        sample.accel[1] = f32::INFINITY;
        assert!(matches!(
            sample.validate(),
            Err(InvalidReading::NonFinite {
                axis: Axis::AccelY,
                ..
            })
        ));
    }

    #[test]
    fn test_accel_limit_is_exclusive() {
        let mut sample = resting();
        sample.accel[0] = 100.0;
        assert!(sample.is_valid());

        sample.accel[0] = -100.0;
        assert!(sample.is_valid());

        sample.accel[0] = 100.01;
        assert_eq!(
            sample.validate(),
            Err(InvalidReading::AccelOutOfRange {
                axis: Axis::AccelX,
                value: 100.01,
                limit: ACCEL_LIMIT,
            })
        );

        sample.accel[0] = 0.0;
        sample.accel[2] = -250.0;
        assert_eq!(sample.validate().unwrap_err().axis(), Axis::AccelZ);
    }

    #[test]
    fn test_large_gyro_is_still_valid() {
        let sample = SensorSample::new([0.0, 0.0, 9.8], [500.0, -2000.0, 1.0e6]);
        assert!(sample.is_valid());
    }

    #[test]
    fn test_non_finite_reported_before_range() {
        let sample = SensorSample::new([500.0, 0.0, 0.0], [0.0, f32::NAN, 0.0]);
        assert_eq!(sample.validate().unwrap_err().axis(), Axis::GyroY);
    }

    #[test]
    fn test_invalid_reading_display() {
        let err = InvalidReading::AccelOutOfRange {
            axis: Axis::AccelY,
            value: 120.5,
            limit: ACCEL_LIMIT,
        };
        assert_eq!(err.to_string(), "|ay| = 120.5 exceeds 100");

        let err = InvalidReading::NonFinite {
            axis: Axis::AccelX,
            value: f32::NAN,
        };
        assert_eq!(err.to_string(), "ax is not finite (NaN)");
    }

    #[test]
    fn test_components_wire_order() {
        let sample = SensorSample::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        let values: Vec<f32> = sample.components().iter().map(|(_, v)| *v).collect();
        assert_eq!(values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}

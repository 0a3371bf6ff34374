//! Log records and their line-oriented wire format.
//!
//! Every record is persisted as exactly one newline-terminated line:
//!
//! ```text
//! Cycle 12: 0.12,-0.05,9.81,0.01,0,-0.02
//! ```
//!
//! Fields are `ax,ay,az,gx,gy,gz`, each written as the shortest decimal text
//! that round-trips the `f32` value. There is no header, checksum, or version
//! marker.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::sample::SensorSample;

/// Prefix that opens every record line.
const CYCLE_PREFIX: &str = "Cycle ";

/// Separator between the cycle number and the sample fields.
const FIELDS_SEPARATOR: &str = ": ";

/// A validated sample stamped with its cycle number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogRecord {
    cycle: u64,
    sample: SensorSample,
}

impl LogRecord {
    /// Create a record for the given cycle.
    #[must_use]
    pub const fn new(cycle: u64, sample: SensorSample) -> Self {
        Self { cycle, sample }
    }

    /// The producer cycle this record was sampled in (1-based).
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The recorded sample.
    #[must_use]
    pub const fn sample(&self) -> &SensorSample {
        &self.sample
    }

    /// Serialize to a single line, without the trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [ax, ay, az] = self.sample.accel;
        let [gx, gy, gz] = self.sample.gyro;
        write!(
            f,
            "{CYCLE_PREFIX}{}{FIELDS_SEPARATOR}{ax},{ay},{az},{gx},{gy},{gz}",
            self.cycle
        )
    }
}

impl FromStr for LogRecord {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);

        let rest = line
            .strip_prefix(CYCLE_PREFIX)
            .ok_or_else(|| Error::record_parse(line, "missing 'Cycle' prefix"))?;
        let (cycle, fields) = rest
            .split_once(FIELDS_SEPARATOR)
            .ok_or_else(|| Error::record_parse(line, "missing ': ' separator"))?;
        let cycle: u64 = cycle
            .parse()
            .map_err(|e| Error::record_parse(line, format!("bad cycle number: {e}")))?;

        let mut values = [0.0_f32; 6];
        let mut count = 0;
        for field in fields.split(',') {
            if count == values.len() {
                return Err(Error::record_parse(line, "more than 6 fields"));
            }
            values[count] = field
                .trim()
                .parse()
                .map_err(|e| Error::record_parse(line, format!("bad field {}: {e}", count + 1)))?;
            count += 1;
        }
        if count != values.len() {
            return Err(Error::record_parse(
                line,
                format!("expected 6 fields, found {count}"),
            ));
        }

        let [ax, ay, az, gx, gy, gz] = values;
        Ok(Self::new(cycle, SensorSample::new([ax, ay, az], [gx, gy, gz])))
    }
}

//! Test doubles for the sensor and storage collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::sample::SensorSample;
use crate::sensor::SensorDriver;
use crate::storage::LogStorage;

/// A sample a device at rest would report.
pub fn resting(x: f32) -> SensorSample {
    SensorSample::new([x, 0.0, 9.81], [0.01, -0.01, 0.0])
}

/// A sample with NaN on `ax`.
pub fn nan_sample() -> SensorSample {
    SensorSample::new([f32::NAN, 0.0, 9.81], [0.0; 3])
}

/// Sensor that replays a fixed script, then keeps returning resting samples.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: VecDeque<SensorSample>,
    fail_init: bool,
    reads: Arc<AtomicU64>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = SensorSample>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Shared read counter, observable after the sensor is moved into a task.
    pub fn reads(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reads)
    }
}

#[async_trait::async_trait]
impl SensorDriver for ScriptedSensor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.fail_init {
            return Err(Error::sensor_init("scripted", "not found on bus"));
        }
        Ok(())
    }

    async fn read(&mut self) -> SensorSample {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or_else(|| resting(0.0))
    }
}

/// Formatted `tracing` output captured from the current thread.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into a new capture until the guard drops.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// In-memory log storage with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    lines: Mutex<Vec<String>>,
    appends: AtomicU64,
    fail_open_on: Vec<u64>,
    fail_init: bool,
    fail_read: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to open the log on the given 1-based append attempts.
    pub fn failing_open_on(attempts: impl IntoIterator<Item = u64>) -> Self {
        Self {
            fail_open_on: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn failing_read() -> Self {
        Self {
            fail_read: true,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn append_attempts(&self) -> u64 {
        self.appends.load(Ordering::SeqCst)
    }

    fn io_error() -> std::io::Error {
        std::io::Error::other("card removed")
    }
}

#[async_trait::async_trait]
impl LogStorage for MemoryStorage {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn initialize(&self) -> Result<()> {
        if self.fail_init {
            return Err(Error::StorageInit {
                path: "memory".into(),
                source: Self::io_error(),
            });
        }
        Ok(())
    }

    async fn append_line(&self, line: &str) -> Result<()> {
        let attempt = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_open_on.contains(&attempt) {
            return Err(Error::StorageOpen {
                path: "memory".into(),
                source: Self::io_error(),
            });
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    async fn read_lines(&self) -> Result<Vec<String>> {
        if self.fail_read {
            return Err(Error::StorageRead {
                path: "memory".into(),
                source: Self::io_error(),
            });
        }
        Ok(self.lines())
    }
}

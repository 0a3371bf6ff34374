//! Process-wide system state.
//!
//! The pipeline moves through `Running → FaultDetected → Recovering → Halted`
//! and never backwards. [`SharedState`] is the cloneable handle both tasks
//! read; only fault escalation writes it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};

/// Lifecycle state of the telemetry pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SystemState {
    /// Sampling and persisting normally.
    Running = 0,
    /// An invalid reading was seen; the audit dump is in progress.
    FaultDetected = 1,
    /// Waiting out the stand-in repositioning maneuver.
    Recovering = 2,
    /// Terminal. Both tasks are stopped.
    Halted = 3,
}

impl SystemState {
    /// The state that follows this one, or `None` for [`Halted`](Self::Halted).
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Running => Some(Self::FaultDetected),
            Self::FaultDetected => Some(Self::Recovering),
            Self::Recovering => Some(Self::Halted),
            Self::Halted => None,
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted)
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::FaultDetected,
            2 => Self::Recovering,
            _ => Self::Halted,
        }
    }
}

impl std::fmt::Display for SystemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::FaultDetected => write!(f, "fault_detected"),
            Self::Recovering => write!(f, "recovering"),
            Self::Halted => write!(f, "halted"),
        }
    }
}

/// A lightweight, cloneable handle to the shared [`SystemState`].
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<AtomicU8>,
}

impl SharedState {
    /// Create a handle starting in [`SystemState::Running`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(SystemState::Running as u8)),
        }
    }

    /// Read the current state.
    #[must_use]
    pub fn get(&self) -> SystemState {
        SystemState::from_u8(self.inner.load(Ordering::SeqCst))
    }

    /// Whether the pipeline is still in [`SystemState::Running`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.get() == SystemState::Running
    }

    /// Whether the pipeline has reached [`SystemState::Halted`].
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.get().is_terminal()
    }

    /// Move to `to`, which must be the direct successor of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if `to` is not the next state,
    /// including any attempt to leave [`SystemState::Halted`].
    pub fn advance(&self, to: SystemState) -> Result<SystemState> {
        let current = self.get();
        if current.next() != Some(to) {
            return Err(Error::InvalidTransition { from: current, to });
        }
        self.inner
            .compare_exchange(current as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|actual| Error::InvalidTransition {
                from: SystemState::from_u8(actual),
                to,
            })?;
        Ok(current)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

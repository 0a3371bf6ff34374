//! Fault escalation: audit dump, stand-in recovery and permanent halt.
//!
//! Escalation runs once, on the producer's task, right after the first
//! invalid reading:
//!
//! 1. `Running → FaultDetected`. Wait for the persister to drain the channel
//!    and stop, then re-emit every stored record tagged with its 1-based
//!    position.
//! 2. `FaultDetected → Recovering`. Report the latched initial pose and wait
//!    out the repositioning maneuver. No actuation happens here.
//! 3. `Recovering → Halted`. Nothing is sampled or stored after this point.
//!    The outcome is returned as a [`HaltReport`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::persister::PersisterStats;
use crate::producer::{Fault, InitialPose};
use crate::state::{SharedState, SystemState};
use crate::storage::LogStorage;

/// Default length of the stand-in repositioning wait.
pub const DEFAULT_RECOVERY_WAIT: Duration = Duration::from_secs(2);

/// One stored line, tagged with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// 1-based position in storage order.
    pub index: usize,
    /// The stored line, verbatim.
    pub line: String,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ENTRY {}] {}", self.index, self.line)
    }
}

/// Read the whole log and tag each line with its 1-based position.
///
/// # Errors
///
/// Returns an error if the log cannot be read.
pub async fn audit_entries(storage: &dyn LogStorage) -> Result<Vec<AuditEntry>> {
    let lines = storage.read_lines().await?;
    Ok(lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| AuditEntry { index: i + 1, line })
        .collect())
}

/// Everything known about the run once the system has halted.
#[derive(Debug, Clone, Serialize)]
pub struct HaltReport {
    /// The invalid reading that triggered escalation.
    pub fault: Fault,
    /// The audit dump, in storage order.
    pub audit: Vec<AuditEntry>,
    /// Why the audit dump is empty, if the log could not be read.
    pub audit_error: Option<String>,
    /// Final persister counters, if the persister stopped cleanly.
    pub persister: Option<PersisterStats>,
    /// When escalation started.
    pub detected_at: DateTime<Utc>,
    /// When the system reached [`SystemState::Halted`].
    pub halted_at: DateTime<Utc>,
}

impl HaltReport {
    /// Pose reported during recovery.
    #[must_use]
    pub fn initial_pose(&self) -> Option<InitialPose> {
        self.fault.initial_pose
    }
}

/// The escalation state machine.
pub struct FaultEscalation {
    state: SharedState,
    storage: Arc<dyn LogStorage>,
    recovery_wait: Duration,
}

impl FaultEscalation {
    /// Create the escalation path for a pipeline.
    #[must_use]
    pub fn new(state: SharedState, storage: Arc<dyn LogStorage>, recovery_wait: Duration) -> Self {
        Self {
            state,
            storage,
            recovery_wait,
        }
    }

    /// Drive the system from `Running` to `Halted`.
    ///
    /// `persister` is awaited before the log is read back, so the dump sees
    /// every record that was queued before the fault.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// if the system was not `Running`. Audit and recovery problems are
    /// reported and do not stop the halt.
    pub async fn escalate(
        self,
        fault: Fault,
        persister: JoinHandle<PersisterStats>,
    ) -> Result<HaltReport> {
        self.state.advance(SystemState::FaultDetected)?;
        let detected_at = Utc::now();
        warn!(
            cycle = fault.cycle,
            reading = %fault.reading,
            "[SYSTEM] Fault detected"
        );

        let persister = match persister.await {
            Ok(stats) => Some(stats),
            Err(err) => {
                error!(error = %err, "[ERROR] Persister did not stop cleanly");
                None
            }
        };

        let (audit, audit_error) = self.audit_dump().await;

        self.state.advance(SystemState::Recovering)?;
        self.recover(fault.initial_pose).await;

        info!("[INFO] Stopping all tasks...");
        self.state.advance(SystemState::Halted)?;
        let halted_at = Utc::now();
        info!("[FINAL] SYSTEM HALTED.");

        Ok(HaltReport {
            fault,
            audit,
            audit_error,
            persister,
            detected_at,
            halted_at,
        })
    }

    async fn audit_dump(&self) -> (Vec<AuditEntry>, Option<String>) {
        info!("==================================");
        info!("[DATA LOG] Stored data with cycle numbers:");

        let result = match audit_entries(self.storage.as_ref()).await {
            Ok(entries) => {
                for entry in &entries {
                    info!("{entry}");
                }
                (entries, None)
            }
            Err(err) => {
                error!(error = %err, "[ERROR] Cannot open log for audit");
                (Vec::new(), Some(err.to_string()))
            }
        };

        info!("==================================");
        result
    }

    async fn recover(&self, pose: Option<InitialPose>) {
        info!("==================================");
        let Some(pose) = pose else {
            warn!("[SYSTEM ERROR] No initial position was ever latched, nothing to return to");
            return;
        };

        info!("[SYSTEM ERROR] Moving back to initial position...");
        info!("Returning to: {pose}");
        tokio::time::sleep(self.recovery_wait).await;
        info!("[INFO] System returned to initial position.");
    }
}

impl fmt::Debug for FaultEscalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultEscalation")
            .field("state", &self.state.get())
            .field("location", &self.storage.location())
            .field("recovery_wait", &self.recovery_wait)
            .finish()
    }
}

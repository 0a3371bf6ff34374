//! Storage persister task.
//!
//! Pops records off the channel one at a time and appends each to durable
//! storage before accepting the next. A record that cannot be stored is
//! reported and dropped; storage failures never stop the persister.
//!
//! Queued records are still drained while a fault is being escalated. Once
//! the system is `Halted` nothing more is appended.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::channel::RecordReceiver;
use crate::state::SharedState;
use crate::storage::LogStorage;

/// Counters reported when the persister stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersisterStats {
    /// Records durably appended.
    pub persisted: u64,
    /// Records dropped because storage failed.
    pub dropped: u64,
}

/// Consumer side of the pipeline.
pub struct StoragePersister {
    storage: Arc<dyn LogStorage>,
    rx: RecordReceiver,
    state: SharedState,
    stats: PersisterStats,
}

impl StoragePersister {
    /// Create a persister draining `rx` into `storage` until `state` is
    /// `Halted`.
    #[must_use]
    pub fn new(storage: Arc<dyn LogStorage>, rx: RecordReceiver, state: SharedState) -> Self {
        Self {
            storage,
            rx,
            state,
            stats: PersisterStats::default(),
        }
    }

    /// Run until every sender is gone and the channel is drained, or the
    /// system has halted.
    ///
    /// During normal operation this never returns; the sampler only lets go
    /// of its sender when a fault is being escalated.
    pub async fn run(mut self) -> PersisterStats {
        info!(location = %self.storage.location(), "[TASK 2] Persister running");

        while let Some(record) = self.rx.pop().await {
            if self.state.is_halted() {
                warn!(
                    cycle = record.cycle(),
                    "[TASK 2] System halted, queued records discarded"
                );
                break;
            }

            let line = record.to_line();
            match self.storage.append_line(&line).await {
                Ok(()) => {
                    self.stats.persisted += 1;
                    debug!(cycle = record.cycle(), "[TASK 2 -> STORAGE] Data saved: {line}");
                }
                Err(err) => {
                    self.stats.dropped += 1;
                    error!(
                        cycle = record.cycle(),
                        error = %err,
                        "[TASK 2 ERROR] Record dropped"
                    );
                }
            }
        }

        info!(
            persisted = self.stats.persisted,
            dropped = self.stats.dropped,
            "[TASK 2] Channel closed, persister stopped"
        );
        self.stats
    }
}

impl fmt::Debug for StoragePersister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoragePersister")
            .field("location", &self.storage.location())
            .field("state", &self.state.get())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;
    use crate::record::LogRecord;
    use crate::state::SystemState;
    use crate::test_support::{resting, LogCapture, MemoryStorage};

    #[allow(clippy::cast_precision_loss)]
    fn record(cycle: u64) -> LogRecord {
        LogRecord::new(cycle, resting(cycle as f32))
    }

    #[tokio::test]
    async fn test_persists_every_record_in_order() {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, rx) = channel::bounded(4).unwrap();
        let persister = tokio::spawn(StoragePersister::new(storage.clone(), rx, SharedState::new()).run());

        for cycle in 1..=20 {
            tx.push(record(cycle)).await.unwrap();
        }
        drop(tx);

        let stats = persister.await.unwrap();
        assert_eq!(
            stats,
            PersisterStats {
                persisted: 20,
                dropped: 0
            }
        );

        let lines = storage.lines();
        assert_eq!(lines.len(), 20);
        for (index, line) in lines.iter().enumerate() {
            let parsed: LogRecord = line.parse().unwrap();
            assert_eq!(parsed.cycle(), index as u64 + 1);
        }
    }

    #[tokio::test]
    async fn test_open_failure_drops_only_that_record() {
        let storage = Arc::new(MemoryStorage::failing_open_on([7]));
        let (tx, rx) = channel::bounded(10).unwrap();
        let persister = tokio::spawn(StoragePersister::new(storage.clone(), rx, SharedState::new()).run());

        for cycle in 1..=9 {
            tx.push(record(cycle)).await.unwrap();
        }
        drop(tx);

        let stats = persister.await.unwrap();
        assert_eq!(stats.persisted, 8);
        assert_eq!(stats.dropped, 1);
        assert_eq!(storage.append_attempts(), 9);

        let cycles: Vec<u64> = storage
            .lines()
            .iter()
            .map(|l| l.parse::<LogRecord>().unwrap().cycle())
            .collect();
        assert_eq!(cycles, [1, 2, 3, 4, 5, 6, 8, 9]);
    }

    #[tokio::test]
    async fn test_stops_with_empty_channel() {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, rx) = channel::bounded(1).unwrap();
        drop(tx);

        let stats = StoragePersister::new(storage.clone(), rx, SharedState::new()).run().await;
        assert_eq!(stats, PersisterStats::default());
        assert!(storage.lines().is_empty());
    }

    #[test]
    fn test_persister_debug() {
        let storage = Arc::new(MemoryStorage::new());
        let (_tx, rx) = channel::bounded(1).unwrap();
        let persister = StoragePersister::new(storage, rx, SharedState::new());
        let debug_str = format!("{persister:?}");
        assert!(debug_str.contains("StoragePersister"));
        assert!(debug_str.contains("memory"));
    }

    #[tokio::test]
    async fn test_keeps_draining_while_fault_escalates() {
        let storage = Arc::new(MemoryStorage::new());
        let state = SharedState::new();
        state.advance(SystemState::FaultDetected).unwrap();
        let (tx, rx) = channel::bounded(4).unwrap();
        for cycle in 1..=3 {
            tx.push(record(cycle)).await.unwrap();
        }
        drop(tx);

        let stats = StoragePersister::new(storage.clone(), rx, state).run().await;
        assert_eq!(stats.persisted, 3);
        assert_eq!(storage.lines().len(), 3);
    }

    #[tokio::test]
    async fn test_nothing_appended_once_halted() {
        let storage = Arc::new(MemoryStorage::new());
        let state = SharedState::new();
        let (tx, rx) = channel::bounded(8).unwrap();
        let persister =
            tokio::spawn(StoragePersister::new(storage.clone(), rx, state.clone()).run());

        tx.push(record(1)).await.unwrap();
        while storage.lines().is_empty() {
            tokio::task::yield_now().await;
        }

        state.advance(SystemState::FaultDetected).unwrap();
        state.advance(SystemState::Recovering).unwrap();
        state.advance(SystemState::Halted).unwrap();
        for cycle in 2..=4 {
            // The persister may already have let go of the channel.
            let _ = tx.push(record(cycle)).await;
        }

        let stats = persister.await.unwrap();
        assert_eq!(stats.persisted, 1);
        assert_eq!(storage.append_attempts(), 1);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_dropped_record_reported_as_error() {
        let (logs, _guard) = LogCapture::install();
        let storage = Arc::new(MemoryStorage::failing_open_on([7]));
        let (tx, rx) = channel::bounded(10).unwrap();
        let persister =
            tokio::spawn(StoragePersister::new(storage.clone(), rx, SharedState::new()).run());

        for cycle in 1..=8 {
            tx.push(record(cycle)).await.unwrap();
        }
        drop(tx);
        persister.await.unwrap();

        let output = logs.contents();
        let dropped: Vec<&str> = output
            .lines()
            .filter(|l| l.contains("[TASK 2 ERROR] Record dropped"))
            .collect();
        assert_eq!(dropped.len(), 1);
        assert!(dropped[0].contains("ERROR"));
        assert!(dropped[0].contains("cycle=7"));
        assert!(dropped[0].contains("card removed"));
    }
}

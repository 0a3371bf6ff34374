//! Bounded FIFO channel between the sampler and the persister.
//!
//! The channel is the only resource the two tasks share. `push` suspends
//! while the channel is full and `pop` suspends while it is empty; neither
//! has a timeout. A full channel stalls the producer rather than losing
//! records.
//!
//! Once every [`RecordSender`] has been dropped, [`RecordReceiver::pop`]
//! drains what is still queued and then yields `None`. Fault escalation
//! relies on this to quiesce the persister before it reads the log back.

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::record::LogRecord;

/// Default number of records the channel holds.
pub const DEFAULT_CAPACITY: usize = 10;

/// Create a bounded channel holding at most `capacity` records.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] if `capacity` is zero.
pub fn bounded(capacity: usize) -> Result<(RecordSender, RecordReceiver)> {
    if capacity == 0 {
        return Err(Error::ConfigValidation {
            message: "channel capacity must be greater than 0".to_string(),
        });
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((RecordSender { tx }, RecordReceiver { rx }))
}

/// Producer half of the record channel.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<LogRecord>,
}

impl RecordSender {
    /// Enqueue a record, waiting for a free slot if the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the receiving half is gone. The
    /// record is dropped in that case.
    pub async fn push(&self, record: LogRecord) -> Result<()> {
        self.tx
            .send(record)
            .await
            .map_err(|mpsc::error::SendError(record)| Error::ChannelClosed {
                cycle: record.cycle(),
            })
    }

    /// Maximum number of records the channel holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the receiving half has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the record channel.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: mpsc::Receiver<LogRecord>,
}

impl RecordReceiver {
    /// Dequeue the oldest record, waiting until one is available.
    ///
    /// Returns `None` once all senders are dropped and the queue is drained.
    pub async fn pop(&mut self) -> Option<LogRecord> {
        self.rx.recv().await
    }
}

//! Bounded multi-producer, single-consumer handoff of filled buffers.
//!
//! The queue is split into a [`QueueWriter`] shared by reference among the
//! producers and a [`QueueReader`] owned by the writer thread. Submitting to a
//! full queue blocks. Closing consumes the writer half, so it happens exactly
//! once; the reader then drains whatever is still queued before seeing the
//! end of the stream.

use crate::models::WorkItem;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Create a queue holding at most `capacity` items
pub fn bounded(capacity: usize) -> (QueueWriter, QueueReader) {
    let (tx, rx) = channel::bounded(capacity);
    (
        QueueWriter {
            tx,
            capacity,
            submitted: AtomicU64::new(0),
            stalls: AtomicU64::new(0),
        },
        QueueReader { rx },
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub submitted: u64,
    /// Submissions that found the queue full and blocked
    pub stalls: u64,
}

pub struct QueueWriter {
    tx: Sender<WorkItem>,
    capacity: usize,
    submitted: AtomicU64,
    stalls: AtomicU64,
}

impl QueueWriter {
    /// Hand an item to the consumer, blocking while the queue is full.
    ///
    /// Gives the item back if the consumer has gone away.
    pub fn submit(&self, item: WorkItem) -> std::result::Result<(), WorkItem> {
        let item = match self.tx.try_send(item) {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Disconnected(item)) => return Err(item),
            Err(TrySendError::Full(item)) => item,
        };

        self.stalls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Queue full ({} items), waiting for the writer", self.capacity);

        self.tx.send(item).map_err(|err| err.into_inner())?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            stalls: self.stalls.load(Ordering::Relaxed),
        }
    }

    /// Signal that no further items will arrive
    pub fn close(self) -> QueueStats {
        let stats = self.stats();
        tracing::debug!(
            "Closing queue after {} submissions ({} stalled)",
            stats.submitted,
            stats.stalls
        );
        stats
    }
}

pub struct QueueReader {
    rx: Receiver<WorkItem>,
}

impl QueueReader {
    /// Wait for the next item. `None` once the queue is closed and drained.
    pub fn recv(&self) -> Option<WorkItem> {
        self.rx.recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

//! # Message queues feeding the dispatch loop.
//!
//! [`MessageQueues`] holds two unbounded FIFO queues built on
//! [`tokio::sync::mpsc::unbounded_channel`]: one for [`LogEntry`] values and one
//! for [`ErrorRecord`] values.
//!
//! ## Architecture
//! ```text
//! Producers (many):                      Consumer (one):
//!   app thread 1 ──┐
//!   app thread 2 ──┼── enqueue_* ──► [log queue]   ──► try_next_entry()  ──► DispatchLoop
//!   app task N   ──┘              └► [error queue] ──► try_next_error()
//! ```
//!
//! ## Rules
//! - **Non-blocking enqueue**: never waits; the queues are unbounded.
//! - **Non-blocking dequeue**: `try_next_*` returns `None` when the queue is empty.
//! - **FIFO per queue**: sequential enqueues from one producer are dequeued in order.
//! - Racing producers resolve in whatever order the channel accepted their sends.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::records::{ErrorRecord, LogEntry};

/// One unbounded FIFO with a pending counter readable from any thread.
struct Lane<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Mutex<mpsc::UnboundedReceiver<T>>,
    pending: AtomicUsize,
}

impl<T> Lane<T> {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    fn push(&self, item: T) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        // The receiver lives as long as `self`, so the send cannot observe a closed channel.
        if self.tx.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn pop(&self) -> Option<T> {
        let item = self.rx.lock().try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(item)
    }

    fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.pop().is_some() {
            dropped += 1;
        }
        dropped
    }
}

/// Log-entry and error-record queues shared between producers and the dispatch loop.
pub struct MessageQueues {
    entries: Lane<LogEntry>,
    errors: Lane<ErrorRecord>,
}

impl MessageQueues {
    /// Creates two empty queues.
    pub fn new() -> Self {
        Self {
            entries: Lane::new(),
            errors: Lane::new(),
        }
    }

    /// Enqueues a log entry. Never blocks.
    pub fn enqueue_log_entry(&self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Enqueues an error record. Never blocks.
    pub fn enqueue_error_record(&self, record: ErrorRecord) {
        self.errors.push(record);
    }

    /// Dequeues the oldest log entry, if any.
    pub fn try_next_entry(&self) -> Option<LogEntry> {
        self.entries.pop()
    }

    /// Dequeues the oldest error record, if any.
    pub fn try_next_error(&self) -> Option<ErrorRecord> {
        self.errors.pop()
    }

    /// Number of log entries waiting.
    pub fn pending_entries(&self) -> usize {
        self.entries.len()
    }

    /// Number of error records waiting.
    pub fn pending_errors(&self) -> usize {
        self.errors.len()
    }

    /// True if both queues are empty.
    pub fn is_empty(&self) -> bool {
        self.pending_entries() == 0 && self.pending_errors() == 0
    }

    /// Drops everything still queued; returns `(entries, errors)` dropped.
    pub fn discard(&self) -> (usize, usize) {
        (self.entries.clear(), self.errors.clear())
    }
}

impl Default for MessageQueues {
    fn default() -> Self {
        Self::new()
    }
}

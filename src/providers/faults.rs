//! # Per-provider fault log.
//!
//! Every hook failure is recorded as a [`ProviderFault`] in the failing provider's
//! own [`FaultLog`]. The log keeps the most recent `capacity` faults (oldest evicted
//! first) and a lifetime counter, so a long-running process never grows it without
//! bound while overflow stays observable.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::error::HookError;

/// Which provider hook raised a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// `on_begin`.
    Begin,
    /// `on_start`.
    Start,
    /// `on_message`.
    Message,
    /// `on_error`.
    Error,
    /// `on_end`.
    End,
    /// `on_final`.
    Final,
    /// `message_applies` / `error_applies`.
    Filter,
}

impl Hook {
    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Begin => "begin",
            Hook::Start => "start",
            Hook::Message => "message",
            Hook::Error => "error",
            Hook::End => "end",
            Hook::Final => "final",
            Hook::Filter => "filter",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded hook failure.
#[derive(Debug, Clone)]
pub struct ProviderFault {
    /// Provider that failed.
    pub provider: Arc<str>,
    /// Hook that failed.
    pub hook: Hook,
    /// What went wrong.
    pub error: HookError,
    /// When it was recorded.
    pub at: SystemTime,
    /// Sequence number of the record being delivered, for message/error hooks.
    pub record_seq: Option<u64>,
}

/// Bounded ring of recent faults plus a lifetime counter.
#[derive(Debug)]
pub struct FaultLog {
    recent: Mutex<VecDeque<ProviderFault>>,
    capacity: usize,
    total: AtomicU64,
}

impl FaultLog {
    /// Creates a log keeping at most `capacity` faults (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            total: AtomicU64::new(0),
        }
    }

    /// Appends a fault, evicting the oldest one when full.
    pub fn push(&self, fault: ProviderFault) {
        let mut recent = self.recent.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(fault);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy of the retained faults, oldest first.
    pub fn snapshot(&self) -> Vec<ProviderFault> {
        self.recent.lock().iter().cloned().collect()
    }

    /// Number of retained faults.
    pub fn len(&self) -> usize {
        self.recent.lock().len()
    }

    /// True if no fault is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Faults recorded over the lifetime of the log, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Drops retained faults; the lifetime counter is kept.
    pub fn clear(&self) {
        self.recent.lock().clear();
    }
}

//! # Externally visible phase of the dispatch loop.
//!
//! [`LoggingState`] tells health checks and status commands whether log output is
//! current. The value lives in a shared atomic ([`StateCell`]): any thread can read
//! it at any time, only the dispatch loop writes it.
//!
//! ## Transitions
//! ```text
//!            start()
//! Stopped ───────────► Initializing ─► Ready ◄──► Writing
//!    ▲                      │            │
//!    │  clean stop          ▼ (pending)  │ loop-fatal fault
//!    └──────────────────────┴────────────┴─────────► Broken
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Phase of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoggingState {
    /// Loop is starting or initializing providers.
    Initializing = 0,
    /// Loop is idle between deliveries.
    Ready = 1,
    /// Loop is delivering queued records.
    Writing = 2,
    /// Loop is not running (never started, or stopped cleanly).
    Stopped = 3,
    /// Loop died from a fault outside provider hooks.
    Broken = 4,
}

impl LoggingState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LoggingState::Initializing,
            1 => LoggingState::Ready,
            2 => LoggingState::Writing,
            3 => LoggingState::Stopped,
            _ => LoggingState::Broken,
        }
    }

    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            LoggingState::Initializing => "initializing",
            LoggingState::Ready => "ready",
            LoggingState::Writing => "writing",
            LoggingState::Stopped => "stopped",
            LoggingState::Broken => "broken",
        }
    }

    /// True for `Stopped` and `Broken`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoggingState::Stopped | LoggingState::Broken)
    }
}

impl fmt::Display for LoggingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, cheaply cloneable holder of the current [`LoggingState`].
#[derive(Clone, Debug)]
pub struct StateCell {
    inner: Arc<AtomicU8>,
}

impl StateCell {
    /// Creates a cell in `Stopped`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(LoggingState::Stopped as u8)),
        }
    }

    /// Current state.
    pub fn get(&self) -> LoggingState {
        LoggingState::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LoggingState) {
        let prev = self.inner.swap(state as u8, Ordering::AcqRel);
        if prev != state as u8 {
            tracing::trace!(from = %LoggingState::from_u8(prev), to = %state, "logging state");
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

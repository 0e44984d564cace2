//! # Core provider trait
//!
//! `Provider` is the extension point for plugging log sinks into the runtime. The
//! dispatch loop drives every registered provider through the same hook sequence
//! each cycle:
//!
//! ```text
//! on_begin ─(once, retried until Ok)─► [ on_start ─► on_message* ─► on_error* ─► on_end ]* ─► on_final
//! ```
//!
//! ## Contract
//! - Hooks of all providers run **serially** on the dispatch task; a provider never
//!   sees two of its hooks running at once, so it needs no internal locking for
//!   hook-only state.
//! - A slow hook delays every other provider in the same cycle (no per-hook timeout).
//! - Returning `Err` (or panicking) is recorded in the provider's fault log and never
//!   stops the loop or other providers.
//! - `message_applies` / `error_applies` decide interest per record; the default
//!   accepts everything.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use logvisor::{HookError, LogEntry, Provider};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Provider for Audit {
//!     fn name(&self) -> &str { "audit" }
//!
//!     async fn on_message(&self, entry: &LogEntry) -> Result<(), HookError> {
//!         // write audit record...
//!         let _ = entry;
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::HookError;
use crate::records::{ErrorRecord, LogEntry};
use crate::settings::Settings;

/// Contract for logging providers.
///
/// Called from the dispatch task. Implementations should avoid blocking the async
/// runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Unique provider name (registry key, fault tag, settings scope).
    fn name(&self) -> &str;

    /// One-time initialization; runs every cycle until it succeeds.
    ///
    /// `settings` is the runtime's settings store; provider-scoped values live under
    /// `logging.provider.<name>.<key>`.
    async fn on_begin(&self, settings: &Settings) -> Result<(), HookError> {
        let _ = settings;
        Ok(())
    }

    /// Start of a dispatch cycle (before any record is delivered).
    async fn on_start(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Handle a single log entry.
    async fn on_message(&self, entry: &LogEntry) -> Result<(), HookError>;

    /// Handle a single error record.
    async fn on_error(&self, record: &ErrorRecord) -> Result<(), HookError> {
        let _ = record;
        Ok(())
    }

    /// End of a dispatch cycle (after both queues were drained).
    async fn on_end(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Teardown at shutdown, after the final flush.
    async fn on_final(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Whether this provider wants `entry`.
    fn message_applies(&self, entry: &LogEntry) -> bool {
        let _ = entry;
        true
    }

    /// Whether this provider wants `record`.
    fn error_applies(&self, record: &ErrorRecord) -> bool {
        let _ = record;
        true
    }
}

//! # Logging providers for the logvisor runtime.
//!
//! This module provides the [`Provider`] trait, the [`ProviderRegistry`] that owns
//! registered providers, and the pieces every provider shares.
//!
//! ## Architecture
//! ```text
//! DispatchLoop ── per cycle ──► ProviderRegistry snapshot
//!                                   │
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     console    logfile    custom ...
//!                         │         │         │
//!                    FaultLog   FaultLog   FaultLog   (hook failures, per provider)
//! ```
//!
//! ## Implementing custom providers
//! ```no_run
//! use async_trait::async_trait;
//! use logvisor::{HookError, Level, LogEntry, Provider};
//!
//! struct WarningsOnly;
//!
//! #[async_trait]
//! impl Provider for WarningsOnly {
//!     fn name(&self) -> &str { "warnings" }
//!
//!     async fn on_message(&self, entry: &LogEntry) -> Result<(), HookError> {
//!         eprintln!("WARN {}", entry.message);
//!         Ok(())
//!     }
//!
//!     fn message_applies(&self, entry: &LogEntry) -> bool {
//!         entry.level == Level::Warning
//!     }
//! }
//! ```

mod faults;
mod filter;
mod provider;
mod registry;

#[cfg(feature = "embedded")]
mod embedded;

pub use faults::{FaultLog, Hook, ProviderFault};
pub use filter::ProviderFilter;
pub use provider::Provider;
pub use registry::{ProviderRegistry, ProviderSlot, ProviderStatus};

#[cfg(feature = "embedded")]
pub use embedded::{LogFileProvider, TracingProvider};

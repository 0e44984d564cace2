//! # logvisor
//!
//! **Logvisor** is an asynchronous logging-provider dispatch runtime.
//!
//! Application code anywhere in a process enqueues log entries and error records;
//! a single background dispatch loop drains them into a dynamically registered set
//! of pluggable providers (console, file, external services ...), drives each
//! provider through its lifecycle, isolates provider failures, and flushes
//! everything still queued when the process shuts down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   app thread 1      app task 2       app thread N
//!        │                 │                 │
//!        └── enqueue_log_entry / enqueue_error_record (non-blocking)
//!                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Logging (runtime context)                                        │
//! │  - MessageQueues   (unbounded log + error FIFOs)                  │
//! │  - ProviderRegistry (providers, enabled/initialized, fault logs)  │
//! │  - Settings        (flush flag, provider settings)                │
//! │  - StateCell       (LoggingState, readable by anyone)             │
//! │  - RunspaceHost    (background task hosting the DispatchLoop)     │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                    ┌────────────────────────┐
//!                    │      DispatchLoop      │
//!                    │ (one task, serial hooks)│
//!                    └───┬────────┬────────┬──┘
//!                        ▼        ▼        ▼
//!                   console   logfile   custom ...
//!                  on_begin / on_start / on_message / on_error / on_end / on_final
//! ```
//!
//! ### Lifecycle
//! ```text
//! start() ──► RunspaceHost ──► DispatchLoop::run(token)
//!
//! loop {
//!   ├─► token cancelled? ─► break
//!   ├─► on_begin   (enabled ∧ ¬initialized; failure → fault, retried next cycle)
//!   ├─► on_start   (initialized)
//!   ├─► on_message (each queued entry × each interested provider)
//!   ├─► on_error   (each queued error  × each interested provider)
//!   ├─► on_end     (initialized)
//!   └─► pause (Config::interval)
//! }
//!
//! On exit: final flush (unless `logging.disable_flush_on_exit`) ─► on_final
//!          ─► providers uninitialized ─► Stopped | Broken ─► runspace Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Producer API**  | Non-blocking enqueue from any thread.                        | [`LogEntry`], [`ErrorRecord`], [`Logging`]  |
//! | **Provider API**  | Pluggable sinks with lifecycle hooks and filters.            | [`Provider`], [`ProviderFilter`]            |
//! | **Isolation**     | Hook errors and panics become per-provider faults.           | [`ProviderFault`], [`FaultLog`]             |
//! | **Supervision**   | Background runspace with cooperative stop and final flush.   | [`RunspaceHost`], [`LoggingState`]          |
//! | **Errors**        | Typed errors for runtime, hooks and configuration.           | [`RuntimeError`], [`HookError`]             |
//! | **Configuration** | Runtime settings and a key/value settings store.             | [`Config`], [`Settings`]                    |
//!
//! ## Optional features
//! - `embedded` (default): built-in [`TracingProvider`] and [`LogFileProvider`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use logvisor::{Config, ErrorRecord, Level, LogEntry, Logging};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logging = Logging::builder(Config::default())
//!         .with_providers(vec![Arc::new(logvisor::TracingProvider::new())])
//!         .build()?;
//!
//!     logging.start()?;
//!     logging.enqueue_log_entry(
//!         LogEntry::new(Level::Important, "Backup-Database", "full backup finished")
//!             .with_target("SQL01"),
//!     );
//!     logging.enqueue_error_record(ErrorRecord::new(
//!         "Restore-Database",
//!         "restore aborted",
//!         "backup set is damaged",
//!     ));
//!
//!     // Everything enqueued above is delivered before the loop stops.
//!     logging.stop().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod providers;
mod queues;
mod records;
mod settings;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{
    DispatchLoop, IntervalPacer, Logging, LoggingBuilder, LoggingState, Pacer, ProviderLifecycle,
    RunState, RunspaceHost, StateCell, wait_for_shutdown_signal,
};
pub use error::{ConfigError, HookError, RuntimeError};
pub use providers::{
    FaultLog, Hook, Provider, ProviderFault, ProviderFilter, ProviderRegistry, ProviderSlot,
    ProviderStatus,
};
pub use queues::MessageQueues;
pub use records::{ErrorRecord, Level, LogEntry};
pub use settings::{DISABLE_FLUSH_ON_EXIT, SettingValue, Settings, provider_key};

// Optional: built-in console (tracing) and log file providers.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "embedded")]
pub use providers::{LogFileProvider, TracingProvider};

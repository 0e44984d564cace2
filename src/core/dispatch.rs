//! # DispatchLoop: the long-lived provider dispatch loop.
//!
//! Drains [`MessageQueues`] into every interested, initialized provider, advancing
//! providers through their lifecycle once per cycle.
//!
//! ## Cycle
//! ```text
//! loop {
//!   ├─► token cancelled?  ─► yes: break            (only cancellation checkpoint)
//!   ├─► [1] on_begin   for enabled ∧ ¬initialized  (state: Initializing, if any)
//!   ├─► [2] on_start   for initialized             (state: Ready)
//!   ├─► [3] on_message per queued entry  ┐
//!   ├─► [4] on_error   per queued error  ┘         (state: Writing)
//!   ├─► [5] on_end     for initialized             (state: Ready once done)
//!   └─► pacer.pause()  (interrupted by cancellation)
//! }
//! ```
//!
//! ## Shutdown
//! ```text
//! read `logging.disable_flush_on_exit`
//!   ├─ unset/false → on_start, drain both queues, on_end   (final flush)
//!   └─ true        → discard everything still queued
//! on_final for initialized, mark all uninitialized
//! state = Stopped (clean) | Broken (fault escaped the cycle body)
//! ```
//!
//! ## Rules
//! - One cycle guard per loop: `run` holds it from the first cycle through teardown,
//!   and manual cycles and [`DispatchLoop::shutdown`] take it too, so hooks never overlap.
//! - A cycle in progress always runs to completion; cancellation never interrupts it.
//! - Log entries are fully drained before error records in every cycle.
//! - Provider failures never reach this level (see [`ProviderLifecycle`]); only a
//!   panic outside the hooks (e.g. in the pacer) counts as a loop-fatal fault.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::lifecycle::{ProviderLifecycle, panic_message};
use crate::core::state::{LoggingState, StateCell};
use crate::error::RuntimeError;
use crate::providers::{ProviderRegistry, ProviderSlot};
use crate::queues::MessageQueues;
use crate::settings::Settings;

/// Wait between two dispatch cycles.
///
/// Injected into the loop so tests can replace wall-clock sleeps.
#[async_trait]
pub trait Pacer: Send + Sync + 'static {
    /// Suspends until the next cycle should start.
    async fn pause(&self);
}

/// Default pacer: fixed sleep, or a plain yield when no interval is set.
#[derive(Debug, Clone, Copy)]
pub struct IntervalPacer {
    interval: Option<Duration>,
}

impl IntervalPacer {
    /// Creates a pacer sleeping `interval` (`None` = only yield).
    pub fn new(interval: Option<Duration>) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Pacer for IntervalPacer {
    async fn pause(&self) {
        match self.interval {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }
    }
}

/// The dispatch loop over one registry, one pair of queues and one state cell.
pub struct DispatchLoop {
    lifecycle: ProviderLifecycle,
    queues: Arc<MessageQueues>,
    settings: Arc<Settings>,
    state: StateCell,
    pacer: Arc<dyn Pacer>,
    cycle_guard: Mutex<()>,
}

impl DispatchLoop {
    /// Creates a loop; nothing runs until [`run`](Self::run) or [`run_cycle`](Self::run_cycle).
    pub fn new(
        registry: Arc<ProviderRegistry>,
        queues: Arc<MessageQueues>,
        settings: Arc<Settings>,
        state: StateCell,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            lifecycle: ProviderLifecycle::new(registry, Arc::clone(&settings)),
            queues,
            settings,
            state,
            pacer,
            cycle_guard: Mutex::new(()),
        }
    }

    fn registry(&self) -> &ProviderRegistry {
        self.lifecycle.registry()
    }

    /// Runs until `token` is cancelled, then flushes and tears providers down.
    ///
    /// Returns `Err(RuntimeError::LoopFault)` when a fault escaped the cycle body;
    /// the state is `Broken` in that case and `Stopped` otherwise.
    pub async fn run(&self, token: CancellationToken) -> Result<(), RuntimeError> {
        let _cycle = self.cycle_guard.lock().await;
        tracing::info!("dispatch loop started");

        let fault = AssertUnwindSafe(self.cycle_until_cancelled(&token))
            .catch_unwind()
            .await
            .err()
            .map(|p| panic_message(p.as_ref()));
        self.wind_down(fault).await
    }

    /// Flush and teardown for providers initialized by manual cycles.
    ///
    /// A no-op when no provider is initialized.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let _cycle = self.cycle_guard.lock().await;
        if self.registry().initialized().is_empty() {
            return Ok(());
        }
        self.wind_down(None).await
    }

    async fn wind_down(&self, mut fault: Option<String>) -> Result<(), RuntimeError> {
        if let Err(p) = AssertUnwindSafe(self.flush()).catch_unwind().await {
            fault.get_or_insert_with(|| panic_message(p.as_ref()));
        }
        if let Err(p) = AssertUnwindSafe(self.teardown()).catch_unwind().await {
            fault.get_or_insert_with(|| panic_message(p.as_ref()));
        }

        match fault {
            None => {
                self.state.set(LoggingState::Stopped);
                tracing::info!("dispatch loop stopped");
                Ok(())
            }
            Some(error) => {
                self.state.set(LoggingState::Broken);
                tracing::error!(%error, "dispatch loop broken");
                Err(RuntimeError::LoopFault { error })
            }
        }
    }

    async fn cycle_until_cancelled(&self, token: &CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }
            self.cycle().await;

            select! {
                _ = self.pacer.pause() => {}
                _ = token.cancelled() => {}
            }
        }
    }

    /// Runs one full dispatch cycle without pausing.
    ///
    /// Waits for a cycle or a running loop to release the cycle guard first.
    pub async fn run_cycle(&self) {
        let _cycle = self.cycle_guard.lock().await;
        self.cycle().await;
    }

    /// Like [`run_cycle`](Self::run_cycle), but returns `false` without running
    /// anything when the cycle guard is held.
    pub async fn try_run_cycle(&self) -> bool {
        let Ok(_cycle) = self.cycle_guard.try_lock() else {
            return false;
        };
        self.cycle().await;
        true
    }

    async fn cycle(&self) {
        let pending = self.registry().pending();
        if !pending.is_empty() {
            self.state.set(LoggingState::Initializing);
            self.lifecycle.begin_pending(&pending).await;
        }
        self.state.set(LoggingState::Ready);

        let active = self.registry().initialized();
        self.lifecycle.start(&active).await;
        self.drain(&active).await;
        self.lifecycle.end(&active).await;
        self.state.set(LoggingState::Ready);
    }

    /// Delivers every queued entry, then every queued error record.
    async fn drain(&self, active: &[Arc<ProviderSlot>]) {
        self.state.set(LoggingState::Writing);
        let mut entries = 0usize;
        while let Some(entry) = self.queues.try_next_entry() {
            self.lifecycle.deliver_entry(active, &entry).await;
            entries += 1;
        }
        let mut errors = 0usize;
        while let Some(record) = self.queues.try_next_error() {
            self.lifecycle.deliver_error(active, &record).await;
            errors += 1;
        }
        if entries + errors > 0 {
            tracing::trace!(entries, errors, providers = active.len(), "drained queues");
        }
    }

    /// Final flush pass, unless disabled in settings (read now, at stop time).
    async fn flush(&self) {
        if self.settings.flush_disabled() {
            let (entries, errors) = self.queues.discard();
            tracing::info!(entries, errors, "final flush disabled; discarded queued records");
            return;
        }
        let active = self.registry().initialized();
        self.lifecycle.start(&active).await;
        self.drain(&active).await;
        self.lifecycle.end(&active).await;
    }

    /// `on_final` for every initialized provider, then reset all to uninitialized.
    async fn teardown(&self) {
        let active = self.registry().initialized();
        self.lifecycle.finalize(&active).await;
    }
}

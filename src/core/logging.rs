//! # Logging: the runtime context tying queues, providers and the dispatch loop together.
//!
//! [`Logging`] owns the [`ProviderRegistry`], the [`MessageQueues`], the settings
//! store and the [`LoggingState`] cell, and hosts the [`DispatchLoop`] in a
//! [`RunspaceHost`]. Several independent instances can coexist in one process.
//!
//! ## High-level architecture
//! ```text
//! producers (any thread)
//!   enqueue_log_entry / enqueue_error_record ──► MessageQueues
//!
//! setup / admin code
//!   register_provider / enable / disable ──────► ProviderRegistry
//!
//! start()
//!   RunspaceHost.start(runspace_name, |token| DispatchLoop::run(token))
//!                                   │
//!                                   ▼
//!        cycle: begin → start → drain(entries) → drain(errors) → end → pause
//!
//! stop()
//!   RunspaceHost.stop(): token.cancel() ──► final flush ──► on_final ──► Stopped
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use logvisor::{Config, Level, Logging, LoggingState, TracingProvider};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logging = Logging::builder(Config::default())
//!         .with_providers(vec![Arc::new(TracingProvider::new())])
//!         .build()?;
//!
//!     logging.start()?;
//!     logging.write(Level::Important, "Start-Maintenance", "maintenance window opened");
//!     logging.stop().await?;
//!
//!     assert_eq!(logging.state(), LoggingState::Stopped);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    core::{
        builder::LoggingBuilder,
        dispatch::DispatchLoop,
        host::{RunState, RunspaceHost},
        shutdown,
        state::{LoggingState, StateCell},
    },
    error::RuntimeError,
    providers::{Provider, ProviderFault, ProviderRegistry, ProviderStatus},
    queues::MessageQueues,
    records::{ErrorRecord, Level, LogEntry},
    settings::Settings,
};

/// Poll step of [`Logging::wait_for_drain`].
const DRAIN_POLL: Duration = Duration::from_millis(10);

/// The logging runtime context.
pub struct Logging {
    cfg: Config,
    registry: Arc<ProviderRegistry>,
    queues: Arc<MessageQueues>,
    settings: Arc<Settings>,
    state: StateCell,
    dispatcher: Arc<DispatchLoop>,
    host: Arc<RunspaceHost>,
}

impl Logging {
    /// Creates a builder for configuring the runtime.
    pub fn builder(cfg: Config) -> LoggingBuilder {
        LoggingBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        registry: Arc<ProviderRegistry>,
        queues: Arc<MessageQueues>,
        settings: Arc<Settings>,
        state: StateCell,
        dispatcher: Arc<DispatchLoop>,
        host: Arc<RunspaceHost>,
    ) -> Self {
        Self {
            cfg,
            registry,
            queues,
            settings,
            state,
            dispatcher,
            host,
        }
    }

    // ---------------------------
    // Producer API
    // ---------------------------

    /// Enqueues a log entry. Never blocks, never fails.
    pub fn enqueue_log_entry(&self, entry: LogEntry) {
        self.queues.enqueue_log_entry(entry);
    }

    /// Enqueues an error record. Never blocks, never fails.
    pub fn enqueue_error_record(&self, record: ErrorRecord) {
        self.queues.enqueue_error_record(record);
    }

    /// Shorthand: builds and enqueues a [`LogEntry`].
    pub fn write(&self, level: Level, origin: &str, message: impl Into<Arc<str>>) {
        self.enqueue_log_entry(LogEntry::new(level, origin, message));
    }

    // ---------------------------
    // Provider registration
    // ---------------------------

    /// Registers a provider (disabled until [`enable_provider`](Self::enable_provider)).
    pub fn register_provider(&self, provider: Arc<dyn Provider>) -> Result<(), RuntimeError> {
        self.registry.register(provider)
    }

    /// Enables a provider; it is initialized on the next cycle.
    pub fn enable_provider(&self, name: &str) -> Result<(), RuntimeError> {
        self.registry.enable(name)
    }

    /// Disables a provider.
    ///
    /// An already initialized provider keeps receiving records until shutdown;
    /// only pending initialization attempts stop.
    pub fn disable_provider(&self, name: &str) -> Result<(), RuntimeError> {
        self.registry.disable(name)
    }

    /// Status of every registered provider.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.registry.status()
    }

    /// Recent hook faults of one provider.
    pub fn provider_faults(&self, name: &str) -> Result<Vec<ProviderFault>, RuntimeError> {
        self.registry.faults(name)
    }

    // ---------------------------
    // Lifecycle control
    // ---------------------------

    /// Starts the dispatch loop in the background.
    ///
    /// Fails with [`RuntimeError::AlreadyRunning`] while a previous run is still
    /// running or stopping. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let dispatcher = Arc::clone(&self.dispatcher);
        self.host
            .start(&self.cfg.runspace_name, move |token| async move {
                dispatcher.run(token).await
            })
    }

    /// Requests shutdown and waits until the loop has flushed and stopped.
    ///
    /// Without a background loop, providers initialized by [`run_cycle`](Self::run_cycle)
    /// get the same final flush and `on_final`. A no-op when nothing is running and
    /// no provider is initialized.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        match self.runspace_state() {
            Some(RunState::Running | RunState::Stopping) => {
                self.host.stop(&self.cfg.runspace_name).await
            }
            _ => self.dispatcher.shutdown().await,
        }
    }

    /// Starts the loop, waits for an OS termination signal, then stops it.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start()?;
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            tracing::warn!(error = %e, "cannot listen for termination signals; stopping now");
        }
        self.stop().await
    }

    /// Runs exactly one dispatch cycle on the caller's task.
    ///
    /// Refused with [`RuntimeError::AlreadyRunning`] while the background loop runs
    /// or another cycle is in progress, so hooks never execute concurrently.
    /// Providers it initializes are finalized by [`stop`](Self::stop).
    pub async fn run_cycle(&self) -> Result<(), RuntimeError> {
        let busy = self.runspace_state().is_some_and(|s| s != RunState::Stopped);
        if busy || !self.dispatcher.try_run_cycle().await {
            return Err(RuntimeError::AlreadyRunning {
                name: self.cfg.runspace_name.clone(),
            });
        }
        Ok(())
    }

    /// Waits until both queues are empty and nothing is being written.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let drained = async {
            while !self.queues.is_empty() || self.state.get() == LoggingState::Writing {
                tokio::time::sleep(DRAIN_POLL).await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }

    // ---------------------------
    // Observation
    // ---------------------------

    /// Current phase of the dispatch loop.
    pub fn state(&self) -> LoggingState {
        self.state.get()
    }

    /// Cloneable reader of the dispatch phase, for status commands and providers.
    pub fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    /// Run state of the hosting runspace; `None` before the first start.
    pub fn runspace_state(&self) -> Option<RunState> {
        self.host.state(&self.cfg.runspace_name)
    }

    /// Fault the last run ended with, if it ended `Broken`.
    pub fn last_fault(&self) -> Option<RuntimeError> {
        self.host.outcome(&self.cfg.runspace_name)
    }

    /// The settings store read by the loop and providers.
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Number of queued log entries and error records.
    pub fn pending(&self) -> (usize, usize) {
        (self.queues.pending_entries(), self.queues.pending_errors())
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

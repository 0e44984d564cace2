//! # Runspace host - supervised background execution units.
//!
//! A *runspace* is a named tokio task hosting a long-lived body (the dispatch loop).
//! The host records a `RunspaceRecord` per name: the run state, the cancellation
//! token used to request a stop, and a signal that fires when the body has returned.
//!
//! ## Architecture
//! ```text
//! start(name, body) ──► RunspaceRecord{ Running, token, watch }
//!                          └──► tokio::spawn(body(token)) ──► (returns / panics)
//!                                                                  │
//! stop(name) ──► Running→Stopping, token.cancel() ──► wait_for(Stopped) ◄──┘ state = Stopped
//! ```
//!
//! ## Rules
//! - One body per name at a time: `start` on a `Running` or `Stopping` name returns
//!   [`RuntimeError::AlreadyRunning`]; a `Stopped` name may be started again.
//! - `stop` on a `Stopped` runspace is a no-op.
//! - `start` outside a tokio runtime fails without leaving a record behind.
//! - A body that panics still ends in `Stopped`; the panic is kept as the outcome.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::lifecycle::panic_message;
use crate::error::RuntimeError;

/// Run state of a runspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Body is executing.
    Running,
    /// Stop requested; body has not returned yet.
    Stopping,
    /// Body has returned.
    Stopped,
}

/// Supervision record of one runspace.
struct RunspaceRecord {
    /// Current run state; receivers wait on it for `Stopped`.
    state: watch::Sender<RunState>,
    /// Cancellation requested by `stop`.
    cancel: CancellationToken,
    /// Error the body ended with, if any.
    outcome: Mutex<Option<RuntimeError>>,
}

/// Registry of named runspaces.
#[derive(Default)]
pub struct RunspaceHost {
    records: Mutex<HashMap<String, Arc<RunspaceRecord>>>,
}

impl RunspaceHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches `body` as a background task under `name`.
    ///
    /// Fails with [`RuntimeError::NoRuntime`] outside a tokio runtime; nothing is
    /// recorded in that case.
    pub fn start<F, Fut>(&self, name: &str, body: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), RuntimeError>> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| RuntimeError::NoRuntime {
            name: name.to_string(),
        })?;

        let record = {
            let mut records = self.records.lock();
            if let Some(existing) = records.get(name) {
                if *existing.state.borrow() != RunState::Stopped {
                    return Err(RuntimeError::AlreadyRunning {
                        name: name.to_string(),
                    });
                }
            }
            let (state, _rx) = watch::channel(RunState::Running);
            let record = Arc::new(RunspaceRecord {
                state,
                cancel: CancellationToken::new(),
                outcome: Mutex::new(None),
            });
            records.insert(name.to_string(), Arc::clone(&record));
            record
        };

        let fut = body(record.cancel.clone());
        let runspace = name.to_string();
        handle.spawn(async move {
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(p) => Some(RuntimeError::LoopFault {
                    error: panic_message(p.as_ref()),
                }),
            };
            if let Some(e) = &outcome {
                tracing::error!(runspace = %runspace, label = e.as_label(), error = %e, "runspace ended with error");
            } else {
                tracing::debug!(runspace = %runspace, "runspace ended");
            }
            *record.outcome.lock() = outcome;
            record.state.send_replace(RunState::Stopped);
        });

        tracing::debug!(runspace = %name, "runspace started");
        Ok(())
    }

    /// Requests cancellation and waits until the body has returned.
    pub async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        let record = self.record(name)?;
        let mut rx = record.state.subscribe();

        record.state.send_if_modified(|s| {
            if *s == RunState::Running {
                *s = RunState::Stopping;
                true
            } else {
                false
            }
        });
        record.cancel.cancel();

        // The sender lives in `record`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|s| *s == RunState::Stopped).await;
        Ok(())
    }

    /// Waits until the body has returned, without requesting a stop.
    pub async fn wait(&self, name: &str) -> Result<(), RuntimeError> {
        let record = self.record(name)?;
        let mut rx = record.state.subscribe();
        let _ = rx.wait_for(|s| *s == RunState::Stopped).await;
        Ok(())
    }

    /// Current run state, `None` for an unknown name.
    pub fn state(&self, name: &str) -> Option<RunState> {
        self.records.lock().get(name).map(|r| *r.state.borrow())
    }

    /// Error the last run of `name` ended with, if any.
    pub fn outcome(&self, name: &str) -> Option<RuntimeError> {
        self.records
            .lock()
            .get(name)
            .and_then(|r| r.outcome.lock().clone())
    }

    /// Sorted names of all known runspaces.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn record(&self, name: &str) -> Result<Arc<RunspaceRecord>, RuntimeError> {
        self.records
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownRunspace {
                name: name.to_string(),
            })
    }
}

//! # TracingProvider: forward records to `tracing`
//!
//! A minimal provider that re-emits every accepted [`LogEntry`] and [`ErrorRecord`]
//! as a `tracing` event under the `logvisor::console` target, so whatever subscriber
//! the host installed (console, JSON, journald ...) renders them.
//!
//! ## Level mapping
//! ```text
//! Critical, Important, Output, Host  → INFO
//! Significant, VeryVerbose, Verbose  → DEBUG
//! SomewhatVerbose .. InternalComment → TRACE
//! Warning                            → WARN
//! ErrorRecord                        → ERROR
//! ```

use async_trait::async_trait;

use crate::error::HookError;
use crate::providers::{Provider, ProviderFilter};
use crate::records::{ErrorRecord, Level, LogEntry};

/// Console provider backed by `tracing`.
#[derive(Debug, Default)]
pub struct TracingProvider {
    filter: ProviderFilter,
}

impl TracingProvider {
    /// Construct a new [`TracingProvider`] accepting every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a provider with a record filter.
    #[must_use]
    pub fn with_filter(filter: ProviderFilter) -> Self {
        Self { filter }
    }
}

#[async_trait]
impl Provider for TracingProvider {
    fn name(&self) -> &str {
        "console"
    }

    async fn on_message(&self, e: &LogEntry) -> Result<(), HookError> {
        let module = e.module.as_deref().unwrap_or("-");
        match e.level {
            Level::Warning => {
                tracing::warn!(target: "logvisor::console", origin = %e.origin, module, "{}", e.message)
            }
            Level::Critical | Level::Important | Level::Output | Level::Host => {
                tracing::info!(target: "logvisor::console", origin = %e.origin, module, "{}", e.message)
            }
            Level::Significant | Level::VeryVerbose | Level::Verbose => {
                tracing::debug!(target: "logvisor::console", origin = %e.origin, module, "{}", e.message)
            }
            _ => {
                tracing::trace!(target: "logvisor::console", origin = %e.origin, module, "{}", e.message)
            }
        }
        Ok(())
    }

    async fn on_error(&self, r: &ErrorRecord) -> Result<(), HookError> {
        tracing::error!(
            target: "logvisor::console",
            origin = %r.origin,
            module = r.module.as_deref().unwrap_or("-"),
            error = %r.error,
            "{}",
            r.message
        );
        Ok(())
    }

    fn message_applies(&self, entry: &LogEntry) -> bool {
        self.filter.applies_to_entry(entry)
    }

    fn error_applies(&self, record: &ErrorRecord) -> bool {
        self.filter.applies_to_error(record)
    }
}

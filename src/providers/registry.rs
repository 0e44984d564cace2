//! # Provider registry - the set of sinks the dispatch loop drives.
//!
//! The registry owns one [`ProviderSlot`] per registered provider: the provider
//! itself, its `enabled` / `initialized` flags and its [`FaultLog`].
//!
//! ## Architecture
//! ```text
//! app code ──► register / enable / disable ──► RwLock<Vec<Arc<ProviderSlot>>>
//!                                                     │ snapshot (Arc clones)
//!                                                     ▼
//!                                    DispatchLoop: pending() / initialized()
//! ```
//!
//! ## Rules
//! - Names are unique; registration order is preserved.
//! - New providers start disabled and uninitialized.
//! - Reads return snapshots, so register/enable/disable never race an iteration.
//! - Disabling does **not** un-initialize: a provider that already ran `on_begin`
//!   keeps receiving hooks and records until shutdown; disabling only prevents
//!   further `on_begin` attempts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::RuntimeError;
use crate::providers::faults::{FaultLog, ProviderFault};
use crate::providers::provider::Provider;

/// Registry entry for one provider.
pub struct ProviderSlot {
    name: Arc<str>,
    provider: Arc<dyn Provider>,
    enabled: AtomicBool,
    initialized: AtomicBool,
    faults: FaultLog,
}

impl ProviderSlot {
    fn new(provider: Arc<dyn Provider>, fault_capacity: usize) -> Self {
        Self {
            name: Arc::from(provider.name()),
            provider,
            enabled: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            faults: FaultLog::new(fault_capacity),
        }
    }

    /// Provider name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The provider implementation.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// True if the provider may be initialized.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// True once `on_begin` has succeeded (until shutdown).
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The provider's fault log.
    pub fn faults(&self) -> &FaultLog {
        &self.faults
    }

    pub(crate) fn set_initialized(&self, value: bool) {
        self.initialized.store(value, Ordering::Release);
    }

    pub(crate) fn record_fault(&self, fault: ProviderFault) {
        self.faults.push(fault);
    }
}

/// Point-in-time view of one provider, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    /// Provider name.
    pub name: String,
    /// Enabled flag.
    pub enabled: bool,
    /// Initialized flag.
    pub initialized: bool,
    /// Faults currently retained.
    pub recent_faults: usize,
    /// Faults recorded since registration.
    pub total_faults: u64,
}

/// Thread-safe registry of providers.
pub struct ProviderRegistry {
    slots: RwLock<Vec<Arc<ProviderSlot>>>,
    fault_capacity: usize,
}

impl ProviderRegistry {
    /// Creates an empty registry; each provider keeps up to `fault_capacity` faults.
    pub fn new(fault_capacity: usize) -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            fault_capacity,
        }
    }

    /// Registers a provider (disabled, uninitialized).
    pub fn register(&self, provider: Arc<dyn Provider>) -> Result<(), RuntimeError> {
        let mut slots = self.slots.write();
        if slots.iter().any(|s| s.name.as_ref() == provider.name()) {
            return Err(RuntimeError::DuplicateProvider {
                name: provider.name().to_string(),
            });
        }
        let slot = ProviderSlot::new(provider, self.fault_capacity);
        tracing::debug!(provider = %slot.name, "provider registered");
        slots.push(Arc::new(slot));
        Ok(())
    }

    /// Marks a provider enabled; it is initialized on the next cycle.
    pub fn enable(&self, name: &str) -> Result<(), RuntimeError> {
        self.set_enabled(name, true)
    }

    /// Marks a provider disabled; see the module rules for what that does not do.
    pub fn disable(&self, name: &str) -> Result<(), RuntimeError> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, value: bool) -> Result<(), RuntimeError> {
        let slot = self.get(name).ok_or_else(|| RuntimeError::UnknownProvider {
            name: name.to_string(),
        })?;
        slot.enabled.store(value, Ordering::Release);
        tracing::debug!(provider = %name, enabled = value, "provider toggled");
        Ok(())
    }

    /// Looks up a provider slot by name.
    pub fn get(&self, name: &str) -> Option<Arc<ProviderSlot>> {
        self.slots
            .read()
            .iter()
            .find(|s| s.name.as_ref() == name)
            .cloned()
    }

    /// Snapshot of every registered provider, in registration order.
    pub fn all(&self) -> Vec<Arc<ProviderSlot>> {
        self.slots.read().clone()
    }

    /// Snapshot of enabled providers.
    pub fn enabled(&self) -> Vec<Arc<ProviderSlot>> {
        self.filtered(|s| s.is_enabled())
    }

    /// Snapshot of initialized providers (enabled or not).
    pub fn initialized(&self) -> Vec<Arc<ProviderSlot>> {
        self.filtered(|s| s.is_initialized())
    }

    /// Snapshot of enabled providers still waiting for a successful `on_begin`.
    pub fn pending(&self) -> Vec<Arc<ProviderSlot>> {
        self.filtered(|s| s.is_enabled() && !s.is_initialized())
    }

    /// Status of every provider, in registration order.
    pub fn status(&self) -> Vec<ProviderStatus> {
        self.slots
            .read()
            .iter()
            .map(|s| ProviderStatus {
                name: s.name.to_string(),
                enabled: s.is_enabled(),
                initialized: s.is_initialized(),
                recent_faults: s.faults.len(),
                total_faults: s.faults.total(),
            })
            .collect()
    }

    /// Retained faults of one provider.
    pub fn faults(&self, name: &str) -> Result<Vec<ProviderFault>, RuntimeError> {
        self.get(name)
            .map(|s| s.faults.snapshot())
            .ok_or_else(|| RuntimeError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn filtered(&self, keep: impl Fn(&ProviderSlot) -> bool) -> Vec<Arc<ProviderSlot>> {
        self.slots
            .read()
            .iter()
            .filter(|s| keep(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::records::LogEntry;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Provider for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn on_message(&self, _entry: &LogEntry) -> Result<(), HookError> {
            Ok(())
        }
    }

    fn registry() -> ProviderRegistry {
        let reg = ProviderRegistry::new(8);
        reg.register(Arc::new(Named("a"))).unwrap();
        reg.register(Arc::new(Named("b"))).unwrap();
        reg
    }

    fn names(slots: &[Arc<ProviderSlot>]) -> Vec<String> {
        slots.iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn test_register_starts_disabled_and_rejects_duplicates() {
        let reg = registry();
        assert_eq!(reg.len(), 2);
        assert!(reg.enabled().is_empty());
        assert!(reg.initialized().is_empty());

        let err = reg.register(Arc::new(Named("a"))).unwrap_err();
        assert_eq!(err, RuntimeError::DuplicateProvider { name: "a".into() });
    }

    #[test]
    fn test_enable_disable_and_unknown() {
        let reg = registry();
        reg.enable("b").unwrap();
        reg.enable("a").unwrap();
        assert_eq!(names(&reg.enabled()), vec!["a", "b"]);
        assert_eq!(names(&reg.pending()), vec!["a", "b"]);

        reg.disable("a").unwrap();
        assert_eq!(names(&reg.enabled()), vec!["b"]);

        assert!(matches!(
            reg.enable("zzz"),
            Err(RuntimeError::UnknownProvider { .. })
        ));
        assert!(reg.faults("zzz").is_err());
    }

    #[test]
    fn test_disable_keeps_initialized() {
        let reg = registry();
        reg.enable("a").unwrap();
        reg.get("a").unwrap().set_initialized(true);
        reg.disable("a").unwrap();

        assert!(reg.enabled().is_empty());
        assert!(reg.pending().is_empty());
        assert_eq!(names(&reg.initialized()), vec!["a"]);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_registration() {
        let reg = registry();
        let snap = reg.all();
        reg.register(Arc::new(Named("c"))).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(reg.len(), 3);

        let status = reg.status();
        assert_eq!(status[2].name, "c");
        assert!(!status[2].enabled);
        assert_eq!(status[2].total_faults, 0);
    }
}

//! # Provider lifecycle: isolated hook invocation.
//!
//! [`ProviderLifecycle`] runs one hook on one provider at a time and turns every
//! failure into a [`ProviderFault`] on that provider. Nothing a hook does (return
//! `Err`, panic) escapes to the caller.
//!
//! ## Hook outcomes
//! ```text
//! hook future ──► catch_unwind ──┬─ Ok(Ok(()))   → success
//!                                ├─ Ok(Err(e))   → fault(e)
//!                                └─ Err(payload) → fault(HookError::Panicked)
//! fault ──► slot.record_fault() + tracing::warn!
//! ```
//!
//! ## Rules
//! - Hooks run **serially** in snapshot order; never two at once.
//! - `on_begin` success flips `initialized`; failure leaves it unset (retried next cycle).
//! - A panicking filter predicate is a `Hook::Filter` fault; the record is skipped for
//!   that provider only.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;

use futures::FutureExt;

use crate::error::HookError;
use crate::providers::{Hook, ProviderFault, ProviderRegistry, ProviderSlot};
use crate::records::{ErrorRecord, LogEntry};
use crate::settings::Settings;

/// Drives provider hooks with per-provider fault isolation.
pub struct ProviderLifecycle {
    registry: Arc<ProviderRegistry>,
    settings: Arc<Settings>,
}

impl ProviderLifecycle {
    /// Creates a lifecycle driver over `registry`; `settings` is handed to `on_begin`.
    pub fn new(registry: Arc<ProviderRegistry>, settings: Arc<Settings>) -> Self {
        Self { registry, settings }
    }

    /// The registry this driver works on.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Runs `on_begin` on every enabled, uninitialized provider.
    ///
    /// Returns how many providers became initialized.
    pub async fn begin_pending(&self, pending: &[Arc<ProviderSlot>]) -> usize {
        let mut ready = 0;
        for slot in pending {
            let settings = &self.settings;
            let ok = invoke(slot, Hook::Begin, None, slot.provider().on_begin(settings)).await;
            if ok {
                slot.set_initialized(true);
                tracing::debug!(provider = %slot.name(), "provider initialized");
                ready += 1;
            }
        }
        ready
    }

    /// Runs `on_start` on each provider.
    pub async fn start(&self, slots: &[Arc<ProviderSlot>]) {
        for slot in slots {
            invoke(slot, Hook::Start, None, slot.provider().on_start()).await;
        }
    }

    /// Offers one entry to each interested provider.
    pub async fn deliver_entry(&self, slots: &[Arc<ProviderSlot>], entry: &LogEntry) {
        for slot in slots {
            let p = slot.provider();
            if applies(slot, Some(entry.seq), || p.message_applies(entry)) {
                invoke(slot, Hook::Message, Some(entry.seq), p.on_message(entry)).await;
            }
        }
    }

    /// Offers one error record to each interested provider.
    pub async fn deliver_error(&self, slots: &[Arc<ProviderSlot>], record: &ErrorRecord) {
        for slot in slots {
            let p = slot.provider();
            if applies(slot, Some(record.seq), || p.error_applies(record)) {
                invoke(slot, Hook::Error, Some(record.seq), p.on_error(record)).await;
            }
        }
    }

    /// Runs `on_end` on each provider.
    pub async fn end(&self, slots: &[Arc<ProviderSlot>]) {
        for slot in slots {
            invoke(slot, Hook::End, None, slot.provider().on_end()).await;
        }
    }

    /// Runs `on_final` on each provider, then marks every registered provider uninitialized.
    pub async fn finalize(&self, slots: &[Arc<ProviderSlot>]) {
        for slot in slots {
            invoke(slot, Hook::Final, None, slot.provider().on_final()).await;
        }
        for slot in self.registry.all() {
            slot.set_initialized(false);
        }
    }
}

/// Awaits one hook; records any failure on `slot`. Returns `true` on success.
async fn invoke<F>(slot: &ProviderSlot, hook: Hook, record_seq: Option<u64>, fut: F) -> bool
where
    F: Future<Output = Result<(), HookError>>,
{
    let err = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => return true,
        Ok(Err(e)) => e,
        Err(payload) => HookError::Panicked {
            info: panic_message(payload.as_ref()),
        },
    };
    fault(slot, hook, record_seq, err);
    false
}

/// Evaluates a filter predicate; a panic counts as "not interested" plus a fault.
fn applies(slot: &ProviderSlot, record_seq: Option<u64>, pred: impl FnOnce() -> bool) -> bool {
    match std::panic::catch_unwind(AssertUnwindSafe(pred)) {
        Ok(v) => v,
        Err(payload) => {
            let err = HookError::Panicked {
                info: panic_message(payload.as_ref()),
            };
            fault(slot, Hook::Filter, record_seq, err);
            false
        }
    }
}

fn fault(slot: &ProviderSlot, hook: Hook, record_seq: Option<u64>, error: HookError) {
    tracing::warn!(
        provider = %slot.name(),
        %hook,
        label = error.as_label(),
        error = %error,
        "provider hook failed"
    );
    slot.record_fault(ProviderFault {
        provider: Arc::clone(slot.name()),
        hook,
        error,
        at: SystemTime::now(),
        record_seq,
    });
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

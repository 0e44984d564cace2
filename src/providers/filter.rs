//! # Record filter shared by providers.
//!
//! [`ProviderFilter`] is the usual building block for
//! [`Provider::message_applies`](crate::Provider::message_applies): a level window
//! plus include/exclude lists for modules and tags. Empty include lists accept
//! everything; exclude lists always win. Name comparisons are case-insensitive.
//!
//! ```rust
//! use logvisor::{Level, LogEntry, ProviderFilter};
//!
//! let filter = ProviderFilter::new()
//!     .max_level(Level::Verbose)
//!     .exclude_tag("noise");
//!
//! assert!(filter.applies_to_entry(&LogEntry::new(Level::Important, "f", "m")));
//! assert!(!filter.applies_to_entry(&LogEntry::new(Level::Debug, "f", "m")));
//! ```

use std::sync::Arc;

use crate::records::{ErrorRecord, Level, LogEntry};

/// Level window plus module/tag include and exclude lists.
#[derive(Debug, Clone, Default)]
pub struct ProviderFilter {
    min_level: Option<u16>,
    max_level: Option<u16>,
    include_modules: Vec<String>,
    exclude_modules: Vec<String>,
    include_tags: Vec<String>,
    exclude_tags: Vec<String>,
}

impl ProviderFilter {
    /// Accept-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects entries more important than `level` (lower number).
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = Some(level.as_number());
        self
    }

    /// Rejects entries less important than `level` (higher number).
    pub fn max_level(mut self, level: Level) -> Self {
        self.max_level = Some(level.as_number());
        self
    }

    /// Accepts only records from these modules (repeatable).
    pub fn include_module(mut self, module: impl Into<String>) -> Self {
        self.include_modules.push(module.into());
        self
    }

    /// Rejects records from this module.
    pub fn exclude_module(mut self, module: impl Into<String>) -> Self {
        self.exclude_modules.push(module.into());
        self
    }

    /// Accepts only records carrying one of these tags (repeatable).
    pub fn include_tag(mut self, tag: impl Into<String>) -> Self {
        self.include_tags.push(tag.into());
        self
    }

    /// Rejects records carrying this tag.
    pub fn exclude_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclude_tags.push(tag.into());
        self
    }

    /// Whether a log entry passes the filter.
    pub fn applies_to_entry(&self, entry: &LogEntry) -> bool {
        let n = entry.level.as_number();
        // Warnings sit outside the numeric ladder and are never cut by the level window.
        if entry.level != Level::Warning {
            if self.min_level.is_some_and(|min| n < min) {
                return false;
            }
            if self.max_level.is_some_and(|max| n > max) {
                return false;
            }
        }
        self.scope_applies(entry.module.as_ref(), &entry.tags)
    }

    /// Whether an error record passes the filter (level window does not apply).
    pub fn applies_to_error(&self, record: &ErrorRecord) -> bool {
        self.scope_applies(record.module.as_ref(), &record.tags)
    }

    fn scope_applies(&self, module: Option<&Arc<str>>, tags: &[Arc<str>]) -> bool {
        let module = module.map(|m| m.as_ref());

        if let Some(m) = module {
            if contains(&self.exclude_modules, m) {
                return false;
            }
        }
        if !self.include_modules.is_empty() && !module.is_some_and(|m| contains(&self.include_modules, m)) {
            return false;
        }
        if tags.iter().any(|t| contains(&self.exclude_tags, t)) {
            return false;
        }
        if !self.include_tags.is_empty() && !tags.iter().any(|t| contains(&self.include_tags, t)) {
            return false;
        }
        true
    }
}

fn contains(list: &[String], needle: &str) -> bool {
    list.iter().any(|s| s.eq_ignore_ascii_case(needle))
}

//! # Records produced by application code and consumed by the dispatch loop.
//!
//! The [`LogEntry`] and [`ErrorRecord`] structs are immutable value records: they
//! are built by producers, moved into the [`MessageQueues`](crate::MessageQueues),
//! dequeued exactly once by the dispatch loop and offered by reference to every
//! interested provider.
//!
//! ## Ordering guarantees
//! Each record has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact creation order across both record kinds.
//!
//! ## Example
//! ```rust
//! use logvisor::{Level, LogEntry};
//!
//! let entry = LogEntry::new(Level::Warning, "Invoke-Backup", "backup target offline")
//!     .with_module("dbatools")
//!     .with_tag("backup")
//!     .with_target("SQL01");
//!
//! assert_eq!(entry.level, Level::Warning);
//! assert_eq!(entry.module.as_deref(), Some("dbatools"));
//! assert!(entry.has_tag("backup"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Global sequence counter shared by log entries and error records.
static RECORD_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    RECORD_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Message level.
///
/// The numeric ladder runs from `Critical` (1, always shown) to
/// `InternalComment` (9, rarely shown); `Warning` sits outside the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Level 1.
    Critical,
    /// Level 2.
    Important,
    /// Level 2 (alias used for plain output).
    Output,
    /// Level 2 (host display).
    Host,
    /// Level 3.
    Significant,
    /// Level 4.
    VeryVerbose,
    /// Level 5.
    Verbose,
    /// Level 6.
    SomewhatVerbose,
    /// Level 7.
    System,
    /// Level 8.
    Debug,
    /// Level 9.
    InternalComment,
    /// Warning channel.
    Warning,
}

impl Level {
    /// Numeric value of the level.
    pub fn as_number(self) -> u16 {
        match self {
            Level::Critical => 1,
            Level::Important | Level::Output | Level::Host => 2,
            Level::Significant => 3,
            Level::VeryVerbose => 4,
            Level::Verbose => 5,
            Level::SomewhatVerbose => 6,
            Level::System => 7,
            Level::Debug => 8,
            Level::InternalComment => 9,
            Level::Warning => 666,
        }
    }

    /// Maps a numeric value back to a level; shared values resolve to the first name.
    pub fn from_number(n: u16) -> Option<Self> {
        Some(match n {
            1 => Level::Critical,
            2 => Level::Important,
            3 => Level::Significant,
            4 => Level::VeryVerbose,
            5 => Level::Verbose,
            6 => Level::SomewhatVerbose,
            7 => Level::System,
            8 => Level::Debug,
            9 => Level::InternalComment,
            666 => Level::Warning,
            _ => return None,
        })
    }

    /// Short lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Critical => "critical",
            Level::Important => "important",
            Level::Output => "output",
            Level::Host => "host",
            Level::Significant => "significant",
            Level::VeryVerbose => "very_verbose",
            Level::Verbose => "verbose",
            Level::SomewhatVerbose => "somewhat_verbose",
            Level::System => "system",
            Level::Debug => "debug",
            Level::InternalComment => "internal_comment",
            Level::Warning => "warning",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log message.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: Arc<str>,
    /// Call-site that wrote the message (function or command name).
    pub origin: Arc<str>,
    /// Module the call-site belongs to.
    pub module: Option<Arc<str>>,
    /// Free-form tags.
    pub tags: Vec<Arc<str>>,
    /// Object the message is about (server, database, file ...).
    pub target: Option<Arc<str>>,
}

impl LogEntry {
    /// Creates a new entry with current timestamp and next sequence number.
    pub fn new(level: Level, origin: impl Into<Arc<str>>, message: impl Into<Arc<str>>) -> Self {
        Self {
            seq: next_seq(),
            at: SystemTime::now(),
            level,
            message: message.into(),
            origin: origin.into(),
            module: None,
            tags: Vec::new(),
            target: None,
        }
    }

    /// Attaches a module name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds one tag.
    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attaches a target object.
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// True if the entry carries `tag` (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// One error record.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Context message written alongside the error.
    pub message: Arc<str>,
    /// Rendered error payload.
    pub error: Arc<str>,
    /// Call-site that raised the error.
    pub origin: Arc<str>,
    /// Module the call-site belongs to.
    pub module: Option<Arc<str>>,
    /// Free-form tags.
    pub tags: Vec<Arc<str>>,
}

impl ErrorRecord {
    /// Creates a new record with current timestamp and next sequence number.
    pub fn new(
        origin: impl Into<Arc<str>>,
        message: impl Into<Arc<str>>,
        error: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            seq: next_seq(),
            at: SystemTime::now(),
            message: message.into(),
            error: error.into(),
            origin: origin.into(),
            module: None,
            tags: Vec::new(),
        }
    }

    /// Builds a record from any error value.
    pub fn from_error(
        origin: impl Into<Arc<str>>,
        message: impl Into<Arc<str>>,
        err: &dyn std::error::Error,
    ) -> Self {
        Self::new(origin, message, err.to_string())
    }

    /// Attaches a module name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds one tag.
    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// True if the record carries `tag` (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

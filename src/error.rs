//! Error types used by the logvisor runtime and logging providers.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: errors raised by the dispatch runtime itself (registry, runspace host, loop).
//! - [`HookError`]: errors raised by individual provider hooks.
//! - [`ConfigError`]: errors raised while loading configuration files.
//!
//! `RuntimeError` and `HookError` provide helper methods (`as_label`, `as_message`)
//! for logs and diagnostics.

use std::path::PathBuf;
use thiserror::Error;

/// # Errors produced by the logvisor runtime.
///
/// These represent failures of the orchestration around providers: registration
/// conflicts, unknown names, runspace misuse, and faults that escape a whole
/// dispatch cycle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A provider with the same name is already registered.
    #[error("provider '{name}' is already registered")]
    DuplicateProvider {
        /// Conflicting provider name.
        name: String,
    },

    /// No provider with this name is registered.
    #[error("provider '{name}' is not registered")]
    UnknownProvider {
        /// Requested provider name.
        name: String,
    },

    /// A runspace with this name is running (or still stopping).
    #[error("runspace '{name}' is already running")]
    AlreadyRunning {
        /// Runspace name.
        name: String,
    },

    /// No runspace with this name was ever started.
    #[error("runspace '{name}' is not known")]
    UnknownRunspace {
        /// Runspace name.
        name: String,
    },

    /// `start` was called outside a tokio runtime.
    #[error("runspace '{name}' cannot start outside a tokio runtime")]
    NoRuntime {
        /// Runspace name.
        name: String,
    },

    /// A fault escaped the dispatch cycle body (outside any provider hook).
    #[error("dispatch loop fault: {error}")]
    LoopFault {
        /// The underlying error message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use logvisor::RuntimeError;
    ///
    /// let err = RuntimeError::AlreadyRunning { name: "logging".into() };
    /// assert_eq!(err.as_label(), "runtime_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::DuplicateProvider { .. } => "runtime_duplicate_provider",
            RuntimeError::UnknownProvider { .. } => "runtime_unknown_provider",
            RuntimeError::AlreadyRunning { .. } => "runtime_already_running",
            RuntimeError::UnknownRunspace { .. } => "runtime_unknown_runspace",
            RuntimeError::NoRuntime { .. } => "runtime_no_runtime",
            RuntimeError::LoopFault { .. } => "runtime_loop_fault",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::DuplicateProvider { name } => format!("duplicate provider: {name}"),
            RuntimeError::UnknownProvider { name } => format!("unknown provider: {name}"),
            RuntimeError::AlreadyRunning { name } => format!("runspace running: {name}"),
            RuntimeError::UnknownRunspace { name } => format!("unknown runspace: {name}"),
            RuntimeError::NoRuntime { name } => format!("no tokio runtime for: {name}"),
            RuntimeError::LoopFault { error } => format!("loop fault: {error}"),
        }
    }
}

/// # Errors produced by provider hooks.
///
/// A hook error is always isolated to the provider that raised it: it is recorded
/// in that provider's fault log and never interrupts dispatch to other providers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// Hook failed; the provider stays eligible (begin is retried next cycle).
    #[error("hook failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Hook failed in a way the provider considers unrecoverable.
    ///
    /// The runtime treats it like [`HookError::Fail`]; the distinction is kept for diagnostics.
    #[error("fatal hook error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Hook panicked; assigned by the runtime after catching the unwind.
    #[error("hook panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HookError {
    /// Shorthand for [`HookError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HookError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use logvisor::HookError;
    ///
    /// let err = HookError::fail("disk full");
    /// assert_eq!(err.as_label(), "hook_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Fail { .. } => "hook_failed",
            HookError::Fatal { .. } => "hook_fatal",
            HookError::Panicked { .. } => "hook_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HookError::Fail { error } => format!("error: {error}"),
            HookError::Fatal { error } => format!("fatal: {error}"),
            HookError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

impl From<std::io::Error> for HookError {
    fn from(e: std::io::Error) -> Self {
        HookError::Fail {
            error: e.to_string(),
        }
    }
}

/// # Errors produced while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },
}

//! # Built-in providers
//!
//! Small, self-contained sinks covering the two common destinations.
//!
//! - [`TracingProvider`]: re-emits records as `tracing` events (console).
//! - [`LogFileProvider`]: appends records to a plain text file.

mod console;
mod file;

pub use console::TracingProvider;
pub use file::LogFileProvider;

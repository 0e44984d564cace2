//! Runtime core: dispatch loop, provider lifecycle and runspace supervision.
//!
//! The public entry point is [`Logging`], which owns the queues, the provider
//! registry and the state cell, and hosts the dispatch loop in a runspace.
//!
//! Internal modules:
//! - [`state`]: externally visible [`LoggingState`];
//! - [`lifecycle`]: isolated provider hook invocation;
//! - [`dispatch`]: the dispatch cycle, pacing and shutdown flush;
//! - [`host`]: named background runspaces with stop signalling;
//! - [`shutdown`]: cross-platform termination signal handling;
//! - [`logging`] / [`builder`]: the runtime context and its builder.

mod builder;
mod dispatch;
mod host;
mod lifecycle;
mod logging;
mod shutdown;
mod state;

pub use builder::LoggingBuilder;
pub use dispatch::{DispatchLoop, IntervalPacer, Pacer};
pub use host::{RunState, RunspaceHost};
pub use lifecycle::ProviderLifecycle;
pub use logging::Logging;
pub use shutdown::wait_for_shutdown_signal;
pub use state::{LoggingState, StateCell};

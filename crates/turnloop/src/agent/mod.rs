//! The conversation loop and its supporting modules.
//!
//! - [`session::ToolCallingSession`] drives runs. Start here.
//! - [`session::RunState`] is the per-run state machine; its transitions are
//!   pure and testable on their own.
//! - [`config::SessionConfig`] holds instructions, timeouts and dispatch
//!   options.
//! - [`events`] has the [`EventHandler`] trait and [`SessionEvent`] enum for
//!   observing a run.

pub mod config;
pub mod events;
pub(crate) mod execution;
pub mod session;

pub use config::{DEFAULT_MODEL_TIMEOUT, SessionConfig};
pub use events::{
    CompositeEventHandler, EventHandler, EventObserver, EventResponse, FnEventHandler,
    LoggingHandler, NoopHandler, SessionEvent,
};
pub use session::{FinalAnswer, RunState, RunStats, ToolCallingSession};

//! Convenience re-exports for common `turnloop` types.
//!
//! ```ignore
//! use turnloop::prelude::*;
//! ```
//!
//! Covers the session and its config, event handlers, the tool abstractions,
//! the model client trait with the Responses implementation, and the error
//! types. Wire-level helpers (request building, response parsing) stay in
//! their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{DEFAULT_MODEL, ToolDef, json_schema_for};

// ── Session ─────────────────────────────────────────────────────────
pub use crate::agent::{
    CompositeEventHandler, EventHandler, EventObserver, EventResponse, FinalAnswer,
    FnEventHandler, LoggingHandler, NoopHandler, RunState, RunStats, SessionConfig, SessionEvent,
    ToolCallingSession,
};

// ── Transcript and model ────────────────────────────────────────────
pub use crate::model::{Completion, ModelClient, ModelFuture, ModelRequest, ModelResponse};
pub use crate::transcript::{Message, ToolCallRequest, ToolResultContent, Transcript};

// ── Provider ────────────────────────────────────────────────────────
pub use crate::api::{ResponsesClient, RetryConfig, RetryingClient};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{FnTool, Tool, ToolFuture, ToolSet, parse_tool_args};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{ConfigError, ModelError, ToolError};

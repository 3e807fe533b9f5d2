//! Provider plumbing between a [`ToolCallingSession`](crate::agent::session::ToolCallingSession)
//! and a hosted model:
//!
//! - [`responses`]: [`ResponsesClient`], a [`ModelClient`](crate::model::ModelClient)
//!   for the OpenAI Responses API.
//! - [`retry`]: exponential backoff for transient failures (429, 5xx, network,
//!   timeouts) and the [`RetryingClient`] wrapper. Never retries 4xx client
//!   errors.
//! - [`tracing`]: run IDs for log correlation.

pub mod responses;
pub mod retry;
pub mod tracing;

pub use responses::{DEFAULT_BASE_URL, ResponsesClient};
pub use retry::{RetryConfig, RetryingClient};
pub use tracing::generate_run_id;

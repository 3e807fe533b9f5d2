//! The model side of the loop.
//!
//! A [`ModelClient`] receives the full transcript plus the tool definitions
//! and answers with either final text or one or more tool-call requests.
//! The session never retries a failed call itself; wrap a client in
//! [`RetryingClient`](crate::api::retry::RetryingClient) for that.

use crate::ToolDef;
use crate::error::ModelError;
use crate::transcript::{Message, ToolCallRequest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ModelClient::respond`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<Completion, ModelError>> + Send + 'a>>;

/// Everything the model needs for one turn.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub transcript: &'a [Message],
    pub tools: &'a [ToolDef],
}

/// The model's decision for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    /// No tool calls: this text is the answer.
    Final { text: String },
    /// At least one tool call, in the order the model issued them.
    ToolCalls { calls: Vec<ToolCallRequest> },
}

/// Token usage reported by the provider for one request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageInfo {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// A model response with optional usage accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub response: ModelResponse,
    pub usage: Option<UsageInfo>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response: ModelResponse::Final { text: text.into() },
            usage: None,
        }
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            response: ModelResponse::ToolCalls { calls },
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: UsageInfo) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A language model that can be asked for the next step of a conversation.
///
/// Uses a boxed future so that the trait is dyn-compatible.
pub trait ModelClient: Send + Sync {
    fn respond<'a>(&'a self, request: ModelRequest<'a>) -> ModelFuture<'a>;

    /// Label used in logs.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn respond<'a>(&'a self, request: ModelRequest<'a>) -> ModelFuture<'a> {
        (**self).respond(request)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

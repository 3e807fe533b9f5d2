//! Error types for the conversation loop.
//!
//! Errors fall into three groups with different consequences for a run:
//!
//! - [`ToolError`] is recoverable. It is serialized into a tool result and
//!   sent back to the model, which may correct itself on the next turn.
//! - [`ModelError`] is fatal for the current run. The session reports it as
//!   [`FinalAnswer::Failed`](crate::agent::session::FinalAnswer::Failed).
//! - [`ConfigError`] is raised before any model call is made.
//!
//! Exhausting the turn budget is not an error; it is a
//! [`FinalAnswer`](crate::agent::session::FinalAnswer) variant.

use std::time::Duration;

/// A tool invocation that could not produce a result.
///
/// The `Display` text is what the model sees, so it names the problem and
/// hints at how to recover.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{name}'. Available tools: {available}")]
    UnknownTool { name: String, available: String },

    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{operation} has no finite result; check the operands")]
    NonFinite { operation: String, value: f64 },

    #[error("{0}")]
    Execution(String),

    #[error("tool '{tool}' timed out after {} seconds", .limit.as_secs_f64())]
    Timeout { tool: String, limit: Duration },
}

impl ToolError {
    /// Shorthand for [`ToolError::Execution`].
    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}

/// A failure while obtaining a response from the model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode model response: {0}")]
    Decode(String),

    #[error("model API error: {0}")]
    Api(String),

    #[error("model returned neither text nor tool calls")]
    EmptyResponse,

    #[error("model request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ModelError {
    /// Whether retrying the same request could succeed.
    ///
    /// Rate limits, server errors, transport failures and timeouts are
    /// transient. Client errors (400, 401, 403, 404, 422) never are.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            ModelError::Transport(_) | ModelError::Timeout(_) => true,
            ModelError::Decode(_) | ModelError::Api(_) | ModelError::EmptyResponse => false,
        }
    }
}

/// A precondition of a session or run was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("user input is empty")]
    EmptyInput,

    #[error("turn budget must be at least 1")]
    ZeroTurnBudget,

    #[error("tool name '{0}' is registered more than once")]
    DuplicateTool(String),

    #[error("no tools registered")]
    NoTools,

    #[error("{0} is not set")]
    MissingApiKey(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// An append that would break transcript ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("no pending tool call with id '{0}' in the latest tool-call turn")]
    UnmatchedToolResult(String),

    #[error("{0} tool call(s) of the previous turn have no result yet")]
    UnresolvedToolCalls(usize),

    #[error("tool call id '{0}' appears more than once in one turn")]
    DuplicateCallId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let rate_limited = ModelError::Http {
            status: 429,
            body: "slow down".into(),
        };
        assert!(rate_limited.is_transient());
        assert!(ModelError::Transport("connection reset".into()).is_transient());
        assert!(ModelError::Timeout(Duration::from_secs(5)).is_transient());

        let unauthorized = ModelError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(!unauthorized.is_transient());
        assert!(!ModelError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn unknown_tool_message_lists_available() {
        let err = ToolError::UnknownTool {
            name: "multiply2".into(),
            available: "add, div".into(),
        };
        let text = err.to_string();
        assert!(text.contains("multiply2"));
        assert!(text.contains("add, div"));
    }

    #[test]
    fn timeout_message_has_seconds() {
        let err = ToolError::Timeout {
            tool: "slow".into(),
            limit: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "tool 'slow' timed out after 2 seconds");
    }
}

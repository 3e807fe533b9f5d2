//! Events and handlers for observing a session run.
//!
//! The session reports progress through [`SessionEvent`] variants, from turn
//! start through tool execution to the final outcome. Callers implement
//! [`EventHandler`] to observe them for logging, progress output or metrics.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | [`EventObserver`] | Closures that never respond |
//! | [`CompositeEventHandler`] | Compose multiple handlers in order |

use crate::transcript::ToolResultContent;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by the session during a run.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// A new turn is starting; the transcript is about to be sent.
    TurnStart {
        turn: u32,
        max_turns: u32,
        transcript_len: usize,
    },
    /// The model answered with final text.
    Text(&'a str),
    /// The model requested tool calls this turn.
    ToolCallsReceived { turn: u32, count: usize },
    /// A single tool is about to be executed.
    ToolExecuting {
        call_id: &'a str,
        name: &'a str,
        arguments: &'a str,
    },
    /// A single tool result was appended.
    ToolResult {
        call_id: &'a str,
        name: &'a str,
        content: &'a ToolResultContent,
    },
    /// Token usage reported by the provider for this turn.
    TokenUsage {
        input_tokens: u32,
        output_tokens: u32,
    },
    /// The run ended with an answer.
    Answered,
    /// The turn budget ran out without an answer.
    BudgetExhausted { max_turns: u32 },
    /// The model request failed; the run ends.
    ModelFailed { error: &'a str },
    /// The run was stopped before a model request, by the stop signal or by
    /// a handler returning [`EventResponse::Stop`].
    Cancelled { turn: u32 },
    /// Calls left open by an interrupted run were closed with error results.
    DanglingCallsResolved { count: usize },
}

/// Response from an event handler.
///
/// Most events need no feedback and handlers return `None`. Returning
/// [`EventResponse::Stop`] asks the session to end the run before its next
/// model request, exactly as if the stop signal had fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResponse {
    /// End the run before the next model request.
    Stop,
}

/// Handler for session events.
pub trait EventHandler: Send + Sync {
    /// Called for each event during a run. The default does nothing and
    /// returns `None`.
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        let _ = event;
        None
    }
}

/// A no-op event handler.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let SessionEvent::Text(text) = event {
///         println!("{text}");
///     }
///     None
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&SessionEvent<'_>) -> Option<EventResponse> + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) -> Option<EventResponse> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) -> Option<EventResponse> + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        (self.0)(event)
    }
}

/// Adapts an observation-only closure into an [`EventHandler`].
pub struct EventObserver<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> EventObserver<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for EventObserver<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        (self.0)(event);
        None
    }
}

/// Delegates to several handlers in registration order. The first
/// non-`None` response wins.
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }

    pub fn with_opt(self, handler: Option<impl EventHandler + 'static>) -> Self {
        match handler {
            Some(h) => self.with(h),
            None => self,
        }
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        let mut first = None;
        for handler in &self.handlers {
            let response = handler.on_event(event);
            if first.is_none() {
                first = response;
            }
        }
        first
    }
}

/// An event handler that logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        match event {
            SessionEvent::TurnStart {
                turn,
                max_turns,
                transcript_len,
            } => {
                info!("[turn {turn}/{max_turns}] sending {transcript_len} message(s)");
            }
            SessionEvent::Text(text) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "Model text: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            SessionEvent::ToolCallsReceived { turn, count } => {
                debug!("{count} tool call(s) in turn {turn}");
            }
            SessionEvent::ToolExecuting { name, call_id, .. } => {
                debug!("Executing tool: {name} ({call_id})");
            }
            SessionEvent::ToolResult {
                name,
                call_id,
                content,
            } => match content {
                ToolResultContent::Output(out) => {
                    debug!("Tool {name} ({call_id}) result: {} bytes", out.len());
                }
                ToolResultContent::Error(e) => {
                    info!("Tool {name} ({call_id}) error: {e}");
                }
            },
            SessionEvent::TokenUsage {
                input_tokens,
                output_tokens,
            } => {
                debug!("Tokens: input={input_tokens}, output={output_tokens}");
            }
            SessionEvent::Answered => {
                info!("Session answered");
            }
            SessionEvent::BudgetExhausted { max_turns } => {
                info!("Turn budget exhausted ({max_turns})");
            }
            SessionEvent::ModelFailed { error } => {
                warn!("Model request failed: {error}");
            }
            SessionEvent::Cancelled { turn } => {
                info!("Run cancelled before turn {turn}");
            }
            SessionEvent::DanglingCallsResolved { count } => {
                warn!("Closed {count} tool call(s) left open by an interrupted run");
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn fn_event_handler_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = FnEventHandler::new(move |event| {
            if let SessionEvent::Text(t) = event {
                sink.lock().unwrap().push(t.to_string());
            }
            None
        });
        handler.on_event(&SessionEvent::Text("hello"));
        handler.on_event(&SessionEvent::Answered);
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn composite_delegates_to_all_and_returns_first_response() {
        let count = Arc::new(Mutex::new(0u32));
        let c1 = count.clone();
        let c2 = count.clone();
        let handler = CompositeEventHandler::new()
            .with(EventObserver::new(move |_| *c1.lock().unwrap() += 1))
            .with(FnEventHandler::new(move |_| {
                *c2.lock().unwrap() += 1;
                Some(EventResponse::Stop)
            }))
            .with_if(false, LoggingHandler)
            .with_opt(None::<NoopHandler>);

        let response = handler.on_event(&SessionEvent::Answered);
        assert_eq!(response, Some(EventResponse::Stop));
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn logging_handler_handles_every_variant() {
        let error = ToolResultContent::Error("boom".into());
        let output = ToolResultContent::Output("{}".into());
        let events = [
            SessionEvent::TurnStart {
                turn: 1,
                max_turns: 3,
                transcript_len: 2,
            },
            SessionEvent::Text("hi"),
            SessionEvent::ToolCallsReceived { turn: 1, count: 2 },
            SessionEvent::ToolExecuting {
                call_id: "c1",
                name: "add",
                arguments: "{}",
            },
            SessionEvent::ToolResult {
                call_id: "c1",
                name: "add",
                content: &output,
            },
            SessionEvent::ToolResult {
                call_id: "c2",
                name: "div",
                content: &error,
            },
            SessionEvent::TokenUsage {
                input_tokens: 10,
                output_tokens: 2,
            },
            SessionEvent::Answered,
            SessionEvent::BudgetExhausted { max_turns: 3 },
            SessionEvent::ModelFailed { error: "HTTP 500" },
            SessionEvent::Cancelled { turn: 2 },
            SessionEvent::DanglingCallsResolved { count: 1 },
        ];
        for event in &events {
            assert!(LoggingHandler.on_event(event).is_none());
        }
    }
}

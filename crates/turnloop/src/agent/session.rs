//! The tool-calling conversation loop.
//!
//! A [`ToolCallingSession`] owns the transcript and drives one or more runs.
//! Each run appends a user message and then alternates between asking the
//! model for the next step and executing the tools it requests:
//!
//! ```text
//! Idle → AwaitingModel ─┬→ Answered
//!            ↑          ├→ Failed          (model error, timeout, cancellation)
//!            │          └→ DispatchingTools ─┬→ AwaitingModel  (turns left)
//!            └───────────────────────────────┘→ BudgetExhausted (budget spent)
//! ```
//!
//! Tool problems (unknown name, bad arguments, execution errors, timeouts)
//! never end a run. They are appended as error results so the model can
//! correct itself on the next turn.

use super::config::SessionConfig;
use super::events::{EventHandler, EventResponse, NoopHandler, SessionEvent};
use super::execution::dispatch_tool_calls;
use crate::ToolDef;
use crate::api::tracing::generate_run_id;
use crate::error::{ConfigError, ModelError, TranscriptError};
use crate::model::{ModelClient, ModelRequest, ModelResponse};
use crate::tools::core::ToolSet;
use crate::transcript::{ToolCallRequest, Transcript};
use chrono::{DateTime, Utc};
use tracing::info;

/// Error text for calls left open by a run that was dropped mid-turn.
const INTERRUPTED_CALL: &str = "the tool call was interrupted before it produced a result";

// ── Run state ──────────────────────────────────────────────────────

/// Where a run is in its lifecycle. Turns are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AwaitingModel { turn: u32 },
    DispatchingTools { turn: u32 },
    Answered,
    BudgetExhausted,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Answered | RunState::BudgetExhausted | RunState::Failed
        )
    }

    /// Idle → first model request.
    pub fn start(self) -> RunState {
        match self {
            RunState::Idle => RunState::AwaitingModel { turn: 1 },
            other => other,
        }
    }

    /// Transition after the model answered in `AwaitingModel`.
    pub fn after_response(self, response: &ModelResponse) -> RunState {
        match (self, response) {
            (RunState::AwaitingModel { .. }, ModelResponse::Final { .. }) => RunState::Answered,
            (RunState::AwaitingModel { turn }, ModelResponse::ToolCalls { .. }) => {
                RunState::DispatchingTools { turn }
            }
            (other, _) => other,
        }
    }

    /// Transition once every call of the turn has a result. Tools requested
    /// in the last permitted turn still run; the budget is checked afterwards.
    pub fn after_dispatch(self, max_turns: u32) -> RunState {
        match self {
            RunState::DispatchingTools { turn } if turn >= max_turns => RunState::BudgetExhausted,
            RunState::DispatchingTools { turn } => RunState::AwaitingModel { turn: turn + 1 },
            other => other,
        }
    }

    /// Any non-terminal state → Failed.
    pub fn fail(self) -> RunState {
        if self.is_terminal() {
            self
        } else {
            RunState::Failed
        }
    }
}

// ── Run result ─────────────────────────────────────────────────────

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalAnswer {
    /// The model produced a final answer.
    Answered { text: String },
    /// Every turn was spent on tool calls.
    BudgetExhausted,
    /// The model request failed, timed out, or the run was cancelled.
    Failed { reason: String },
}

impl FinalAnswer {
    /// The answer text, if the run was answered.
    pub fn text(&self) -> Option<&str> {
        match self {
            FinalAnswer::Answered { text } => Some(text),
            _ => None,
        }
    }
}

/// Bookkeeping for the most recent run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Model requests issued.
    pub turns_used: u32,
    pub tool_calls: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl RunStats {
    fn new() -> Self {
        Self {
            run_id: generate_run_id(),
            started_at: Utc::now(),
            turns_used: 0,
            tool_calls: 0,
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

// ── Session ────────────────────────────────────────────────────────

/// A conversation between one model and one tool set.
///
/// The client and tools are borrowed for the session's lifetime; the
/// transcript is owned and only grows.
///
/// ```ignore
/// let handler = CompositeEventHandler::new().with(LoggingHandler);
/// let mut session = ToolCallingSession::new(&client, &tools, SessionConfig::default())?
///     .with_event_handler(&handler);
/// let answer = session.run("What is 5 + 3?", 10).await?;
/// ```
pub struct ToolCallingSession<'a> {
    client: &'a dyn ModelClient,
    tools: &'a ToolSet,
    tool_defs: Vec<ToolDef>,
    config: SessionConfig,
    transcript: Transcript,
    event_handler: &'a dyn EventHandler,
    /// Checked before each model request. Returning `true` ends the run.
    stop_signal: Option<Box<dyn Fn() -> bool + Send + Sync + 'a>>,
    last_run: Option<RunStats>,
}

impl<'a> ToolCallingSession<'a> {
    /// Build a session, seeding the transcript with the configured developer
    /// instructions.
    ///
    /// Fails if a tool name was registered twice, or if the tool set is empty
    /// while [`SessionConfig::require_tools`] is set.
    pub fn new(
        client: &'a dyn ModelClient,
        tools: &'a ToolSet,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        tools.validate()?;
        if config.require_tools && tools.is_empty() {
            return Err(ConfigError::NoTools);
        }
        Ok(Self {
            client,
            tools,
            tool_defs: tools.definitions(),
            transcript: Transcript::seeded(config.instructions.iter().cloned()),
            config,
            event_handler: &NoopHandler,
            stop_signal: None,
            last_run: None,
        })
    }

    /// Attach an event handler.
    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Attach a stop signal, checked before each model request.
    pub fn with_stop_signal(mut self, signal: impl Fn() -> bool + Send + Sync + 'a) -> Self {
        self.stop_signal = Some(Box::new(signal));
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stats of the most recent run, if any.
    pub fn last_run(&self) -> Option<&RunStats> {
        self.last_run.as_ref()
    }

    /// Consume the session, keeping its history.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Run the loop for one user message.
    ///
    /// Fails with [`ConfigError`] before contacting the model if the input is
    /// blank or `max_turns` is zero. Every other outcome is a
    /// [`FinalAnswer`]. Runs may be repeated; history carries over and each
    /// run gets its own turn budget.
    pub async fn run(
        &mut self,
        user_input: &str,
        max_turns: u32,
    ) -> Result<FinalAnswer, ConfigError> {
        if user_input.trim().is_empty() {
            return Err(ConfigError::EmptyInput);
        }
        if max_turns == 0 {
            return Err(ConfigError::ZeroTurnBudget);
        }

        let mut stats = RunStats::new();
        info!(
            "Session run started: run_id={}, model={}, max_turns={max_turns}",
            stats.run_id,
            self.client.model_name()
        );

        let mut stop_requested = false;
        let closed = self.transcript.resolve_dangling(INTERRUPTED_CALL);
        if closed > 0 {
            stop_requested |= self.emit(SessionEvent::DanglingCallsResolved { count: closed });
        }

        let mut state = RunState::Idle;
        let mut answer = String::new();
        let mut failure = String::new();
        let mut pending: Vec<ToolCallRequest> = Vec::new();

        if let Err(e) = self.transcript.push_user(user_input) {
            failure = e.to_string();
            state = state.fail();
        }

        while !state.is_terminal() {
            state = match state {
                RunState::Idle => state.start(),

                RunState::AwaitingModel { turn } => {
                    if stop_requested || self.stop_signal.as_ref().is_some_and(|s| s()) {
                        self.emit(SessionEvent::Cancelled { turn });
                        failure = format!("run cancelled before turn {turn}");
                        state.fail()
                    } else {
                        stop_requested |= self.emit(SessionEvent::TurnStart {
                            turn,
                            max_turns,
                            transcript_len: self.transcript.len(),
                        });
                        stats.turns_used = turn;
                        match self.request_model(&mut stats).await {
                            Ok(response) => {
                                let next = state.after_response(&response);
                                match self.record_response(response, &mut pending) {
                                    Ok(Some(text)) => {
                                        answer = text;
                                        next
                                    }
                                    Ok(None) => {
                                        stop_requested |=
                                            self.emit(SessionEvent::ToolCallsReceived {
                                                turn,
                                                count: pending.len(),
                                            });
                                        next
                                    }
                                    Err(reason) => {
                                        failure = reason;
                                        state.fail()
                                    }
                                }
                            }
                            Err(e) => {
                                let error = e.to_string();
                                self.emit(SessionEvent::ModelFailed { error: &error });
                                failure = error;
                                state.fail()
                            }
                        }
                    }
                }

                RunState::DispatchingTools { .. } => {
                    let calls = std::mem::take(&mut pending);
                    stats.tool_calls += calls.len();
                    match self.dispatch(&calls).await {
                        Ok(stop) => {
                            stop_requested |= stop;
                            state.after_dispatch(max_turns)
                        }
                        Err(reason) => {
                            failure = reason;
                            state.fail()
                        }
                    }
                }

                terminal => terminal,
            };
        }

        let outcome = match state {
            RunState::Answered => {
                self.emit(SessionEvent::Answered);
                FinalAnswer::Answered { text: answer }
            }
            RunState::BudgetExhausted => {
                self.emit(SessionEvent::BudgetExhausted { max_turns });
                FinalAnswer::BudgetExhausted
            }
            _ => FinalAnswer::Failed { reason: failure },
        };

        info!(
            "Session run finished: run_id={}, turns={}, tool_calls={}, outcome={}",
            stats.run_id,
            stats.turns_used,
            stats.tool_calls,
            match &outcome {
                FinalAnswer::Answered { .. } => "answered",
                FinalAnswer::BudgetExhausted => "budget_exhausted",
                FinalAnswer::Failed { .. } => "failed",
            }
        );
        self.last_run = Some(stats);
        Ok(outcome)
    }

    /// Send the transcript and tool definitions, bounded by the model timeout.
    async fn request_model(&self, stats: &mut RunStats) -> Result<ModelResponse, ModelError> {
        debug_assert!(self.transcript.pending_call_ids().is_empty());
        let request = ModelRequest {
            transcript: self.transcript.messages(),
            tools: &self.tool_defs,
        };
        let fut = self.client.respond(request);
        let completion = match self.config.model_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ModelError::Timeout(limit))??,
            None => fut.await?,
        };

        if let Some(usage) = completion.usage {
            stats.input_tokens += u64::from(usage.input_tokens);
            stats.output_tokens += u64::from(usage.output_tokens);
            self.emit(SessionEvent::TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            });
        }

        match completion.response {
            ModelResponse::ToolCalls { calls } if calls.is_empty() => {
                Err(ModelError::EmptyResponse)
            }
            response => Ok(response),
        }
    }

    /// Append the model's response. Returns the answer text for a final
    /// response, or stashes the calls in `pending` and returns `None`.
    fn record_response(
        &mut self,
        response: ModelResponse,
        pending: &mut Vec<ToolCallRequest>,
    ) -> Result<Option<String>, String> {
        match response {
            ModelResponse::Final { text } => {
                self.emit(SessionEvent::Text(&text));
                self.transcript
                    .push_assistant_text(text.clone())
                    .map_err(|e| e.to_string())?;
                Ok(Some(text))
            }
            ModelResponse::ToolCalls { calls } => {
                // Rejected before anything runs; the turn is not appended.
                self.transcript
                    .push_tool_calls(calls.clone())
                    .map_err(|e| match e {
                        TranscriptError::DuplicateCallId(_) => {
                            format!("model protocol violation: {e}")
                        }
                        e => e.to_string(),
                    })?;
                *pending = calls;
                Ok(None)
            }
        }
    }

    /// Execute a turn's calls and append one result per call, in request
    /// order. Returns whether a handler asked to stop.
    async fn dispatch(&mut self, calls: &[ToolCallRequest]) -> Result<bool, String> {
        let timeout = self.config.tool_timeout.or(self.tools.default_timeout());
        let (results, mut stop) = dispatch_tool_calls(
            self.tools,
            calls,
            timeout,
            self.config.parallel_tools,
            self.event_handler,
        )
        .await;

        for (call, content) in calls.iter().zip(results) {
            stop |= self.emit(SessionEvent::ToolResult {
                call_id: &call.call_id,
                name: &call.tool_name,
                content: &content,
            });
            self.transcript
                .push_tool_result(&call.call_id, content)
                .map_err(|e| format!("model protocol violation: {e}"))?;
        }
        Ok(stop)
    }

    fn emit(&self, event: SessionEvent<'_>) -> bool {
        self.event_handler.on_event(&event) == Some(EventResponse::Stop)
    }
}

//! Conversation history exchanged with the model.
//!
//! A [`Transcript`] is the ordered, append-only list of [`Message`]s that is
//! sent verbatim on every model request. Past entries are never edited,
//! reordered or pruned, so replaying a transcript from the start reproduces
//! exactly what the model saw at every step.
//!
//! The transcript also enforces tool-call pairing: a tool result may only be
//! appended for a call of the latest tool-call turn that has no result yet.

use crate::error::TranscriptError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ── Message types ──────────────────────────────────────────────────

/// A tool invocation requested by the model.
///
/// `call_id` is opaque and generated by the model client; it is only
/// guaranteed unique within one turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub tool_name: String,
    /// Arguments exactly as the model produced them. May not be valid JSON.
    pub raw_arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }
}

/// What the model said in an assistant turn.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssistantContent {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

/// Outcome of one tool invocation as recorded in the transcript.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolResultContent {
    /// Serialized JSON result.
    Output(String),
    /// Human-readable error text for the model.
    Error(String),
}

impl ToolResultContent {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolResultContent::Error(_))
    }

    /// The payload sent to the model. Errors are wrapped as
    /// `{"error": "<text>"}` so every result is a JSON document.
    pub fn to_wire(&self) -> String {
        match self {
            ToolResultContent::Output(s) => s.clone(),
            ToolResultContent::Error(e) => serde_json::json!({ "error": e }).to_string(),
        }
    }
}

/// A single transcript entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System-level instruction. Governs the turns that follow it.
    Developer { text: String },
    User { text: String },
    Assistant { content: AssistantContent },
    ToolResult {
        call_id: String,
        content: ToolResultContent,
    },
}

impl Message {
    pub fn developer(text: impl Into<String>) -> Self {
        Message::Developer { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Message::Assistant {
            content: AssistantContent::Text(text.into()),
        }
    }

    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Message::Assistant {
            content: AssistantContent::ToolCalls(calls),
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: ToolResultContent) -> Self {
        Message::ToolResult {
            call_id: call_id.into(),
            content,
        }
    }

    /// Short role label used in logs.
    pub fn role(&self) -> &'static str {
        match self {
            Message::Developer { .. } => "developer",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::ToolResult { .. } => "tool",
        }
    }
}

// ── Transcript ─────────────────────────────────────────────────────

/// Append-only conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript seeded with developer instructions, in order.
    pub fn seeded<I, S>(instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: instructions.into_iter().map(Message::developer).collect(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_developer(&mut self, text: impl Into<String>) {
        self.messages.push(Message::developer(text));
    }

    /// Append a user message. Rejected while tool calls are unresolved.
    pub fn push_user(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        self.ensure_resolved()?;
        self.messages.push(Message::user(text));
        Ok(())
    }

    /// Append a final assistant answer.
    pub fn push_assistant_text(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        self.ensure_resolved()?;
        self.messages.push(Message::assistant_text(text));
        Ok(())
    }

    /// Append the model's tool-call requests verbatim, opening a new
    /// tool-call turn. Call IDs must be distinct within the turn.
    pub fn push_tool_calls(
        &mut self,
        calls: Vec<ToolCallRequest>,
    ) -> Result<(), TranscriptError> {
        self.ensure_resolved()?;
        let mut seen = HashSet::new();
        if let Some(dup) = calls.iter().find(|c| !seen.insert(c.call_id.as_str())) {
            return Err(TranscriptError::DuplicateCallId(dup.call_id.clone()));
        }
        self.messages.push(Message::assistant_tool_calls(calls));
        Ok(())
    }

    /// Append the result for a pending call of the latest tool-call turn.
    pub fn push_tool_result(
        &mut self,
        call_id: &str,
        content: ToolResultContent,
    ) -> Result<(), TranscriptError> {
        if !self.pending_call_ids().iter().any(|id| id == call_id) {
            return Err(TranscriptError::UnmatchedToolResult(call_id.to_string()));
        }
        self.messages.push(Message::tool_result(call_id, content));
        Ok(())
    }

    /// Call IDs of the latest tool-call turn that have no result yet, in
    /// request order.
    pub fn pending_call_ids(&self) -> Vec<String> {
        let Some(turn_start) = self.messages.iter().rposition(|m| {
            matches!(
                m,
                Message::Assistant {
                    content: AssistantContent::ToolCalls(_)
                }
            )
        }) else {
            return Vec::new();
        };

        let Message::Assistant {
            content: AssistantContent::ToolCalls(calls),
        } = &self.messages[turn_start]
        else {
            return Vec::new();
        };

        // Counted per id so a repeated id needs one result per occurrence.
        let mut answered: HashMap<&str, usize> = HashMap::new();
        for m in &self.messages[turn_start + 1..] {
            if let Message::ToolResult { call_id, .. } = m {
                *answered.entry(call_id.as_str()).or_default() += 1;
            }
        }

        calls
            .iter()
            .map(|c| c.call_id.as_str())
            .filter(|id| match answered.get_mut(id) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    false
                }
                _ => true,
            })
            .map(str::to_string)
            .collect()
    }

    /// Close every pending call with an error result.
    ///
    /// Needed when a run was cancelled between appending tool calls and
    /// appending their results. Returns how many calls were closed.
    pub fn resolve_dangling(&mut self, reason: &str) -> usize {
        let pending = self.pending_call_ids();
        for call_id in &pending {
            self.messages.push(Message::tool_result(
                call_id.as_str(),
                ToolResultContent::Error(reason.to_string()),
            ));
        }
        pending.len()
    }

    fn ensure_resolved(&self) -> Result<(), TranscriptError> {
        match self.pending_call_ids().len() {
            0 => Ok(()),
            n => Err(TranscriptError::UnresolvedToolCalls(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, "{}")
    }

    #[test]
    fn seeded_has_developer_messages_first() {
        let t = Transcript::seeded(["translate to English"]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0], Message::developer("translate to English"));
        assert_eq!(Transcript::new().len(), 0);
    }

    #[test]
    fn tool_result_requires_pending_call() {
        let mut t = Transcript::new();
        t.push_user("5+3").unwrap();
        let err = t
            .push_tool_result("c1", ToolResultContent::Output("{}".into()))
            .unwrap_err();
        assert_eq!(err, TranscriptError::UnmatchedToolResult("c1".into()));

        t.push_tool_calls(vec![call("c1", "add")]).unwrap();
        t.push_tool_result("c1", ToolResultContent::Output(r#"{"result":8}"#.into()))
            .unwrap();

        // Same id twice is no longer pending.
        assert!(
            t.push_tool_result("c1", ToolResultContent::Output("{}".into()))
                .is_err()
        );
    }

    #[test]
    fn pending_ids_only_cover_latest_turn() {
        let mut t = Transcript::new();
        t.push_tool_calls(vec![call("a", "add")]).unwrap();
        t.push_tool_result("a", ToolResultContent::Output("1".into()))
            .unwrap();
        // Call ids may be reused across turns.
        t.push_tool_calls(vec![call("a", "add"), call("b", "sub")])
            .unwrap();
        assert_eq!(t.pending_call_ids(), vec!["a".to_string(), "b".to_string()]);

        t.push_tool_result("b", ToolResultContent::Output("2".into()))
            .unwrap();
        assert_eq!(t.pending_call_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn duplicate_call_ids_in_one_turn_are_rejected() {
        let mut t = Transcript::new();
        t.push_user("count twice").unwrap();
        let err = t
            .push_tool_calls(vec![call("a", "count"), call("a", "count")])
            .unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateCallId("a".into()));
        assert_eq!(t.len(), 1);
        assert!(t.pending_call_ids().is_empty());
    }

    #[test]
    fn repeated_ids_stay_pending_until_each_has_a_result() {
        // Reachable through a deserialized transcript, which bypasses the
        // append checks.
        let t: Transcript = serde_json::from_value(serde_json::json!({
            "messages": [
                {"role": "assistant", "content": {"tool_calls": [
                    {"call_id": "a", "tool_name": "count", "raw_arguments": "{}"},
                    {"call_id": "a", "tool_name": "count", "raw_arguments": "{}"}
                ]}},
                {"role": "tool_result", "call_id": "a", "content": {"output": "1"}}
            ]
        }))
        .unwrap();
        assert_eq!(t.pending_call_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn appends_blocked_while_calls_unresolved() {
        let mut t = Transcript::new();
        t.push_tool_calls(vec![call("a", "add")]).unwrap();
        assert_eq!(
            t.push_user("next").unwrap_err(),
            TranscriptError::UnresolvedToolCalls(1)
        );
        assert!(t.push_assistant_text("done").is_err());
    }

    #[test]
    fn resolve_dangling_closes_pending_calls() {
        let mut t = Transcript::new();
        t.push_tool_calls(vec![call("a", "add"), call("b", "div")])
            .unwrap();
        t.push_tool_result("a", ToolResultContent::Output("3".into()))
            .unwrap();

        assert_eq!(t.resolve_dangling("cancelled"), 1);
        assert!(t.pending_call_ids().is_empty());
        assert_eq!(
            t.last(),
            Some(&Message::tool_result(
                "b",
                ToolResultContent::Error("cancelled".into())
            ))
        );
        assert_eq!(t.resolve_dangling("cancelled"), 0);
        t.push_user("again").unwrap();
    }

    #[test]
    fn error_result_wire_form_is_json() {
        let wire = ToolResultContent::Error("division by zero".into()).to_wire();
        let parsed: serde_json::Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed["error"], "division by zero");
    }

    #[test]
    fn message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "hi");

        let json = serde_json::to_value(Message::assistant_tool_calls(vec![call("c", "add")]))
            .unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"]["tool_calls"][0]["tool_name"], "add");
    }
}

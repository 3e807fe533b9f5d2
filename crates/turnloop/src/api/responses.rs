//! [`ModelClient`] for the OpenAI Responses API.
//!
//! Each turn is a single `POST {base_url}/responses` carrying the whole
//! transcript as `input` items. Assistant tool-call turns become
//! `function_call` items and tool results become `function_call_output`
//! items, paired by `call_id`.

use crate::ToolDef;
use crate::error::{ConfigError, ModelError};
use crate::model::{Completion, ModelClient, ModelFuture, ModelRequest, ModelResponse, UsageInfo};
use crate::transcript::{AssistantContent, Message, ToolCallRequest};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default API root. Overridden by `OPENAI_BASE_URL` in [`ResponsesClient::from_env`].
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the Responses API.
pub struct ResponsesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl ResponsesClient {
    /// Create a client for `model` against [`DEFAULT_BASE_URL`].
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("turnloop/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            temperature: None,
        })
    }

    /// Create a client from `OPENAI_API_KEY`, honoring `OPENAI_BASE_URL`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("OPENAI_API_KEY".into()))?;
        let client = Self::new(api_key, model)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sampling temperature. `None` leaves the provider default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    async fn send(&self, request: ModelRequest<'_>) -> Result<Completion, ModelError> {
        let body = build_request_body(&self.model, self.temperature, &request);
        debug!(
            "Model request: model={}, items={}, tools={}",
            self.model,
            request.transcript.len(),
            request.tools.len(),
        );
        trace!("Request payload: {body}");

        let start = Instant::now();
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ModelError::Transport(format!("failed to read response: {e}")))?;
        debug!(
            "Model response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_response(&text)
    }
}

impl ModelClient for ResponsesClient {
    fn respond<'a>(&'a self, request: ModelRequest<'a>) -> ModelFuture<'a> {
        Box::pin(self.send(request))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ── Request mapping ────────────────────────────────────────────────

/// Build the JSON body for one turn.
pub fn build_request_body(model: &str, temperature: Option<f32>, request: &ModelRequest<'_>) -> Value {
    let mut body = json!({
        "model": model,
        "input": input_items(request.transcript),
    });
    if !request.tools.is_empty() {
        body["tools"] = request.tools.iter().map(tool_item).collect();
    }
    if let Some(t) = temperature {
        body["temperature"] = json!(t);
    }
    body
}

fn input_items(transcript: &[Message]) -> Vec<Value> {
    let mut items = Vec::with_capacity(transcript.len());
    for message in transcript {
        match message {
            Message::Developer { text } => {
                items.push(json!({ "role": "developer", "content": text }));
            }
            Message::User { text } => {
                items.push(json!({ "role": "user", "content": text }));
            }
            Message::Assistant {
                content: AssistantContent::Text(text),
            } => {
                items.push(json!({ "role": "assistant", "content": text }));
            }
            Message::Assistant {
                content: AssistantContent::ToolCalls(calls),
            } => {
                items.extend(calls.iter().map(|c| {
                    json!({
                        "type": "function_call",
                        "call_id": c.call_id,
                        "name": c.tool_name,
                        "arguments": c.raw_arguments,
                    })
                }));
            }
            Message::ToolResult { call_id, content } => {
                items.push(json!({
                    "type": "function_call_output",
                    "call_id": call_id,
                    "output": content.to_wire(),
                }));
            }
        }
    }
    items
}

fn tool_item(def: &ToolDef) -> Value {
    json!({
        "type": "function",
        "name": def.name,
        "description": def.description,
        "parameters": def.parameters,
        "strict": def.strict,
    })
}

// ── Response parsing ───────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<UsageInfo>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Unknown,
}

/// Parse a Responses API body.
///
/// Any `function_call` item makes the turn a tool-call turn; text emitted
/// alongside the calls is dropped. Otherwise the output text parts are
/// joined into the final answer.
pub fn parse_response(body: &str) -> Result<Completion, ModelError> {
    let parsed: RawResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Decode(e.to_string()))?;
    if let Some(err) = parsed.error {
        return Err(ModelError::Api(err.message));
    }

    let mut text = String::new();
    let mut calls = Vec::new();
    for item in parsed.output {
        match item {
            OutputItem::Message { content } => {
                for part in content {
                    match part {
                        ContentPart::OutputText { text: t } | ContentPart::Refusal { refusal: t } => {
                            text.push_str(&t)
                        }
                        ContentPart::Unknown => {}
                    }
                }
            }
            OutputItem::FunctionCall {
                call_id,
                name,
                arguments,
            } => calls.push(ToolCallRequest::new(call_id, name, arguments)),
            OutputItem::Unknown => {}
        }
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: input={}, output={}",
            usage.input_tokens, usage.output_tokens
        );
    }

    let response = if !calls.is_empty() {
        if !text.is_empty() {
            debug!("Dropping {} chars of text sent alongside tool calls", text.len());
        }
        ModelResponse::ToolCalls { calls }
    } else if text.is_empty() {
        return Err(ModelError::EmptyResponse);
    } else {
        ModelResponse::Final { text }
    };
    Ok(Completion {
        response,
        usage: parsed.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ToolResultContent;

    fn sample_transcript() -> Vec<Message> {
        vec![
            Message::developer("Use the tools."),
            Message::user("What is 5 + 3?"),
            Message::assistant_tool_calls(vec![ToolCallRequest::new(
                "call_1",
                "add",
                r#"{"term1":5,"term2":3}"#,
            )]),
            Message::tool_result("call_1", ToolResultContent::Output(r#"{"result":8}"#.into())),
            Message::tool_result("call_2", ToolResultContent::Error("bad".into())),
            Message::assistant_text("8"),
        ]
    }

    #[test]
    fn transcript_maps_to_input_items() {
        let transcript = sample_transcript();
        let tools = vec![ToolDef::new("add", "Add", json!({"type": "object"})).strict()];
        let request = ModelRequest {
            transcript: &transcript,
            tools: &tools,
        };
        let body = build_request_body("gpt-4.1", Some(0.0), &request);

        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["temperature"], 0.0);
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 6);
        assert_eq!(input[0], json!({"role": "developer", "content": "Use the tools."}));
        assert_eq!(input[1]["role"], "user");
        assert_eq!(
            input[2],
            json!({
                "type": "function_call",
                "call_id": "call_1",
                "name": "add",
                "arguments": r#"{"term1":5,"term2":3}"#,
            })
        );
        assert_eq!(input[3]["type"], "function_call_output");
        assert_eq!(input[3]["output"], r#"{"result":8}"#);
        assert_eq!(input[4]["output"], r#"{"error":"bad"}"#);
        assert_eq!(input[5], json!({"role": "assistant", "content": "8"}));

        let tool = &body["tools"][0];
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["name"], "add");
        assert_eq!(tool["strict"], true);
    }

    #[test]
    fn omits_empty_tools_and_temperature() {
        let transcript = vec![Message::user("hi")];
        let request = ModelRequest {
            transcript: &transcript,
            tools: &[],
        };
        let body = build_request_body("gpt-4o-mini", None, &request);
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn parses_final_text() {
        let body = r#"{
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Hello", "annotations": []},
                    {"type": "output_text", "text": " world"}
                ]}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3, "total_tokens": 15}
        }"#;
        let completion = parse_response(body).unwrap();
        assert_eq!(
            completion.response,
            ModelResponse::Final {
                text: "Hello world".into()
            }
        );
        assert_eq!(
            completion.usage,
            Some(UsageInfo {
                input_tokens: 12,
                output_tokens: 3
            })
        );
    }

    #[test]
    fn parses_tool_calls_in_order() {
        let body = r#"{
            "output": [
                {"type": "function_call", "id": "fc_1", "call_id": "c1", "name": "mul", "arguments": "{\"term1\":2,\"term2\":3}"},
                {"type": "function_call", "id": "fc_2", "call_id": "c2", "name": "add", "arguments": "{\"term1\":1,\"term2\":1}"}
            ]
        }"#;
        let completion = parse_response(body).unwrap();
        let ModelResponse::ToolCalls { calls } = completion.response else {
            panic!("expected tool calls");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call_id, "c1");
        assert_eq!(calls[0].tool_name, "mul");
        assert_eq!(calls[1].tool_name, "add");
        assert!(completion.usage.is_none());
    }

    #[test]
    fn api_error_and_garbage_are_model_errors() {
        let err = parse_response(r#"{"error": {"message": "model not found"}}"#).unwrap_err();
        assert_eq!(err, ModelError::Api("model not found".into()));

        assert!(matches!(parse_response("not json"), Err(ModelError::Decode(_))));
        assert_eq!(
            parse_response(r#"{"output": []}"#),
            Err(ModelError::EmptyResponse)
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ResponsesClient::new("key", "gpt-4.1")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/responses");
        assert_eq!(client.model_name(), "gpt-4.1");
    }
}

//! Tool-calling conversation loop for LLM agents.
//!
//! `turnloop` drives the protocol between a language model and a set of
//! local tools: send the conversation to the model, execute the tool calls it
//! requests, append the structured results, and repeat until the model
//! answers or the turn budget runs out.
//!
//! The core abstraction is the
//! [`ToolCallingSession`](agent::session::ToolCallingSession). It owns the
//! [`Transcript`](transcript::Transcript), borrows a
//! [`ModelClient`](model::ModelClient) and a [`ToolSet`](tools::core::ToolSet),
//! and reports every run as a [`FinalAnswer`](agent::session::FinalAnswer).
//!
//! # Getting started
//!
//! ```ignore
//! use turnloop::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("OPENAI_API_KEY").map_err(|e| e.to_string())?;
//!     let client = ResponsesClient::new(api_key, "gpt-4.1")
//!         .map_err(|e| e.to_string())?
//!         .with_temperature(Some(0.0));
//!
//!     let tools = ToolSet::new().with_arithmetic_tools();
//!     let config = SessionConfig::default()
//!         .with_instruction("Use the tools for every calculation.");
//!
//!     let mut session = ToolCallingSession::new(&client, &tools, config)
//!         .map_err(|e| e.to_string())?
//!         .with_event_handler(&LoggingHandler);
//!
//!     match session.run("What is 12.5 * 4 - 7?", 10).await.map_err(|e| e.to_string())? {
//!         FinalAnswer::Answered { text } => println!("{text}"),
//!         FinalAnswer::BudgetExhausted => eprintln!("no answer within 10 turns"),
//!         FinalAnswer::Failed { reason } => eprintln!("run failed: {reason}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | [`ToolCallingSession`](agent::session::ToolCallingSession), run state machine, config, events |
//! | [`transcript`] | Message types and the append-only [`Transcript`](transcript::Transcript) |
//! | [`model`] | The [`ModelClient`](model::ModelClient) trait and its request/response types |
//! | [`tools`] | [`Tool`](tools::core::Tool) trait, [`ToolSet`](tools::core::ToolSet), arithmetic tools |
//! | [`api`] | OpenAI Responses client, retry with backoff, run IDs |
//! | [`error`] | Tool, model, config and transcript errors |

pub mod agent;
pub mod api;
pub mod error;
pub mod model;
pub mod prelude;
pub mod tools;
pub mod transcript;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Re-export schemars for downstream crates.
pub use schemars;

/// Default model for all LLM calls.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use turnloop::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct SearchArgs {
///     query: String,
/// }
///
/// let schema = json_schema_for::<SearchArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"query".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Tool definitions ───────────────────────────────────────────────

/// The schema half of a tool: what the model is told about it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
    /// Ask the provider to constrain arguments to the schema exactly.
    #[serde(default)]
    pub strict: bool,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: false,
        }
    }

    /// Mark the definition strict.
    ///
    /// Strict schemas may not carry schemars metadata keys and must close the
    /// argument object, so `$schema` and `title` are dropped and
    /// `additionalProperties` is forced to `false`.
    pub fn strict(mut self) -> Self {
        if let Some(obj) = self.parameters.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
            obj.insert("additionalProperties".into(), serde_json::Value::Bool(false));
        }
        self.strict = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct QueryArgs {
        /// Search query.
        query: String,
    }

    #[test]
    fn strict_closes_schema() {
        let def = ToolDef::new("q", "query", json_schema_for::<QueryArgs>()).strict();
        assert!(def.strict);
        assert_eq!(def.parameters["additionalProperties"], false);
        assert!(def.parameters.get("$schema").is_none());
        assert!(def.parameters.get("title").is_none());
        assert_eq!(def.parameters["required"][0], "query");
    }

    #[test]
    fn tool_def_defaults_to_non_strict() {
        let def = ToolDef::new("q", "query", serde_json::json!({"type": "object"}));
        assert!(!def.strict);
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["name"], "q");
    }
}

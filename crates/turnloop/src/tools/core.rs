//! Tool abstraction for LLM function-calling.
//!
//! The [`Tool`] trait defines the interface that every tool must implement:
//! a definition (name, description, JSON Schema) and an async `execute`
//! method over already-parsed JSON arguments. Tools are collected into a
//! [`ToolSet`] which handles lookup, argument validation, timeouts and
//! result serialization.

use crate::ToolDef;
use crate::error::{ConfigError, ToolError};
use crate::tools::reflection::format_tool_failure;
use crate::transcript::{ToolCallRequest, ToolResultContent};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Maximum size (in bytes) for serialized tool output before truncation.
pub const DEFAULT_MAX_RESULT_BYTES: usize = 30_000;

/// Default timeout for tool execution (60 seconds).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + 'a>>;

// ── Tool trait ─────────────────────────────────────────────────────

/// A named, schema-described callable the model can invoke.
///
/// `execute` receives arguments that already parsed as JSON and passed the
/// definition's schema. It returns a JSON value on success; failures are
/// reported as [`ToolError`] and become error results in the transcript.
///
/// # Example
///
/// ```ignore
/// struct Clock;
///
/// impl Tool for Clock {
///     fn definition(&self) -> ToolDef {
///         ToolDef::new("now", "Current UTC time", json!({"type": "object", "properties": {}}))
///     }
///
///     fn execute(&self, _arguments: serde_json::Value) -> ToolFuture<'_> {
///         Box::pin(async { Ok(json!({ "now": chrono::Utc::now().to_rfc3339() })) })
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The definition sent to the model.
    fn definition(&self) -> ToolDef;

    /// Run the tool. Uses a boxed future so the trait stays dyn-compatible.
    fn execute(&self, arguments: serde_json::Value) -> ToolFuture<'_>;

    /// The tool's name (delegates to the definition).
    fn name(&self) -> String {
        self.definition().name
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// A collection of tools dispatched by name.
///
/// Registration order is preserved and is the order definitions are sent to
/// the model. The builder methods never fail; a name registered twice is
/// remembered and reported by [`validate`](ToolSet::validate), which the
/// session calls on construction.
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_default_timeout(Some(Duration::from_secs(10)))
///     .with_arithmetic_tools()
///     .with_if(search_enabled, TavilySearch::new(key));
/// ```
pub struct ToolSet {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
    duplicates: Vec<String>,
    max_result_bytes: usize,
    /// Whether to validate tool arguments against JSON Schema before execution.
    validate_args: bool,
    /// Default timeout for tool execution. `None` disables timeouts.
    default_timeout: Option<Duration>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.order)
            .field("max_result_bytes", &self.max_result_bytes)
            .field("validate_args", &self.validate_args)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl ToolSet {
    /// Create an empty tool set with argument validation on.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            duplicates: Vec::new(),
            max_result_bytes: DEFAULT_MAX_RESULT_BYTES,
            validate_args: true,
            default_timeout: Some(DEFAULT_TOOL_TIMEOUT),
        }
    }

    /// Set the maximum result size in bytes before truncation.
    pub fn with_max_result_bytes(mut self, max: usize) -> Self {
        self.max_result_bytes = max;
        self
    }

    /// Toggle JSON Schema argument validation before tool execution.
    pub fn with_arg_validation(mut self, enabled: bool) -> Self {
        self.validate_args = enabled;
        self
    }

    /// Set the default timeout for tool execution. Pass `None` to disable.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a tool, rejecting a name that is already taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), ConfigError> {
        let name = tool.name();
        if self.tools.contains_key(&name) {
            return Err(ConfigError::DuplicateTool(name));
        }
        self.order.push(name.clone());
        self.tools.insert(name, Box::new(tool));
        Ok(())
    }

    /// Register a tool (builder pattern).
    ///
    /// A duplicate name keeps the first registration and is reported later
    /// by [`validate`](Self::validate).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        if let Err(ConfigError::DuplicateTool(name)) = self.register(tool) {
            warn!("Tool '{name}' registered twice; keeping the first definition");
            self.duplicates.push(name);
        }
        self
    }

    /// Conditionally register a tool (builder pattern).
    pub fn with_if(self, condition: bool, tool: impl Tool + 'static) -> Self {
        if condition { self.with(tool) } else { self }
    }

    /// Fail if any name was registered more than once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.duplicates.first() {
            Some(name) => Err(ConfigError::DuplicateTool(name.clone())),
            None => Ok(()),
        }
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition())
            .collect()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Execute one tool call with the set's default timeout.
    pub async fn execute(&self, call: &ToolCallRequest) -> ToolResultContent {
        self.execute_with_timeout(call, self.default_timeout).await
    }

    /// Execute one tool call and turn the outcome into transcript content.
    ///
    /// Never fails: every problem becomes [`ToolResultContent::Error`] with
    /// recovery hints, so the model can correct itself on the next turn.
    pub async fn execute_with_timeout(
        &self,
        call: &ToolCallRequest,
        timeout: Option<Duration>,
    ) -> ToolResultContent {
        match self.try_execute(call, timeout).await {
            Ok(output) => ToolResultContent::Output(output),
            Err(e) => {
                info!("[tool] {} failed: {e}", call.tool_name);
                ToolResultContent::Error(format_tool_failure(&call.tool_name, &e))
            }
        }
    }

    /// Look up, validate and run a tool call, returning the serialized
    /// (possibly truncated) JSON output.
    pub async fn try_execute(
        &self,
        call: &ToolCallRequest,
        timeout: Option<Duration>,
    ) -> Result<String, ToolError> {
        let name = call.tool_name.as_str();
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
            available: self.order.join(", "),
        })?;

        let arguments: serde_json::Value = serde_json::from_str(&call.raw_arguments)
            .map_err(|e| ToolError::InvalidArguments {
                tool: name.to_string(),
                reason: format!("arguments are not valid JSON: {e}"),
            })?;

        if self.validate_args {
            validate_tool_arguments(tool.as_ref(), &arguments)?;
        }

        log_tool_call(name, &call.raw_arguments);
        let start = Instant::now();

        let value = match timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.execute(arguments)).await {
                Ok(r) => r?,
                Err(_) => {
                    info!(
                        "Tool {name} timed out after {:.1}s (limit: {:.0}s)",
                        start.elapsed().as_secs_f64(),
                        limit.as_secs_f64(),
                    );
                    return Err(ToolError::Timeout {
                        tool: name.to_string(),
                        limit,
                    });
                }
            },
            None => tool.execute(arguments).await?,
        };

        let output = serde_json::to_string(&value)
            .map_err(|e| ToolError::execution(format!("failed to serialize result: {e}")))?;

        debug!(
            "Tool {name} completed in {:.0}ms ({} bytes)",
            start.elapsed().as_secs_f64() * 1000.0,
            output.len()
        );
        trace!("Tool {name} result: {output}");

        Ok(truncate_result(output, self.max_result_bytes))
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── FnTool ────────────────────────────────────────────────────────

/// Type-erased async handler for [`FnTool`].
type ErasedToolHandler =
    Box<dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send>> + Send + Sync>;

/// A closure-based tool that deserializes its arguments into a typed struct.
///
/// Use [`FnTool`] for stateless tools. For tools that need shared state
/// (HTTP clients, API keys), define a struct and implement [`Tool`].
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct EchoArgs { text: String }
///
/// let tool = FnTool::new(
///     ToolDef::new("echo", "Echo the input", json_schema_for::<EchoArgs>()),
///     |args: EchoArgs| async move { Ok(json!({ "echo": args.text })) },
/// );
/// ```
pub struct FnTool {
    def: ToolDef,
    handler: ErasedToolHandler,
}

impl FnTool {
    /// Create a new closure-based tool.
    ///
    /// The handler's output is serialized with serde; deserialization
    /// failures are reported as [`ToolError::InvalidArguments`].
    pub fn new<A, R, F, Fut>(def: ToolDef, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    {
        let tool_name = def.name.clone();
        let erased = move |raw: serde_json::Value| -> Pin<
            Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send>,
        > {
            let args: A = match parse_tool_args(&tool_name, raw) {
                Ok(a) => a,
                Err(e) => return Box::pin(async move { Err(e) }),
            };
            let fut = handler(args);
            Box::pin(async move {
                let out = fut.await?;
                serde_json::to_value(out)
                    .map_err(|e| ToolError::execution(format!("failed to serialize result: {e}")))
            })
        };

        Self {
            def,
            handler: Box::new(erased),
        }
    }
}

impl Tool for FnTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, arguments: serde_json::Value) -> ToolFuture<'_> {
        (self.handler)(arguments)
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool").field("name", &self.def.name).finish()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate tool arguments against the tool's declared JSON Schema.
///
/// An invalid schema skips validation rather than blocking the tool.
pub fn validate_tool_arguments(
    tool: &dyn Tool,
    arguments: &serde_json::Value,
) -> Result<(), ToolError> {
    let def = tool.definition();
    let validator = match jsonschema::validator_for(&def.parameters) {
        Ok(v) => v,
        Err(e) => {
            warn!("Schema for tool '{}' does not compile: {e}", def.name);
            return Ok(());
        }
    };

    let errors: Vec<String> = validator
        .iter_errors(arguments)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments {
            tool: def.name,
            reason: errors.join("; "),
        })
    }
}

/// Deserialize already-parsed arguments into a typed struct.
pub fn parse_tool_args<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool_name.to_string(),
        reason: e.to_string(),
    })
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, arguments: &str) {
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Cap serialized output at `max` bytes.
///
/// Oversized output is replaced by a JSON envelope
/// `{"truncated": true, "preview": "...", "total_bytes": N}` whose preview is
/// cut on a char boundary, so the result stays a JSON document.
pub fn truncate_result(s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    serde_json::json!({
        "truncated": true,
        "preview": s.get(..cut).unwrap_or_default(),
        "total_bytes": s.len(),
    })
    .to_string()
}

// ── Tests ──────────────────────────────────────────────────────────

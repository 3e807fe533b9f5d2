//! Configuration for a [`ToolCallingSession`](super::session::ToolCallingSession).
//!
//! ```ignore
//! let config = SessionConfig::default()
//!     .with_instruction("Answer in English.")
//!     .with_model_timeout(Some(Duration::from_secs(30)))
//!     .with_parallel_tools(true);
//! ```

use std::time::Duration;

/// Default limit for a single model request (two minutes).
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Session settings. The turn budget is passed per run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Developer instructions seeded into the transcript, in order.
    pub instructions: Vec<String>,
    /// Limit for one model request. On expiry the run fails. `None` waits
    /// indefinitely.
    pub model_timeout: Option<Duration>,
    /// Limit for one tool call. `None` inherits the tool set's default
    /// (`ToolSet::with_default_timeout`, 60s unless changed); it does not
    /// disable the limit. To run tools without a limit, set the tool set's
    /// default to `None` as well.
    pub tool_timeout: Option<Duration>,
    /// Run the calls of one turn concurrently. Results are still appended in
    /// request order.
    pub parallel_tools: bool,
    /// Refuse to build a session over an empty tool set.
    pub require_tools: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instructions: Vec::new(),
            model_timeout: Some(DEFAULT_MODEL_TIMEOUT),
            tool_timeout: None,
            parallel_tools: false,
            require_tools: false,
        }
    }
}

impl SessionConfig {
    /// Append a developer instruction.
    pub fn with_instruction(mut self, text: impl Into<String>) -> Self {
        self.instructions.push(text.into());
        self
    }

    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_parallel_tools(mut self, enabled: bool) -> Self {
        self.parallel_tools = enabled;
        self
    }

    pub fn with_require_tools(mut self, required: bool) -> Self {
        self.require_tools = required;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(config.instructions.is_empty());
        assert_eq!(config.model_timeout, Some(DEFAULT_MODEL_TIMEOUT));
        assert_eq!(config.tool_timeout, None);
        assert!(!config.parallel_tools);
        assert!(!config.require_tools);
    }

    #[test]
    fn builder_methods() {
        let config = SessionConfig::default()
            .with_instruction("first")
            .with_instruction("second")
            .with_model_timeout(None)
            .with_tool_timeout(Some(Duration::from_secs(5)))
            .with_parallel_tools(true)
            .with_require_tools(true);
        assert_eq!(config.instructions, vec!["first", "second"]);
        assert_eq!(config.model_timeout, None);
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(5)));
        assert!(config.parallel_tools);
        assert!(config.require_tools);
    }
}

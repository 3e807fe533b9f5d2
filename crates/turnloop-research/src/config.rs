//! Assistant configuration with per-preset defaults.
//!
//! [`ResearchConfig`] captures what a preset needs and converts it into
//! `turnloop` types via [`build_session_config`](ResearchConfig::build_session_config)
//! and [`build_tool_set`](ResearchConfig::build_tool_set).

use std::time::Duration;
use turnloop::agent::SessionConfig;
use turnloop::error::ConfigError;
use turnloop::tools::ToolSet;

use crate::prompt::Preset;
use crate::tools::{DEFAULT_MAX_RESULTS, ResearchToolsExt};

/// Configuration for one assistant session.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub preset: Preset,
    /// Model identifier. Default: the preset's model.
    pub model: String,
    /// Sampling temperature. Default: `0.0`, or the provider default for
    /// translation.
    pub temperature: Option<f32>,
    /// Turn budget per input. Default: the preset's budget.
    pub max_turns: u32,
    /// Results requested per search. Default: `5`.
    pub search_max_results: u32,
    /// Limit for a single tool call. Default: `30s`.
    pub tool_timeout: Option<Duration>,
    /// Run a turn's tool calls concurrently. Default: `false`.
    pub parallel_tools: bool,
}

impl ResearchConfig {
    pub fn for_preset(preset: Preset) -> Self {
        Self {
            preset,
            model: preset.default_model().to_string(),
            temperature: preset.default_temperature(),
            max_turns: preset.default_max_turns(),
            search_max_results: DEFAULT_MAX_RESULTS,
            tool_timeout: Some(Duration::from_secs(30)),
            parallel_tools: false,
        }
    }

    /// Session settings: the preset's instruction, the tool timeout and the
    /// dispatch mode. Tool-using presets refuse an empty tool set.
    pub fn build_session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_instruction(self.preset.instruction())
            .with_tool_timeout(self.tool_timeout)
            .with_parallel_tools(self.parallel_tools)
            .with_require_tools(self.preset.uses_arithmetic() || self.preset.uses_search())
    }

    /// The preset's tools. The researcher needs a Tavily API key.
    pub fn build_tool_set(&self, tavily_key: Option<&str>) -> Result<ToolSet, ConfigError> {
        let mut tools = ToolSet::new();
        if self.preset.uses_arithmetic() {
            tools = tools.with_arithmetic_tools();
        }
        if self.preset.uses_search() {
            let key = tavily_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingApiKey("TAVILY_API_KEY".into()))?;
            tools = tools.with_tavily_search(key, self.search_max_results)?;
        }
        Ok(tools)
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self::for_preset(Preset::Researcher)
    }
}

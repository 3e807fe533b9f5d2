//! Research tools and the [`ResearchToolsExt`] trait for registering them
//! on a [`ToolSet`](turnloop::tools::ToolSet).

pub mod search;

pub use search::{DEFAULT_MAX_RESULTS, SearchHit, SearchResults, TavilySearch};

use turnloop::error::ConfigError;
use turnloop::tools::ToolSet;

pub const TAVILY_SEARCH: &str = "tavily_search";

/// Extension trait for registering the web search tool.
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_arithmetic_tools()
///     .with_tavily_search(api_key, 5)?;
/// ```
pub trait ResearchToolsExt: Sized {
    fn with_tavily_search(
        self,
        api_key: impl Into<String>,
        max_results: u32,
    ) -> Result<Self, ConfigError>;
}

impl ResearchToolsExt for ToolSet {
    fn with_tavily_search(
        self,
        api_key: impl Into<String>,
        max_results: u32,
    ) -> Result<Self, ConfigError> {
        let search = TavilySearch::new(api_key)?.with_max_results(max_results);
        Ok(self.with(search))
    }
}

//! `tavily_search`: web search through the Tavily API.
//!
//! Results are trimmed to `title`, `url` and `content` so the model's answer
//! can cite its sources without wading through scores and raw HTML.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use turnloop::error::{ConfigError, ToolError};
use turnloop::tools::{Tool, ToolFuture, parse_tool_args};
use turnloop::{ToolDef, json_schema_for};

use super::TAVILY_SEARCH;

pub const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Results per query unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Arguments for `tavily_search`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TavilySearchArgs {
    /// Search query, in Japanese or English.
    #[schemars(length(min = 1))]
    pub query: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    include_answer: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// A search hit as returned to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Payload of a successful search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}

/// Parse a Tavily response body into the trimmed result list.
pub fn parse_search_response(body: &str) -> Result<SearchResults, ToolError> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ToolError::execution(format!("unexpected Tavily response: {e}")))?;
    Ok(SearchResults {
        results: parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect(),
    })
}

/// Web search tool backed by Tavily.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_results: u32,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("turnloop-research/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: TAVILY_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ToolError> {
        let request = SearchRequest {
            query,
            max_results: self.max_results,
            include_answer: false,
            include_images: false,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Tavily search failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::execution(format!("failed to read Tavily response: {e}")))?;
        if !status.is_success() {
            return Err(ToolError::execution(format!(
                "Tavily search failed: HTTP {status}: {body}"
            )));
        }

        let results = parse_search_response(&body)?;
        debug!("Tavily returned {} result(s) for {query:?}", results.results.len());
        Ok(results)
    }
}

impl Tool for TavilySearch {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            TAVILY_SEARCH,
            "Search the web for up-to-date facts such as figures, dates or \
             measurements. Returns titles, URLs and content snippets.",
            json_schema_for::<TavilySearchArgs>(),
        )
        .strict()
    }

    fn execute(&self, arguments: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: TavilySearchArgs = parse_tool_args(TAVILY_SEARCH, arguments)?;
            let results = self.search(&args.query).await?;
            serde_json::to_value(results)
                .map_err(|e| ToolError::execution(format!("failed to serialize results: {e}")))
        })
    }
}

//! Translation, calculator and web research assistants built on `turnloop`.
//!
//! # Library usage
//!
//! ```ignore
//! use turnloop_research::{Preset, ResearchConfig};
//!
//! let config = ResearchConfig::for_preset(Preset::Researcher);
//! let tools = config.build_tool_set(std::env::var("TAVILY_API_KEY").ok().as_deref())?;
//! let session_config = config.build_session_config();
//! ```
//!
//! # Binary
//!
//! ```sh
//! # One-shot research question
//! turnloop-research --preset researcher \
//!   --prompt "What is the sum of the heights of Japan's 2nd and 3rd highest mountains?"
//!
//! # Interactive translation, three lines, history kept between them
//! turnloop-research --preset translator --rounds 3
//! ```

pub mod config;
pub mod prompt;
pub mod tools;

pub use config::ResearchConfig;
pub use prompt::Preset;
pub use tools::{ResearchToolsExt, TavilySearch};

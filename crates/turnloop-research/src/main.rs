//! Translation, calculator and research assistants on the command line.
//!
//! Reads `OPENAI_API_KEY` (and optional `OPENAI_BASE_URL`); the researcher
//! preset also needs `TAVILY_API_KEY`.
//!
//! # Examples
//!
//! ```sh
//! # One-shot research question
//! turnloop-research --preset researcher \
//!   --prompt "Multiply the heights of Japan's and the world's 5th highest mountains."
//!
//! # Calculator
//! turnloop-research --preset calculator --prompt "(3 + 4) * 12 / 7"
//!
//! # Interactive translation: each stdin line is a new run on the same session
//! turnloop-research --preset translator --rounds 3
//! ```
//!
//! Exit status: 0 when answered, 2 when the turn budget ran out, 1 on any
//! failure.

use clap::Parser;
use std::io::{self, Write};
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use turnloop::prelude::*;
use turnloop_research::{Preset, ResearchConfig};

#[derive(Parser)]
#[command(name = "turnloop-research", version)]
struct Cli {
    /// Assistant to run.
    #[arg(long, value_enum, default_value_t = Preset::Researcher)]
    preset: Preset,

    /// Single input (one-shot mode). Without this, reads lines from stdin.
    #[arg(long)]
    prompt: Option<String>,

    /// Maximum number of non-empty input lines in interactive mode.
    #[arg(long)]
    rounds: Option<u32>,

    /// Model to use. Default depends on the preset.
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature. Default depends on the preset.
    #[arg(long)]
    temperature: Option<f32>,

    /// Turn budget per input. Default depends on the preset.
    #[arg(long)]
    max_turns: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "turnloop=info,turnloop_research=info",
        _ => "turnloop=debug,turnloop_research=debug",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn build_config(cli: &Cli) -> ResearchConfig {
    let mut config = ResearchConfig::for_preset(cli.preset);
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if cli.temperature.is_some() {
        config.temperature = cli.temperature;
    }
    if let Some(max_turns) = cli.max_turns {
        config.max_turns = max_turns;
    }
    config
}

/// Echoes tool traffic to stderr.
struct ToolTrace;

impl EventHandler for ToolTrace {
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        match event {
            SessionEvent::ToolExecuting {
                call_id,
                name,
                arguments,
            } => {
                eprintln!("[tool] {name} call_id={call_id}");
                eprintln!("[tool] arguments: {arguments}");
            }
            SessionEvent::ToolResult { name, content, .. } => {
                eprintln!("[tool] {name} response: {}", content.to_wire());
            }
            _ => {}
        }
        None
    }
}

/// Print one run's outcome. Returns the exit code it maps to.
fn report(answer: FinalAnswer, max_turns: u32) -> i32 {
    match answer {
        FinalAnswer::Answered { text } => {
            println!("{text}");
            0
        }
        FinalAnswer::BudgetExhausted => {
            eprintln!("No answer within {max_turns} turn(s).");
            2
        }
        FinalAnswer::Failed { reason } => {
            eprintln!("Error: {reason}");
            1
        }
    }
}

async fn run(cli: &Cli) -> Result<i32, String> {
    let config = build_config(cli);
    let tavily_key = std::env::var("TAVILY_API_KEY").ok();
    let tools = config
        .build_tool_set(tavily_key.as_deref())
        .map_err(|e| e.to_string())?;

    let client = ResponsesClient::from_env(&config.model)
        .map_err(|e| e.to_string())?
        .with_temperature(config.temperature);
    let client = RetryingClient::new(client, RetryConfig::with_retries(2));

    let handler = CompositeEventHandler::new()
        .with(ToolTrace)
        .with(LoggingHandler);
    let mut session = ToolCallingSession::new(&client, &tools, config.build_session_config())
        .map_err(|e| e.to_string())?
        .with_event_handler(&handler);

    // ── One-shot ────────────────────────────────────────────────
    if let Some(prompt) = &cli.prompt {
        let answer = session
            .run(prompt, config.max_turns)
            .await
            .map_err(|e| e.to_string())?;
        return Ok(report(answer, config.max_turns));
    }

    // ── Interactive ─────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rounds = 0;
    let mut code = 0;
    while cli.rounds.is_none_or(|max| rounds < max) {
        eprint!("{}> ", cli.preset.input_label());
        io::stderr().flush().ok();

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("failed to read stdin: {e}"))?
        else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        rounds += 1;

        let answer = session
            .run(&line, config.max_turns)
            .await
            .map_err(|e| e.to_string())?;
        code = report(answer, config.max_turns);
        if code == 1 {
            break;
        }
    }
    Ok(code)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

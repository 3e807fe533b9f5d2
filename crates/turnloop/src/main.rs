//! Run one tool-calling conversation against the OpenAI Responses API and
//! print the answer.
//!
//! Reads the API key from `OPENAI_API_KEY` and an optional endpoint override
//! from `OPENAI_BASE_URL`.
//!
//! # Examples
//!
//! ```sh
//! # Arithmetic with tools
//! turnloop --arithmetic --max-turns 10 \
//!   --developer "Use the tools for every calculation." \
//!   --user "What is 12.5 * 4 - 7?"
//!
//! # Pipe content from stdin, no tools
//! cat notes.md | turnloop --developer "Summarize this." --stdin
//!
//! # Inspect the full transcript afterwards
//! turnloop --arithmetic --user "div 10 by 0" --dump-transcript
//! ```
//!
//! Exit status: 0 when answered, 2 when the turn budget ran out, 1 on any
//! failure.

use clap::Parser;
use std::io::{self, Read};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use turnloop::prelude::*;

/// Run a tool-calling conversation and print the model's answer.
///
/// Reads the API key from the OPENAI_API_KEY environment variable.
#[derive(Parser)]
#[command(name = "turnloop", version)]
struct Cli {
    // ── Message content ────────────────────────────────────────
    /// Developer instruction seeded before the user message (repeatable)
    #[arg(long)]
    developer: Vec<String>,

    /// User message to send
    #[arg(long)]
    user: Option<String>,

    /// Read user content from stdin
    #[arg(long)]
    stdin: bool,

    // ── Model ──────────────────────────────────────────────────
    /// Model to use
    #[arg(long, default_value = turnloop::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Retries for transient API errors (429, 5xx, network)
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Per-request model timeout in seconds
    #[arg(long, default_value_t = 120)]
    model_timeout: u64,

    // ── Tool use ───────────────────────────────────────────────
    /// Register the add/sub/mul/div tools
    #[arg(long)]
    arithmetic: bool,

    /// Turn budget for the run
    #[arg(long, default_value_t = 10)]
    max_turns: u32,

    /// Execute the tool calls of a turn concurrently
    #[arg(long)]
    parallel_tools: bool,

    // ── Output ─────────────────────────────────────────────────
    /// Print the transcript as JSON to stderr after the run
    #[arg(long)]
    dump_transcript: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Helpers ────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "turnloop=info",
        _ => "turnloop=debug",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn build_user_content(cli: &Cli) -> Result<String, String> {
    let stdin_text = if cli.stdin {
        Some(read_stdin_content()?)
    } else {
        None
    };

    match (&cli.user, stdin_text) {
        (Some(msg), Some(piped)) => Ok(format!("{msg}\n\n{piped}")),
        (Some(msg), None) => Ok(msg.clone()),
        (None, Some(piped)) => Ok(piped),
        (None, None) => Err("provide --user, --stdin, or both".to_string()),
    }
}

fn build_session_config(cli: &Cli) -> SessionConfig {
    cli.developer
        .iter()
        .fold(SessionConfig::default(), |config, text| {
            config.with_instruction(text)
        })
        .with_model_timeout(Some(Duration::from_secs(cli.model_timeout)))
        .with_parallel_tools(cli.parallel_tools)
}

/// Prints turn and tool progress to stderr.
struct CliEventHandler;

impl EventHandler for CliEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) -> Option<EventResponse> {
        match event {
            SessionEvent::TurnStart {
                turn, max_turns, ..
            } => {
                eprintln!("  [turn {turn}/{max_turns}]");
            }
            SessionEvent::ToolExecuting {
                name, arguments, ..
            } => {
                eprintln!("  [tool_call] {name}({arguments})");
            }
            SessionEvent::ToolResult {
                name,
                content: ToolResultContent::Error(e),
                ..
            } => {
                eprintln!("  [tool_error] {name}: {e}");
            }
            _ => {}
        }
        None
    }
}

/// Run the conversation. Returns the answer, or the exit code and message.
async fn run(cli: &Cli) -> Result<String, (i32, String)> {
    let fail = |e: String| (1, e);

    let user_content = build_user_content(cli).map_err(fail)?;
    let client = ResponsesClient::from_env(&cli.model)
        .map_err(|e| fail(e.to_string()))?
        .with_temperature(Some(cli.temperature));
    let client = RetryingClient::new(client, RetryConfig::with_retries(cli.retries));

    let tools = if cli.arithmetic {
        ToolSet::new().with_arithmetic_tools()
    } else {
        ToolSet::new()
    };

    let handler = CompositeEventHandler::new()
        .with(CliEventHandler)
        .with(LoggingHandler);
    let mut session = ToolCallingSession::new(&client, &tools, build_session_config(cli))
        .map_err(|e| fail(e.to_string()))?
        .with_event_handler(&handler);

    let answer = session
        .run(&user_content, cli.max_turns)
        .await
        .map_err(|e| fail(e.to_string()))?;

    if cli.dump_transcript {
        match serde_json::to_string_pretty(session.transcript()) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("  Warning: failed to serialize transcript: {e}"),
        }
    }
    if let Some(stats) = session.last_run() {
        eprintln!(
            "  [{}] {} turn(s), {} tool call(s), {} input / {} output tokens",
            stats.run_id,
            stats.turns_used,
            stats.tool_calls,
            stats.input_tokens,
            stats.output_tokens
        );
    }

    match answer {
        FinalAnswer::Answered { text } => Ok(text),
        FinalAnswer::BudgetExhausted => Err((
            2,
            format!("no answer within {} turn(s)", cli.max_turns),
        )),
        FinalAnswer::Failed { reason } => Err((1, reason)),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(answer) => println!("{answer}"),
        Err((code, e)) => {
            eprintln!("Error: {e}");
            process::exit(code);
        }
    }
}

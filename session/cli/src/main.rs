//! Insight CLI - Terminal client for IllnessInsight
//!
//! Chat with the health assistant over its WebSocket endpoint, or use the
//! HTTP API for a single question or a one-shot classification.
//!
//! # Usage
//!
//! ```bash
//! # Chat with the assistant
//! insight chat
//!
//! # Chat against another server
//! insight chat --url ws://insight.lan:8000/ws/chat
//!
//! # One stateless question over HTTP
//! insight ask "How much water should I drink a day?"
//!
//! # One prediction
//! insight predict diabetes -f Pregnancies=2 -f Glucose=138 -f BMI=33.6 -f Age=47
//!
//! # Backend health and effective configuration
//! insight health
//! insight config
//!
//! # Verbose logging
//! RUST_LOG=debug insight chat
//! ```
//!
//! # Environment Variables
//!
//! - `INSIGHT_API_URL`: prediction API base URL
//! - `INSIGHT_CHAT_URL`: chat WebSocket endpoint
//! - `INSIGHT_CONNECT_TIMEOUT`: chat handshake timeout in milliseconds
//! - `INSIGHT_REQUEST_TIMEOUT`: prediction request timeout in milliseconds
//! - `RUST_LOG`: log filter (logs go to stderr)
//!
//! # Files
//!
//! - Config: `$XDG_CONFIG_HOME/illness-insight/client.toml`

mod chat;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use insight_core::{
    load_config, ClientConfig, ConfigOverrides, FeatureRecord, PredictionClient, PredictionKind,
};

/// Insight - terminal client for the IllnessInsight assistant
#[derive(Parser, Debug)]
#[command(name = "insight")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prediction API base URL
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Debug logging for the insight crates
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the health assistant
    Chat {
        /// Chat WebSocket endpoint
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },

    /// Ask one question without opening a chat session
    Ask {
        /// Question text; several words are joined with spaces
        #[arg(required = true, num_args = 1.., value_name = "TEXT")]
        words: Vec<String>,
    },

    /// Run one prediction
    Predict {
        /// heart-disease, diabetes or cancer
        kind: PredictionKind,

        /// One input feature; repeat for each field
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, f64)>,
    },

    /// Check whether the backend is up
    Health,

    /// Show the effective configuration
    Config,
}

/// Parse one `name=value` feature
fn parse_field(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in {raw:?}"));
    }

    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("{name}: {value:?} is not a number"))?;
    if !value.is_finite() {
        return Err(format!("{name}: value must be finite"));
    }

    Ok((name.to_string(), value))
}

/// Collect parsed fields into one record, rejecting repeats
fn feature_record(fields: Vec<(String, f64)>) -> Result<FeatureRecord> {
    if fields.is_empty() {
        bail!("no fields given; pass at least one --field NAME=VALUE");
    }

    let mut record = FeatureRecord::new();
    for (name, value) in fields {
        if record.insert(name.clone(), value).is_some() {
            bail!("field {name} given more than once");
        }
    }
    Ok(record)
}

/// Initialize logging; stdout is reserved for the conversation
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("insight_cli={level},insight_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_ask(config: &ClientConfig, words: &[String]) -> Result<ExitCode> {
    let question = words.join(" ");
    let question = question.trim();
    if question.is_empty() {
        bail!("nothing to ask");
    }

    let client = PredictionClient::new(&config.api)?;
    let reply = client
        .chat(question)
        .await
        .with_context(|| format!("chat request to {} failed", config.api.url))?;

    println!("{}", reply.response);
    Ok(ExitCode::SUCCESS)
}

async fn run_predict(
    config: &ClientConfig,
    kind: PredictionKind,
    fields: Vec<(String, f64)>,
) -> Result<ExitCode> {
    let features = feature_record(fields)?;
    let client = PredictionClient::new(&config.api)?;

    let response = client
        .predict(kind, &features)
        .await
        .with_context(|| format!("{kind} prediction failed"))?;

    let verdict = if response.is_positive() {
        "indicated"
    } else {
        "not indicated"
    };
    println!("{kind}: {verdict}");
    println!("probability: {:.1}%", response.probability_percent());
    println!("{}", response.message);

    Ok(ExitCode::SUCCESS)
}

async fn run_health(config: &ClientConfig) -> Result<ExitCode> {
    let client = PredictionClient::new(&config.api)?;
    let status = client
        .health()
        .await
        .with_context(|| format!("backend at {} is unreachable", config.api.url))?;

    println!("{}: {}", config.api.url, status.status);
    Ok(if status.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(config: &ClientConfig) {
    match &config.file {
        Some(path) => println!("config file: {}", path.display()),
        None => println!("config file: (none)"),
    }
    println!("api.url = {} ({})", config.api.url, config.sources.api_url);
    println!(
        "api.request_timeout_ms = {}",
        config.api.request_timeout.as_millis()
    );
    println!("chat.url = {} ({})", config.chat.url, config.sources.chat_url);
    println!(
        "chat.connect_timeout_ms = {}",
        config.chat.connect_timeout.as_millis()
    );
    println!("chat.greeting = {:?}", config.chat.greeting);
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging first
    init_logging(cli.verbose);

    let overrides = ConfigOverrides {
        config_path: cli.config.clone(),
        api_url: cli.api_url.clone(),
        chat_url: match &cli.command {
            Command::Chat { url } => url.clone(),
            _ => None,
        },
    };
    let config = load_config(&overrides).context("Failed to load configuration")?;
    debug!(api = %config.api.url, chat = %config.chat.url, "Configuration loaded");

    match cli.command {
        Command::Chat { .. } => chat::run(&config).await,
        Command::Ask { words } => run_ask(&config, &words).await,
        Command::Predict { kind, fields } => run_predict(&config, kind, fields).await,
        Command::Health => run_health(&config).await,
        Command::Config => {
            show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

//! RAG Pipeline CLI
//!
//! Runs the pipeline the way a chat host would: startup, answer, shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use rag_pipeline::services::knowledge::Backends;
use rag_pipeline::utils::tracing_setup::init_tracing;
use rag_pipeline::{AppState, ConfigService, QueryResult, SettingsUpdate};

#[derive(Parser)]
#[command(name = "rag-pipeline")]
#[command(version)]
#[command(about = "Answer questions over a small indexed corpus", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ~/.rag-pipeline/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and stream the answer
    Ask {
        /// The question; empty uses the configured test query
        #[arg(default_value = "")]
        question: String,
    },

    /// Start an interactive session
    Chat,

    /// Build the index and check the model and embedding backends
    Health,

    /// Write the default configuration file if it does not exist
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let config = match &cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Commands::InitConfig => {
            println!("{}", config.path().display());
            Ok(())
        }
        Commands::Ask { question } => {
            let state = AppState::new(config, Backends::default()).await?;
            if let Err(e) = state.startup().await {
                tracing::error!(error = %e, "startup failed");
            }
            let result = state
                .answer(&question, "rag-pipeline", &[], &serde_json::Value::Null)
                .await;
            let ok = result.is_success();
            print_result(result).await?;
            state.shutdown().await;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Health => {
            let state = AppState::new(config, Backends::default()).await?;
            if let Err(e) = state.startup().await {
                tracing::error!(error = %e, "startup failed");
            }
            let report = state.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            state.shutdown().await;
            if report.status != "healthy" {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Chat => {
            let state = AppState::new(config, Backends::default()).await?;
            if let Err(e) = state.startup().await {
                tracing::error!(error = %e, "startup failed");
            }
            run_chat(&state).await?;
            state.shutdown().await;
            Ok(())
        }
    }
}

/// Read questions from stdin until EOF or `:quit`.
///
/// `:seed <text>` replaces the seed text, `:state` prints the pipeline state.
async fn run_chat(state: &AppState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Type a question, :seed <text>, :state or :quit");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == ":quit" {
            break;
        } else if line == ":state" {
            println!("{}", state.pipeline_state().await);
        } else if let Some(seed) = line.strip_prefix(":seed ") {
            let update = SettingsUpdate {
                seed_text: Some(seed.trim().to_string()),
                ..Default::default()
            };
            match state.update_config(update).await {
                Ok(new_state) => println!("seed text updated ({})", new_state),
                Err(e) => println!("update failed: {}", e),
            }
        } else {
            print_result(
                state
                    .answer(line, "rag-pipeline", &[], &serde_json::Value::Null)
                    .await,
            )
            .await?;
        }
    }
    Ok(())
}

async fn print_result(result: QueryResult) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut tokens = result.into_stream();
    while let Some(token) = tokens.next().await {
        stdout.write_all(token.as_bytes()).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

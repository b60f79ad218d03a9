use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shellmate::EngineConfig;

mod cli;

#[derive(Parser)]
#[command(name = "shellmate")]
#[command(about = "Interactive shell-session engine - auto-answers prompts or suspends for a human")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file with engine tuning knobs
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command in an interactive session with prompt auto-answering
    Run {
        /// The command to execute
        command: String,

        /// Timeout in seconds (0 or negative = no deadline)
        #[arg(short, long)]
        timeout: Option<i64>,

        /// Queued answer, consumed in order; repeatable
        #[arg(long = "respond", value_name = "ANSWER", conflicts_with = "respond_map")]
        responses: Vec<String>,

        /// Keyed answer as KEY=VALUE, matched against the prompt; repeatable
        #[arg(long = "respond-map", value_name = "KEY=VALUE")]
        respond_map: Vec<String>,

        /// Print the result as JSON instead of prompting on stdin
        #[arg(long)]
        json: bool,
    },

    /// Run a command non-interactively, buffering all output
    Exec {
        /// The command to execute
        command: String,

        /// Timeout in seconds (0 or negative = no deadline)
        #[arg(short, long)]
        timeout: Option<i64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = match cli.config {
        Some(path) => EngineConfig::from_file(&path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Run {
            command,
            timeout,
            responses,
            respond_map,
            json,
        } => {
            cli::run::run_command(config, command, timeout, responses, respond_map, json)?;
        }
        Commands::Exec {
            command,
            timeout,
            json,
        } => {
            cli::exec::exec_command(config, command, timeout, json)?;
        }
    }

    Ok(())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # taskfleet CLI
//!
//! One binary for both sides of the fleet and for operators.
//!
//! ## Commands
//!
//! - `taskfleet coordinator [--in-memory]` - Task creation, fan-out and completion aggregation
//! - `taskfleet agent` - Recurring command execution and result reporting
//! - `taskfleet task create|output` - Talk to a running coordinator
//! - `taskfleet config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use taskfleet_cli::commands::{self, AgentArgs, ConfigCommand, CoordinatorArgs, TaskCommand};
use taskfleet_core::domain::node_config::NodeConfigManifest;
use taskfleet_sdk::TaskfleetClient;

/// taskfleet - distributed recurring command scheduler
#[derive(Parser)]
#[command(name = "taskfleet")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "TASKFLEET_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TASKFLEET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true, env = "TASKFLEET_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator service
    #[command(name = "coordinator")]
    Coordinator(CoordinatorArgs),

    /// Run an execution agent
    #[command(name = "agent")]
    Agent(AgentArgs),

    /// Task operations against a running coordinator
    #[command(name = "task")]
    Task {
        /// Coordinator base URL (default: spec.agent.coordinator_address)
        #[arg(long, global = true, value_name = "URL")]
        coordinator: Option<String>,

        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    if let Some(port) = cli.metrics_port {
        init_metrics(port)?;
    }

    match cli.command {
        Some(Commands::Coordinator(args)) => commands::coordinator::run(args, cli.config).await,
        Some(Commands::Agent(args)) => commands::agent::run(args, cli.config).await,
        Some(Commands::Task {
            coordinator,
            command,
        }) => {
            let base_url = match coordinator {
                Some(url) => url,
                None => {
                    NodeConfigManifest::load_or_default(cli.config)
                        .context("Failed to load configuration")?
                        .spec
                        .agent
                        .coordinator_address
                }
            };
            commands::task::handle_command(command, &TaskfleetClient::new(base_url)).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

fn init_metrics(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

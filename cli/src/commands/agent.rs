// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `taskfleet agent`: runs scheduled commands and reports results.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use taskfleet_agent::application::{AgentScheduler, CompletionReporter};
use taskfleet_agent::infrastructure::{CoordinatorReportSink, ProcessExecutor};
use taskfleet_agent::presentation::api::{app, AppState};
use taskfleet_core::domain::node_config::NodeConfigManifest;
use taskfleet_core::domain::report::AgentId;

use crate::server::{serve, shutdown_signal};

#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// HTTP API port (overrides spec.agent.port)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Coordinator base URL (overrides spec.agent.coordinator_address)
    #[arg(long, value_name = "URL")]
    pub coordinator: Option<String>,
}

pub async fn run(args: AgentArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config =
        NodeConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.spec.agent.port = port;
    }
    if let Some(coordinator) = args.coordinator {
        config.spec.agent.coordinator_address = coordinator;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let agent = &config.spec.agent;

    // Fresh identity per process: a restarted agent is a new quorum member.
    let agent_id = AgentId::new();
    info!(
        agent_id = %agent_id,
        coordinator = %agent.coordinator_address,
        "Agent starting"
    );

    let shutdown_token = CancellationToken::new();

    let sink = CoordinatorReportSink::new(&agent.coordinator_address, agent.report_timeout())
        .context("Failed to build coordinator client")?;
    let (queue, reporter) = CompletionReporter::new(
        Arc::new(sink),
        agent.report_queue_capacity,
        shutdown_token.clone(),
    );
    let reporter_handle = reporter.start();

    let scheduler = Arc::new(AgentScheduler::new(
        agent_id,
        Arc::new(ProcessExecutor::new()),
        queue,
        shutdown_token.clone(),
    ));

    let served = serve(
        "Agent",
        agent.port,
        app(AppState::new(scheduler.clone())),
        shutdown_signal(),
    )
    .await;

    scheduler.shutdown().await;
    if let Err(e) = reporter_handle.await {
        warn!("Completion reporter ended abnormally: {}", e);
    }

    served
}

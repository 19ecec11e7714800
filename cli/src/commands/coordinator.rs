// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `taskfleet coordinator`: task creation, fan-out and completion aggregation.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use taskfleet_core::application::repository_factory::{
    create_coordination_store, create_task_output_repository,
};
use taskfleet_core::application::{AggregatorSettings, CompletionAggregator, FanOut, TaskService};
use taskfleet_core::domain::node_config::NodeConfigManifest;
use taskfleet_core::domain::repository::{PostgresConfig, StorageBackend};
use taskfleet_core::infrastructure::HttpScheduleDispatcher;
use taskfleet_core::presentation::api::{app, AppState};

use crate::server::{serve, shutdown_signal};

#[derive(Args, Debug, Clone)]
pub struct CoordinatorArgs {
    /// Keep outputs, quorum sets and locks in process memory instead of PostgreSQL and Redis
    #[arg(long)]
    pub in_memory: bool,

    /// HTTP API port (overrides spec.coordinator.port)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

pub async fn run(args: CoordinatorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config =
        NodeConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.spec.coordinator.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let coordinator = &config.spec.coordinator;

    let backend = if args.in_memory {
        StorageBackend::InMemory
    } else {
        StorageBackend::PostgreSQL(PostgresConfig {
            connection_string: coordinator.database_dsn.clone(),
        })
    };
    let outputs = create_task_output_repository(&backend).await?;

    let redis_address = (!args.in_memory).then_some(coordinator.redis_address.as_str());
    let coordination = create_coordination_store(redis_address).await?;

    let dispatcher = HttpScheduleDispatcher::new(coordinator.agent_request_timeout())
        .context("Failed to build agent HTTP client")?;
    let fan_out = FanOut::new(
        Arc::new(dispatcher),
        coordination.quorum.clone(),
        coordinator.available_agents.clone(),
        coordinator.agent_request_timeout(),
    );

    let task_service = Arc::new(TaskService::new(Arc::new(fan_out), outputs.clone()));
    let aggregator = Arc::new(CompletionAggregator::new(
        coordination.quorum,
        coordination.lock,
        outputs,
        AggregatorSettings::from(coordinator),
    ));

    info!(
        agents = coordinator.available_agents.len(),
        in_memory = args.in_memory,
        "Coordinator initialized"
    );

    serve(
        "Coordinator",
        coordinator.port,
        app(AppState::new(task_service, aggregator)),
        shutdown_signal(),
    )
    .await
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Full fleet on loopback: one coordinator backed by in-memory stores and two
//! agents running real processes. A task created through the SDK must
//! eventually yield one finalized record holding both agents' output.

#![cfg(unix)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use taskfleet_agent::application::{AgentScheduler, CompletionReporter};
use taskfleet_agent::infrastructure::{CoordinatorReportSink, ProcessExecutor};
use taskfleet_agent::presentation::api as agent_api;
use taskfleet_core::application::{AggregatorSettings, CompletionAggregator, FanOut, RetryPolicy, TaskService};
use taskfleet_core::domain::report::AgentId;
use taskfleet_core::infrastructure::coordination::InMemoryCoordinationStore;
use taskfleet_core::infrastructure::repositories::InMemoryTaskOutputRepository;
use taskfleet_core::infrastructure::HttpScheduleDispatcher;
use taskfleet_core::presentation::api as coordinator_api;
use taskfleet_sdk::TaskfleetClient;

async fn serve(router: Router, token: CancellationToken) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .unwrap();
    });
    addr
}

async fn start_agent(agent_id: &str, coordinator: &str, token: &CancellationToken) -> String {
    let sink = CoordinatorReportSink::new(coordinator, Duration::from_secs(5)).unwrap();
    let (queue, reporter) = CompletionReporter::new(Arc::new(sink), 1024, token.clone());
    reporter.start();

    let scheduler = Arc::new(AgentScheduler::new(
        AgentId::from(agent_id),
        Arc::new(ProcessExecutor::new()),
        queue,
        token.clone(),
    ));
    let addr = serve(agent_api::app(agent_api::AppState::new(scheduler)), token.clone()).await;
    format!("http://{addr}")
}

async fn start_coordinator(
    listener: TcpListener,
    agents: Vec<String>,
    token: CancellationToken,
) {
    let store = Arc::new(InMemoryCoordinationStore::new());
    let outputs = Arc::new(InMemoryTaskOutputRepository::new());
    let dispatcher = Arc::new(HttpScheduleDispatcher::new(Duration::from_secs(5)).unwrap());

    let fan_out = FanOut::new(dispatcher, store.clone(), agents.clone(), Duration::from_secs(5));
    let task_service = Arc::new(TaskService::new(Arc::new(fan_out), outputs.clone()));
    let aggregator = Arc::new(CompletionAggregator::new(
        store.clone(),
        store,
        outputs,
        AggregatorSettings {
            configured_agents: agents.len(),
            lock_policy: RetryPolicy::default(),
            report_timeout: Duration::from_secs(10),
        },
    ));

    let router = coordinator_api::app(coordinator_api::AppState::new(task_service, aggregator));
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .unwrap();
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_echo_task_finalizes_with_both_agents() {
    let token = CancellationToken::new();

    // Bind first so agents know where to report before the coordinator is wired.
    let coordinator_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let coordinator_url = format!("http://{}", coordinator_listener.local_addr().unwrap());

    let a1 = start_agent("a1", &coordinator_url, &token).await;
    let a2 = start_agent("a2", &coordinator_url, &token).await;
    start_coordinator(coordinator_listener, vec![a1, a2], token.clone()).await;

    let client = TaskfleetClient::with_timeout(&coordinator_url, Duration::from_secs(5)).unwrap();
    let created = client.create_task("echo hi", "every 1 seconds").await.unwrap();

    let mut latest = None;
    for _ in 0..100 {
        if let Some(output) = client.latest_output(&created.task_id).await.unwrap() {
            latest = Some(output);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let latest = latest.expect("no finalized cycle within 10 seconds");

    let entries: Vec<(String, String)> = latest
        .outputs
        .iter()
        .map(|o| (o.agent_id.to_string(), o.stdout.clone()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("a1".to_string(), "hi\n".to_string()),
            ("a2".to_string(), "hi\n".to_string()),
        ]
    );

    token.cancel();
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Router-level tests for the coordinator HTTP API, driven with
//! `tower::ServiceExt::oneshot` against in-memory stores.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use taskfleet_core::application::{AggregatorSettings, CompletionAggregator, FanOut, RetryPolicy, TaskService};
use taskfleet_core::domain::dispatch::{DispatchError, ScheduleDispatcher};
use taskfleet_core::domain::task::ScheduleInstruction;
use taskfleet_core::infrastructure::coordination::InMemoryCoordinationStore;
use taskfleet_core::infrastructure::repositories::InMemoryTaskOutputRepository;
use taskfleet_core::presentation::api::{app, AppState, LatestOutputResponse};

#[derive(Default)]
struct RecordingDispatcher {
    instructions: Mutex<Vec<(String, ScheduleInstruction)>>,
}

#[async_trait]
impl ScheduleDispatcher for RecordingDispatcher {
    async fn dispatch(&self, agent: &str, instruction: &ScheduleInstruction) -> Result<(), DispatchError> {
        self.instructions
            .lock()
            .push((agent.to_string(), instruction.clone()));
        Ok(())
    }
}

struct Harness {
    router: Router,
    dispatcher: Arc<RecordingDispatcher>,
}

fn harness(agents: &[&str]) -> Harness {
    let store = Arc::new(InMemoryCoordinationStore::new());
    let outputs = Arc::new(InMemoryTaskOutputRepository::new());
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let roster: Vec<String> = agents.iter().map(|a| a.to_string()).collect();
    let fan_out = FanOut::new(dispatcher.clone(), store.clone(), roster.clone(), Duration::from_secs(1));
    let task_service = Arc::new(TaskService::new(Arc::new(fan_out), outputs.clone()));
    let aggregator = Arc::new(CompletionAggregator::new(
        store.clone(),
        store,
        outputs,
        AggregatorSettings {
            configured_agents: roster.len(),
            lock_policy: RetryPolicy::default(),
            report_timeout: Duration::from_secs(10),
        },
    ));

    Harness {
        router: app(AppState::new(task_service, aggregator)),
        dispatcher,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn wait_for_fan_out(dispatcher: &RecordingDispatcher, expected: usize) {
    for _ in 0..100 {
        if dispatcher.instructions.lock().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("fan-out did not reach {expected} agents");
}

#[tokio::test]
async fn test_health() {
    let h = harness(&["http://a1"]);
    let (status, body) = send(&h.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_create_task_returns_201_and_fans_out() {
    let h = harness(&["http://a1", "http://a2"]);

    let (status, body) = send(
        &h.router,
        "POST",
        "/api/v1/tasks/create",
        Some(json!({"command": "echo hi", "frequency": "every 1 seconds"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["task_id"].as_str().unwrap().to_string();
    assert!(!task_id.is_empty());

    wait_for_fan_out(&h.dispatcher, 2).await;
    let instructions = h.dispatcher.instructions.lock().clone();
    let agents: Vec<&str> = instructions.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(agents, vec!["http://a1", "http://a2"]);
    assert!(instructions.iter().all(|(_, i)| i.task_id.as_str() == task_id));
}

#[tokio::test]
async fn test_create_task_rejects_bad_input() {
    let h = harness(&["http://a1"]);

    let (status, body) = send(
        &h.router,
        "POST",
        "/api/v1/tasks/create",
        Some(json!({"command": "  ", "frequency": "every 1 seconds"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &h.router,
        "POST",
        "/api/v1/tasks/create",
        Some(json!({"frequency": "every 1 seconds"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_output_404_before_first_cycle() {
    let h = harness(&["http://a1"]);
    let (status, body) = send(&h.router, "GET", "/api/v1/tasks/unknown/latest_output", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("unknown"));
}

#[tokio::test]
async fn test_two_agent_cycle_end_to_end() {
    let h = harness(&["http://a1", "http://a2"]);

    let (_, created) = send(
        &h.router,
        "POST",
        "/api/v1/tasks/create",
        Some(json!({"command": "echo hi", "frequency": "every 1 seconds"})),
    )
    .await;
    let task_id = created["task_id"].as_str().unwrap().to_string();
    wait_for_fan_out(&h.dispatcher, 2).await;

    let complete_uri = format!("/api/v1/tasks/{task_id}/complete");
    let (status, first) = send(
        &h.router,
        "POST",
        &complete_uri,
        Some(json!({"agent_id": "a1", "stdout": "hi\n"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, json!({"status": "accepted", "reported": 1, "target": 2}));

    let (status, second) = send(
        &h.router,
        "POST",
        &complete_uri,
        Some(json!({"agent_id": "a2", "stdout": "hi\n"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "finalized");

    let (status, latest) = send(
        &h.router,
        "GET",
        &format!("/api/v1/tasks/{task_id}/latest_output"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["completion_time"], second["completion_time"]);
    assert_eq!(
        latest["outputs"],
        json!([
            {"agent_id": "a1", "stdout": "hi\n"},
            {"agent_id": "a2", "stdout": "hi\n"},
        ])
    );

    let parsed: LatestOutputResponse = serde_json::from_value(latest).unwrap();
    assert_eq!(parsed.outputs.len(), 2);
}

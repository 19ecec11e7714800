// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent HTTP API
//!
//! `POST /api/v1/tasks/schedule` answers `202 Accepted` once the task loop
//! is running (or was already running). An unparseable frequency is refused
//! with `400` so the coordinator does not count this agent toward quorum.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use taskfleet_core::domain::task::ScheduleInstruction;
use tower_http::trace::TraceLayer;

use crate::application::scheduler::{AgentScheduler, ScheduleOutcome};

pub struct AppState {
    pub scheduler: Arc<AgentScheduler>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<AgentScheduler>) -> Self {
        Self {
            scheduler,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/tasks/schedule", post(schedule_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "agent_id": state.scheduler.agent_id(),
        "scheduled_tasks": state.scheduler.active_tasks(),
    }))
}

async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScheduleInstruction>, JsonRejection>,
) -> Response {
    let instruction = match payload {
        Ok(Json(instruction)) => instruction,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let task_id = instruction.task_id.clone();
    match state.scheduler.schedule(instruction) {
        Ok(ScheduleOutcome::Started { interval }) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "task_id": task_id,
                "status": "scheduled",
                "interval_seconds": interval.as_secs(),
            })),
        )
            .into_response(),
        Ok(ScheduleOutcome::AlreadyScheduled) => (
            StatusCode::ACCEPTED,
            Json(json!({ "task_id": task_id, "status": "already_scheduled" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reporter::CompletionReporter;
    use crate::domain::reporting::{ReportDeliveryError, ReportSink};
    use crate::infrastructure::process::ProcessExecutor;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use taskfleet_core::domain::report::{AgentId, ExecutionResult};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    struct NullSink;

    #[async_trait]
    impl ReportSink for NullSink {
        async fn deliver(&self, _result: &ExecutionResult) -> Result<(), ReportDeliveryError> {
            Ok(())
        }
    }

    fn router(token: &CancellationToken) -> Router {
        let (queue, _reporter) = CompletionReporter::new(Arc::new(NullSink), 8, token.clone());
        let scheduler = Arc::new(AgentScheduler::new(
            AgentId::from("agent-under-test"),
            Arc::new(ProcessExecutor::new()),
            queue,
            token.clone(),
        ));
        app(AppState::new(scheduler))
    }

    async fn post_schedule(router: &Router, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/tasks/schedule")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_schedule_accepted_then_idempotent() {
        let token = CancellationToken::new();
        let router = router(&token);
        let body = r#"{"task_id":"t1","command":"echo hi","frequency":"every 1 hours"}"#;

        let (status, json) = post_schedule(&router, body).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["interval_seconds"], 3600);

        let (status, json) = post_schedule(&router, body).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "already_scheduled");

        token.cancel();
    }

    #[tokio::test]
    async fn test_schedule_rejects_invalid_frequency() {
        let token = CancellationToken::new();
        let router = router(&token);

        let (status, json) = post_schedule(
            &router,
            r#"{"task_id":"t1","command":"echo hi","frequency":"every fifteen minutes"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("every fifteen minutes"));

        let (status, _) = post_schedule(&router, r#"{"task_id":"t1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schedule_rejects_interval_beyond_clock_range() {
        let token = CancellationToken::new();
        let router = router(&token);
        let body = json!({
            "task_id": "t1",
            "command": "echo hi",
            "frequency": format!("every {} seconds", u64::MAX),
        })
        .to_string();

        let (status, json) = post_schedule(&router, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("18446744073709551615"));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["scheduled_tasks"], 0);
    }

    #[tokio::test]
    async fn test_health_reports_agent_id() {
        let token = CancellationToken::new();
        let router = router(&token);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["agent_id"], "agent-under-test");
        assert_eq!(json["scheduled_tasks"], 0);
    }
}

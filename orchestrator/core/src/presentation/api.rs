// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Coordinator HTTP API
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | `POST` | `/api/v1/tasks/create` | `201 {task_id}` |
//! | `POST` | `/api/v1/tasks/{task_id}/complete` | `200 {status, ...}` |
//! | `GET` | `/api/v1/tasks/{task_id}/latest_output` | `200 {completion_time, outputs}` |
//! | `GET` | `/health` | `200 {status, uptime_seconds}` |
//!
//! Request and response bodies are public so the SDK can share them.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::application::completion::{CompletionAggregator, CompletionOutcome};
use crate::application::task_service::{TaskService, TaskServiceError};
use crate::domain::coordination::CoordinationError;
use crate::domain::output::{FinalizedOutputRecord, TaskOutput};
use crate::domain::report::{ExecutionReport, ExecutionResult};
use crate::domain::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub command: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task_id: TaskId,
}

/// Body of a completion report.
pub type CompleteTaskRequest = ExecutionReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompleteTaskResponse {
    Accepted { reported: usize, target: usize },
    Finalized { completion_time: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestOutputResponse {
    pub completion_time: DateTime<Utc>,
    pub outputs: Vec<TaskOutput>,
}

impl From<FinalizedOutputRecord> for LatestOutputResponse {
    fn from(record: FinalizedOutputRecord) -> Self {
        Self {
            completion_time: record.completed_at,
            outputs: record.outputs,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::EmptyCommand => ApiError::BadRequest(err.to_string()),
            TaskServiceError::Repository(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Coordination(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub struct AppState {
    pub task_service: Arc<TaskService>,
    pub aggregator: Arc<CompletionAggregator>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(task_service: Arc<TaskService>, aggregator: Arc<CompletionAggregator>) -> Self {
        Self {
            task_service,
            aggregator,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/tasks/create", post(create_task_handler))
        .route("/api/v1/tasks/{task_id}/complete", post(complete_task_handler))
        .route("/api/v1/tasks/{task_id}/latest_output", get(latest_output_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let Json(request) = payload?;
    let (task, _fan_out) = state
        .task_service
        .create_task(&request.command, &request.frequency)?;

    Ok((StatusCode::CREATED, Json(CreateTaskResponse { task_id: task.id })))
}

async fn complete_task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    payload: Result<Json<CompleteTaskRequest>, JsonRejection>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let Json(report) = payload?;
    let result = ExecutionResult {
        task_id: TaskId::from(task_id),
        report,
    };

    let response = match state.aggregator.record_completion(result).await? {
        CompletionOutcome::Accepted { reported, target } => {
            CompleteTaskResponse::Accepted { reported, target }
        }
        CompletionOutcome::Finalized(record) => CompleteTaskResponse::Finalized {
            completion_time: record.completed_at,
        },
    };

    Ok(Json(response))
}

async fn latest_output_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<LatestOutputResponse>, ApiError> {
    let task_id = TaskId::from(task_id);
    match state.task_service.latest_output(&task_id).await? {
        Some(record) => Ok(Json(record.into())),
        None => Err(ApiError::NotFound(format!(
            "no finalized output for task {}",
            task_id
        ))),
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::types::{
    CompleteTaskResponse, CreateTaskRequest, CreateTaskResponse, ExecutionReport, HealthResponse,
    LatestOutputResponse, ScheduleInstruction, TaskId,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

fn build_http_client(timeout: Option<Duration>) -> Result<Client, ClientError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

async fn error_for_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Client for the coordinator API.
#[derive(Debug, Clone)]
pub struct TaskfleetClient {
    base_url: String,
    client: Client,
}

impl TaskfleetClient {
    /// Create a client without a request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            client: Client::new(),
        }
    }

    /// Create a client whose every request is bounded by `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: trim_base(base_url.into()),
            client: build_http_client(Some(timeout))?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a task. The coordinator answers before any agent is contacted.
    pub async fn create_task(&self, command: &str, frequency: &str) -> Result<CreateTaskResponse, ClientError> {
        let url = format!("{}/api/v1/tasks/create", self.base_url);
        let request = CreateTaskRequest {
            command: command.to_string(),
            frequency: frequency.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        decode(error_for_status(response).await?).await
    }

    /// Report one execution result for `task_id`.
    pub async fn complete_task(
        &self,
        task_id: &TaskId,
        report: &ExecutionReport,
    ) -> Result<CompleteTaskResponse, ClientError> {
        let url = format!("{}/api/v1/tasks/{}/complete", self.base_url, task_id);
        let response = self.client.post(&url).json(report).send().await?;
        decode(error_for_status(response).await?).await
    }

    /// Latest finalized cycle, or `None` when no cycle has completed yet.
    pub async fn latest_output(&self, task_id: &TaskId) -> Result<Option<LatestOutputResponse>, ClientError> {
        let url = format!("{}/api/v1/tasks/{}/latest_output", self.base_url, task_id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(error_for_status(response).await?).await.map(Some)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(error_for_status(response).await?).await
    }
}

/// Client for a single agent's API.
#[derive(Debug, Clone)]
pub struct AgentClient {
    base_url: String,
    client: Client,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            client: Client::new(),
        }
    }

    /// Push a schedule instruction directly to this agent.
    pub async fn schedule(&self, instruction: &ScheduleInstruction) -> Result<(), ClientError> {
        let url = format!("{}/api/v1/tasks/schedule", self.base_url);
        let response = self.client.post(&url).json(instruction).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(error_for_status(response).await?).await
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

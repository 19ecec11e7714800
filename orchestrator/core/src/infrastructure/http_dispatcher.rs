// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP adapter for [`ScheduleDispatcher`]: `POST {agent}/api/v1/tasks/schedule`.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::dispatch::{DispatchError, ScheduleDispatcher};
use crate::domain::task::ScheduleInstruction;

pub struct HttpScheduleDispatcher {
    client: Client,
}

impl HttpScheduleDispatcher {
    pub fn new(request_timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ScheduleDispatcher for HttpScheduleDispatcher {
    async fn dispatch(&self, agent: &str, instruction: &ScheduleInstruction) -> Result<(), DispatchError> {
        let url = format!("{}/api/v1/tasks/schedule", agent.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(instruction)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout
                } else {
                    DispatchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

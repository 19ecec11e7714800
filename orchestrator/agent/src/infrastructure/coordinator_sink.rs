// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! [`ReportSink`] that posts results to the coordinator through the SDK client.

use async_trait::async_trait;
use std::time::Duration;
use taskfleet_core::domain::report::ExecutionResult;
use taskfleet_sdk::{ClientError, TaskfleetClient};

use crate::domain::reporting::{ReportDeliveryError, ReportSink};

pub struct CoordinatorReportSink {
    client: TaskfleetClient,
}

impl CoordinatorReportSink {
    pub fn new(coordinator_address: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: TaskfleetClient::with_timeout(coordinator_address, timeout)?,
        })
    }
}

#[async_trait]
impl ReportSink for CoordinatorReportSink {
    async fn deliver(&self, result: &ExecutionResult) -> Result<(), ReportDeliveryError> {
        self.client
            .complete_task(&result.task_id, &result.report)
            .await
            .map(|_| ())
            .map_err(|e| ReportDeliveryError(e.to_string()))
    }
}

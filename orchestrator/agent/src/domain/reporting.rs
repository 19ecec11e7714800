// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use taskfleet_core::domain::report::ExecutionResult;

/// Destination of execution results. One call per result, no retry.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, result: &ExecutionResult) -> Result<(), ReportDeliveryError>;
}

#[derive(Debug, thiserror::Error)]
#[error("report delivery failed: {0}")]
pub struct ReportDeliveryError(pub String);

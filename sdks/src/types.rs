// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Types
//!
//! Wire types shared with the coordinator and agent HTTP handlers.

pub use taskfleet_core::domain::output::TaskOutput;
pub use taskfleet_core::domain::report::{AgentId, ExecutionReport};
pub use taskfleet_core::domain::task::{ScheduleInstruction, TaskId};
pub use taskfleet_core::presentation::api::{
    CompleteTaskRequest, CompleteTaskResponse, CreateTaskRequest, CreateTaskResponse,
    LatestOutputResponse,
};

use serde::{Deserialize, Serialize};

/// `GET /health` body. `agent_id` and `scheduled_tasks` are only set by agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_tasks: Option<usize>,
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Execution reports produced by agents, one per tick.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::task::TaskId;

/// Agent identity. Generated at agent startup and stable for the process lifetime only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Body of `POST /api/v1/tasks/{task_id}/complete`.
///
/// Empty streams are omitted on the wire and default to empty on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

/// One tick's result for one task on one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub task_id: TaskId,
    pub report: ExecutionReport,
}

impl ExecutionResult {
    pub fn new(
        task_id: TaskId,
        agent_id: AgentId,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            report: ExecutionReport {
                agent_id,
                stdout: stdout.into(),
                stderr: stderr.into(),
            },
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.report.agent_id
    }
}

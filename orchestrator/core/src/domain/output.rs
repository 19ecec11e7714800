// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Finalized Output Records
//!
//! A [`FinalizedOutputRecord`] is the merged result of one completed quorum
//! cycle. It is written exactly once and never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::report::{AgentId, ExecutionReport};
use crate::domain::task::TaskId;

/// One agent's contribution inside a finalized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl From<ExecutionReport> for TaskOutput {
    fn from(report: ExecutionReport) -> Self {
        Self {
            agent_id: report.agent_id,
            stdout: report.stdout,
            stderr: report.stderr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedOutputRecord {
    pub task_id: TaskId,
    pub outputs: Vec<TaskOutput>,
    pub completed_at: DateTime<Utc>,
}

impl FinalizedOutputRecord {
    /// Merge the reports of one cycle. Outputs are ordered by agent id.
    pub fn from_reports(
        task_id: TaskId,
        reports: impl IntoIterator<Item = ExecutionReport>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let mut outputs: Vec<TaskOutput> = reports.into_iter().map(TaskOutput::from).collect();
        outputs.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        Self {
            task_id,
            outputs,
            completed_at,
        }
    }
}

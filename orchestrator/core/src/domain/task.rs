// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Aggregate
//!
//! A [`Task`] is created once by the coordinator and is immutable afterwards.
//! Each configured agent receives its own [`ScheduleInstruction`] copy of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, coordinator-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new globally-unique `TaskId`.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the per-cycle quorum set in the coordination store.
    pub fn quorum_set_key(&self) -> String {
        format!("{}_done", self.0)
    }

    /// Key holding the number of agents that acknowledged the schedule call.
    pub fn quorum_target_key(&self) -> String {
        format!("{}_quorum", self.0)
    }

    /// Name of the per-task distributed lock.
    pub fn lock_key(&self) -> String {
        format!("lock-{}", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A recurring command definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Raw command line, split on whitespace by the agent executor.
    pub command: String,
    /// Cadence text, e.g. `"every 15 minutes"`. Parsed on the agent.
    pub frequency: String,
}

impl Task {
    pub fn new(command: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            command: command.into(),
            frequency: frequency.into(),
        }
    }

    /// Build the instruction pushed to every agent at fan-out time.
    pub fn schedule_instruction(&self) -> ScheduleInstruction {
        ScheduleInstruction {
            task_id: self.id.clone(),
            command: self.command.clone(),
            frequency: self.frequency.clone(),
        }
    }
}

/// Body of `POST /api/v1/tasks/schedule` on an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInstruction {
    pub task_id: TaskId,
    pub command: String,
    pub frequency: String,
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Coordination Contracts
//!
//! The two distributed primitives the completion aggregator is written
//! against: a per-task quorum set and a TTL-bounded named lock. Both are
//! implemented over Redis for production and in-process for tests
//! (`crate::infrastructure::coordination`).
//!
//! The quorum set is keyed by agent id. A second report from the same agent
//! in one cycle replaces the first and never grows the cardinality.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::report::ExecutionReport;
use crate::domain::repository::RepositoryError;
use crate::domain::task::TaskId;

/// Per-task, per-cycle collection of agent reports.
#[async_trait]
pub trait QuorumStore: Send + Sync {
    /// Add the report to the task's current cycle, replacing any earlier report from the same agent.
    async fn record(&self, task_id: &TaskId, report: &ExecutionReport) -> Result<(), CoordinationError>;

    /// Number of distinct agents that reported in the current cycle.
    async fn cardinality(&self, task_id: &TaskId) -> Result<usize, CoordinationError>;

    async fn members(&self, task_id: &TaskId) -> Result<Vec<ExecutionReport>, CoordinationError>;

    /// Drop the current cycle so the next report starts a fresh one.
    async fn reset(&self, task_id: &TaskId) -> Result<(), CoordinationError>;

    /// Persist the number of agents that acknowledged the schedule call.
    async fn set_quorum_target(&self, task_id: &TaskId, target: usize) -> Result<(), CoordinationError>;

    async fn quorum_target(&self, task_id: &TaskId) -> Result<Option<usize>, CoordinationError>;
}

/// Ownership proof returned by a successful acquire. Only the holder of the
/// matching token can release the lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(pub String);

impl LockToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LockToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Single non-blocking attempt. `Ok(None)` means the lock is held by someone else.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>, CoordinationError>;

    /// Release the lock if `token` still owns it. Returns `false` when it had
    /// already expired or been taken over.
    async fn release(&self, key: &str, token: &LockToken) -> Result<bool, CoordinationError>;

    /// Reset the lock's expiry to `ttl` from now if `token` still owns it.
    /// Returns `false` when ownership was already lost.
    async fn extend(&self, key: &str, token: &LockToken, ttl: Duration) -> Result<bool, CoordinationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error("Lock '{key}' not obtained after {attempts} attempts")]
    LockNotObtained { key: String, attempts: u32 },

    #[error("Lock '{key}' expired while held")]
    LockLost { key: String },

    #[error("Coordination store error: {0}")]
    Store(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Completion handling timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for CoordinationError {
    fn from(err: redis::RedisError) -> Self {
        CoordinationError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for CoordinationError {
    fn from(err: serde_json::Error) -> Self {
        CoordinationError::Serialization(err.to_string())
    }
}

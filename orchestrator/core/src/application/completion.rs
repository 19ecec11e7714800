// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Completion Aggregator
//!
//! Serializes completion reports for one task behind the `lock-<task_id>`
//! distributed lock and finalizes the cycle when the quorum set reaches its
//! target. Per report:
//!
//! 1. acquire the task lock with bounded fixed backoff
//! 2. record the report and re-read the cardinality
//! 3. when the cardinality reaches the target, extend the lock to cover the
//!    rest of the step, read all members, persist one
//!    [`FinalizedOutputRecord`] and reset the set
//! 4. release the lock on every exit path
//!
//! The whole step is bounded by `report_timeout`. A failure inside the
//! critical section leaves the quorum set untouched so a later report can
//! still complete the cycle.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Exactly-once finalize per quorum cycle

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::application::lock::{acquire_with_backoff, LockGuard, RetryPolicy};
use crate::domain::coordination::{CoordinationError, DistributedLock, QuorumStore};
use crate::domain::node_config::CoordinatorConfig;
use crate::domain::output::FinalizedOutputRecord;
use crate::domain::report::ExecutionResult;
use crate::domain::repository::TaskOutputRepository;
use crate::domain::task::TaskId;

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    /// Roster size, used as the quorum target until fan-out stores the acknowledged count.
    pub configured_agents: usize,
    pub lock_policy: RetryPolicy,
    pub report_timeout: Duration,
}

impl From<&CoordinatorConfig> for AggregatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            configured_agents: config.available_agents.len(),
            lock_policy: RetryPolicy::from(&config.lock),
            report_timeout: config.report_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Report recorded, cycle still open.
    Accepted { reported: usize, target: usize },
    /// This report completed the cycle.
    Finalized(FinalizedOutputRecord),
}

pub struct CompletionAggregator {
    quorum: Arc<dyn QuorumStore>,
    lock: Arc<dyn DistributedLock>,
    outputs: Arc<dyn TaskOutputRepository>,
    settings: AggregatorSettings,
}

impl CompletionAggregator {
    pub fn new(
        quorum: Arc<dyn QuorumStore>,
        lock: Arc<dyn DistributedLock>,
        outputs: Arc<dyn TaskOutputRepository>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            quorum,
            lock,
            outputs,
            settings,
        }
    }

    pub async fn record_completion(
        &self,
        result: ExecutionResult,
    ) -> Result<CompletionOutcome, CoordinationError> {
        let timeout = self.settings.report_timeout;
        let outcome = match tokio::time::timeout(timeout, self.aggregate(&result)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CoordinationError::Timeout(timeout)),
        };

        match &outcome {
            Ok(CompletionOutcome::Accepted { reported, target }) => {
                metrics::counter!("taskfleet_reports_accepted_total").increment(1);
                debug!(
                    task_id = %result.task_id,
                    agent_id = %result.agent_id(),
                    reported,
                    target,
                    "Completion report recorded"
                );
            }
            Ok(CompletionOutcome::Finalized(record)) => {
                metrics::counter!("taskfleet_reports_accepted_total").increment(1);
                metrics::counter!("taskfleet_cycles_finalized_total").increment(1);
                info!(
                    task_id = %record.task_id,
                    agent_id = %result.agent_id(),
                    outputs = record.outputs.len(),
                    completed_at = %record.completed_at.to_rfc3339(),
                    "Quorum reached, cycle finalized"
                );
            }
            Err(e) => {
                metrics::counter!("taskfleet_coordination_failures_total").increment(1);
                error!(
                    task_id = %result.task_id,
                    agent_id = %result.agent_id(),
                    "Completion handling failed: {}",
                    e
                );
            }
        }

        outcome
    }

    async fn aggregate(&self, result: &ExecutionResult) -> Result<CompletionOutcome, CoordinationError> {
        let guard = acquire_with_backoff(
            Arc::clone(&self.lock),
            &result.task_id.lock_key(),
            &self.settings.lock_policy,
        )
        .await?;

        let outcome = self.critical_section(result, &guard).await;

        match guard.release().await {
            Ok(true) => {}
            Ok(false) => warn!(
                task_id = %result.task_id,
                "Lock expired before release; critical section outlived its TTL"
            ),
            Err(e) => warn!(task_id = %result.task_id, "Failed to release lock: {}", e),
        }

        outcome
    }

    async fn critical_section(
        &self,
        result: &ExecutionResult,
        guard: &LockGuard,
    ) -> Result<CompletionOutcome, CoordinationError> {
        let task_id = &result.task_id;

        self.quorum.record(task_id, &result.report).await?;
        let reported = self.quorum.cardinality(task_id).await?;
        let target = self.quorum_target(task_id).await?;

        if reported < target {
            return Ok(CompletionOutcome::Accepted { reported, target });
        }

        // Finalizing may outlast the acquire TTL; the overall timeout bounds it instead.
        guard
            .extend(self.settings.report_timeout.max(self.settings.lock_policy.ttl))
            .await?;

        let members = self.quorum.members(task_id).await?;
        let record = FinalizedOutputRecord::from_reports(task_id.clone(), members, Utc::now());
        self.outputs.insert(&record).await?;
        self.quorum.reset(task_id).await?;

        Ok(CompletionOutcome::Finalized(record))
    }

    async fn quorum_target(&self, task_id: &TaskId) -> Result<usize, CoordinationError> {
        let stored = self.quorum.quorum_target(task_id).await?;
        Ok(stored
            .filter(|target| *target > 0)
            .unwrap_or(self.settings.configured_agents)
            .max(1))
    }
}

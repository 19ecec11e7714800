// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Completion Reporter
//!
//! Results are queued by the scheduling loops and drained by one reporter
//! loop per agent. Each result gets exactly one delivery attempt; failures
//! are logged, counted and dropped.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Decouple tick cadence from coordinator latency

use std::sync::Arc;
use taskfleet_core::domain::report::ExecutionResult;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::reporting::ReportSink;

/// Producer side of the report queue. Never blocks the caller.
#[derive(Clone)]
pub struct ReportQueue {
    tx: mpsc::Sender<ExecutionResult>,
}

impl ReportQueue {
    /// Enqueue a result. Returns `false` when it had to be dropped.
    pub fn enqueue(&self, result: ExecutionResult) -> bool {
        match self.tx.try_send(result) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(result)) => {
                metrics::counter!("taskfleet_agent_reports_dropped_total").increment(1);
                warn!(task_id = %result.task_id, "Report queue full, dropping result");
                false
            }
            Err(mpsc::error::TrySendError::Closed(result)) => {
                metrics::counter!("taskfleet_agent_reports_dropped_total").increment(1);
                warn!(task_id = %result.task_id, "Reporter stopped, dropping result");
                false
            }
        }
    }
}

pub struct CompletionReporter {
    sink: Arc<dyn ReportSink>,
    rx: mpsc::Receiver<ExecutionResult>,
    shutdown_token: CancellationToken,
}

impl CompletionReporter {
    /// Build the queue and its single consumer.
    pub fn new(
        sink: Arc<dyn ReportSink>,
        capacity: usize,
        shutdown_token: CancellationToken,
    ) -> (ReportQueue, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            ReportQueue { tx },
            Self {
                sink,
                rx,
                shutdown_token,
            },
        )
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Starting completion reporter");

        loop {
            let result = tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping completion reporter");
                    break;
                }
                next = self.rx.recv() => match next {
                    Some(result) => result,
                    None => break,
                },
            };

            match self.sink.deliver(&result).await {
                Ok(()) => debug!(
                    task_id = %result.task_id,
                    agent_id = %result.agent_id(),
                    "Completion reported"
                ),
                Err(e) => {
                    metrics::counter!("taskfleet_agent_reports_dropped_total").increment(1);
                    warn!(
                        task_id = %result.task_id,
                        agent_id = %result.agent_id(),
                        "Dropping completion report: {}",
                        e
                    );
                }
            }
        }

        info!("Completion reporter stopped");
    }
}

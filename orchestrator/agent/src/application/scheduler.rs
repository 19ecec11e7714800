// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Scheduler
//!
//! Registry of per-task scheduling loops keyed by [`TaskId`]. Each loop owns
//! a child of the agent's shutdown token and moves through
//! `Waiting -> Executing -> Waiting` until that token fires.
//!
//! Execution runs inline in the task's loop. An overrunning command delays
//! the next tick instead of queueing extra ones.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Independent recurring execution per scheduled task

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use taskfleet_core::domain::frequency::{FrequencyError, FrequencySpec};
use taskfleet_core::domain::report::{AgentId, ExecutionResult};
use taskfleet_core::domain::task::{ScheduleInstruction, TaskId};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::reporter::ReportQueue;
use crate::domain::executor::CommandExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Started { interval: Duration },
    /// A loop for this task is already running; the instruction was ignored.
    AlreadyScheduled,
}

struct ScheduledTask {
    frequency: FrequencySpec,
    handle: JoinHandle<()>,
}

pub struct AgentScheduler {
    agent_id: AgentId,
    executor: Arc<dyn CommandExecutor>,
    reports: ReportQueue,
    shutdown_token: CancellationToken,
    tasks: RwLock<HashMap<TaskId, ScheduledTask>>,
}

impl AgentScheduler {
    pub fn new(
        agent_id: AgentId,
        executor: Arc<dyn CommandExecutor>,
        reports: ReportQueue,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            agent_id,
            executor,
            reports,
            shutdown_token,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Start the loop for `instruction`. An invalid frequency is rejected
    /// here and affects this task only.
    pub fn schedule(&self, instruction: ScheduleInstruction) -> Result<ScheduleOutcome, FrequencyError> {
        let frequency = match FrequencySpec::parse(&instruction.frequency) {
            Ok(frequency) => frequency,
            Err(e) => {
                warn!(task_id = %instruction.task_id, "Not scheduling task: {}", e);
                return Err(e);
            }
        };

        // The first tick must be representable on this clock.
        let Some(first_tick) = Instant::now().checked_add(frequency.interval()) else {
            warn!(
                task_id = %instruction.task_id,
                frequency = %frequency,
                "Not scheduling task: interval exceeds the clock range"
            );
            return Err(FrequencyError::InvalidFrequencyFormat(instruction.frequency));
        };

        let mut tasks = self.tasks.write();
        if let Some(existing) = tasks.get(&instruction.task_id) {
            if !existing.handle.is_finished() {
                info!(
                    task_id = %instruction.task_id,
                    frequency = %existing.frequency,
                    "Task already scheduled, ignoring duplicate instruction"
                );
                return Ok(ScheduleOutcome::AlreadyScheduled);
            }
        }

        let task_loop = TaskLoop {
            task_id: instruction.task_id.clone(),
            command: instruction.command,
            interval: frequency.interval(),
            first_tick,
            agent_id: self.agent_id.clone(),
            executor: Arc::clone(&self.executor),
            reports: self.reports.clone(),
            shutdown_token: self.shutdown_token.child_token(),
        };

        info!(
            task_id = %instruction.task_id,
            command = %task_loop.command,
            frequency = %frequency,
            "Task scheduled"
        );

        let handle = tokio::spawn(task_loop.run());
        tasks.insert(instruction.task_id, ScheduledTask { frequency, handle });

        Ok(ScheduleOutcome::Started {
            interval: frequency.interval(),
        })
    }

    /// Number of loops still running.
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .read()
            .values()
            .filter(|t| !t.handle.is_finished())
            .count()
    }

    pub fn is_scheduled(&self, task_id: &TaskId) -> bool {
        self.tasks
            .read()
            .get(task_id)
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Cancel every loop and wait for them to exit.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        let handles: Vec<JoinHandle<()>> = self
            .tasks
            .write()
            .drain()
            .map(|(_, task)| task.handle)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Scheduling loop ended abnormally: {}", e);
            }
        }
    }
}

struct TaskLoop {
    task_id: TaskId,
    command: String,
    interval: Duration,
    first_tick: Instant,
    agent_id: AgentId,
    executor: Arc<dyn CommandExecutor>,
    reports: ReportQueue,
    shutdown_token: CancellationToken,
}

impl TaskLoop {
    async fn run(self) {
        let mut ticker = interval_at(self.first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            debug!(task_id = %self.task_id, "Executing scheduled command");
            let output = tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => break,
                output = self.executor.execute(&self.command) => output,
            };

            metrics::counter!("taskfleet_agent_executions_total").increment(1);

            match output {
                Ok(output) => {
                    if output.exit_failure() {
                        debug!(
                            task_id = %self.task_id,
                            exit_code = ?output.exit_code,
                            "Command exited with failure"
                        );
                    }
                    self.reports.enqueue(ExecutionResult::new(
                        self.task_id.clone(),
                        self.agent_id.clone(),
                        output.stdout,
                        output.stderr,
                    ));
                }
                Err(e) => {
                    warn!(task_id = %self.task_id, "Tick aborted, nothing reported: {}", e);
                }
            }
        }

        info!(task_id = %self.task_id, "Scheduling loop stopped");
    }
}

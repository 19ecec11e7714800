// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task Creation & Fan-out
//!
//! `create_task` assigns a [`TaskId`] and returns immediately. Fan-out then
//! runs in the background: one schedule call per configured agent, in
//! sequence, each bounded by its own timeout. Failures are logged and never
//! stop the remaining calls. When fan-out ends, the number of agents that
//! acknowledged is stored as the task's quorum target.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Task creation, best-effort fan-out and the latest-output read path

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::coordination::QuorumStore;
use crate::domain::dispatch::{DispatchError, ScheduleDispatcher};
use crate::domain::output::FinalizedOutputRecord;
use crate::domain::repository::{RepositoryError, TaskOutputRepository};
use crate::domain::task::{Task, TaskId};

#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    #[error("command cannot be empty")]
    EmptyCommand,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of one fan-out round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub acknowledged: Vec<String>,
    pub failed: Vec<String>,
}

/// Sequential best-effort delivery of a task to the agent roster.
pub struct FanOut {
    dispatcher: Arc<dyn ScheduleDispatcher>,
    quorum: Arc<dyn QuorumStore>,
    agents: Vec<String>,
    request_timeout: Duration,
}

impl FanOut {
    pub fn new(
        dispatcher: Arc<dyn ScheduleDispatcher>,
        quorum: Arc<dyn QuorumStore>,
        agents: Vec<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            quorum,
            agents,
            request_timeout,
        }
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub async fn run(&self, task: &Task) -> FanOutReport {
        let instruction = task.schedule_instruction();
        let mut report = FanOutReport::default();

        for agent in &self.agents {
            let outcome = match tokio::time::timeout(
                self.request_timeout,
                self.dispatcher.dispatch(agent, &instruction),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout),
            };

            match outcome {
                Ok(()) => {
                    info!(task_id = %task.id, agent = %agent, "Task scheduled on agent");
                    report.acknowledged.push(agent.clone());
                }
                Err(e) => {
                    metrics::counter!("taskfleet_fanout_failures_total").increment(1);
                    warn!(task_id = %task.id, agent = %agent, "Failed to schedule task on agent: {}", e);
                    report.failed.push(agent.clone());
                }
            }
        }

        if report.acknowledged.is_empty() {
            // Target stays unset; the aggregator falls back to the roster size.
            error!(
                task_id = %task.id,
                agents = self.agents.len(),
                "No agent acknowledged the task; it cannot complete a cycle"
            );
            return report;
        }

        if let Err(e) = self
            .quorum
            .set_quorum_target(&task.id, report.acknowledged.len())
            .await
        {
            warn!(
                task_id = %task.id,
                target = report.acknowledged.len(),
                "Failed to store quorum target, roster size stays in effect: {}",
                e
            );
        }

        report
    }
}

pub struct TaskService {
    fan_out: Arc<FanOut>,
    outputs: Arc<dyn TaskOutputRepository>,
}

impl TaskService {
    pub fn new(fan_out: Arc<FanOut>, outputs: Arc<dyn TaskOutputRepository>) -> Self {
        Self { fan_out, outputs }
    }

    /// Create a task and start fan-out in the background. The returned handle
    /// resolves when every agent has been tried; callers may ignore it.
    pub fn create_task(
        &self,
        command: &str,
        frequency: &str,
    ) -> Result<(Task, JoinHandle<FanOutReport>), TaskServiceError> {
        if command.trim().is_empty() {
            return Err(TaskServiceError::EmptyCommand);
        }

        let task = Task::new(command, frequency);
        metrics::counter!("taskfleet_tasks_created_total").increment(1);
        info!(
            task_id = %task.id,
            command = %task.command,
            frequency = %task.frequency,
            agents = self.fan_out.agents().len(),
            "Task created"
        );

        let fan_out = Arc::clone(&self.fan_out);
        let spawned = task.clone();
        let handle = tokio::spawn(async move { fan_out.run(&spawned).await });

        Ok((task, handle))
    }

    pub async fn latest_output(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<FinalizedOutputRecord>, TaskServiceError> {
        Ok(self.outputs.find_latest(task_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::ScheduleInstruction;
    use crate::infrastructure::coordination::InMemoryCoordinationStore;
    use crate::infrastructure::repositories::InMemoryTaskOutputRepository;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records calls; agents listed in `down` fail, agents in `hang` never answer.
    #[derive(Default)]
    struct MockDispatcher {
        calls: Mutex<Vec<(String, ScheduleInstruction)>>,
        down: Vec<String>,
        hang: Vec<String>,
    }

    #[async_trait]
    impl ScheduleDispatcher for MockDispatcher {
        async fn dispatch(&self, agent: &str, instruction: &ScheduleInstruction) -> Result<(), DispatchError> {
            self.calls.lock().push((agent.to_string(), instruction.clone()));
            if self.hang.iter().any(|a| a == agent) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.down.iter().any(|a| a == agent) {
                return Err(DispatchError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn agents(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn service(dispatcher: Arc<MockDispatcher>, store: Arc<InMemoryCoordinationStore>, roster: &[&str]) -> TaskService {
        let fan_out = FanOut::new(dispatcher, store, agents(roster), Duration::from_millis(100));
        TaskService::new(Arc::new(fan_out), Arc::new(InMemoryTaskOutputRepository::new()))
    }

    #[tokio::test]
    async fn test_create_task_fans_out_to_every_agent() {
        let dispatcher = Arc::new(MockDispatcher::default());
        let store = Arc::new(InMemoryCoordinationStore::new());
        let service = service(dispatcher.clone(), store.clone(), &["http://a", "http://b"]);

        let (task, handle) = service.create_task("echo hi", "every 1 seconds").unwrap();
        let report = handle.await.unwrap();

        assert_eq!(report.acknowledged, agents(&["http://a", "http://b"]));
        assert!(report.failed.is_empty());

        let calls = dispatcher.calls.lock().clone();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, i)| i.task_id == task.id && i.command == "echo hi"));
        assert_eq!(store.quorum_target(&task.id).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_agent_does_not_stop_fan_out() {
        let dispatcher = Arc::new(MockDispatcher {
            down: agents(&["http://a"]),
            hang: agents(&["http://b"]),
            ..Default::default()
        });
        let store = Arc::new(InMemoryCoordinationStore::new());
        let service = service(dispatcher.clone(), store.clone(), &["http://a", "http://b", "http://c"]);

        let (task, handle) = service.create_task("date", "every 5 minutes").unwrap();
        let report = handle.await.unwrap();

        assert_eq!(report.acknowledged, agents(&["http://c"]));
        assert_eq!(report.failed, agents(&["http://a", "http://b"]));
        assert_eq!(store.quorum_target(&task.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_no_acknowledgement_leaves_target_unset() {
        let dispatcher = Arc::new(MockDispatcher {
            down: agents(&["http://a"]),
            ..Default::default()
        });
        let store = Arc::new(InMemoryCoordinationStore::new());
        let service = service(dispatcher, store.clone(), &["http://a"]);

        let (task, handle) = service.create_task("date", "every 5 minutes").unwrap();
        let report = handle.await.unwrap();

        assert!(report.acknowledged.is_empty());
        assert_eq!(store.quorum_target(&task.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_command_is_rejected() {
        let dispatcher = Arc::new(MockDispatcher::default());
        let store = Arc::new(InMemoryCoordinationStore::new());
        let service = service(dispatcher.clone(), store, &["http://a"]);

        let err = service.create_task("   ", "every 1 seconds").unwrap_err();
        assert!(matches!(err, TaskServiceError::EmptyCommand));
        assert!(dispatcher.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_latest_output_absent() {
        let service = service(
            Arc::new(MockDispatcher::default()),
            Arc::new(InMemoryCoordinationStore::new()),
            &["http://a"],
        );
        let latest = service.latest_output(&TaskId::from("missing")).await.unwrap();
        assert!(latest.is_none());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Coordination Store Implementations
//!
//! Adapters for the `QuorumStore` and `DistributedLock` contracts.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Shared quorum set and per-task lock across coordinator instances
//!
//! # Available Implementations
//!
//! - **RedisCoordinationStore** - Redis hash per cycle, `SET NX PX` lock with Lua release
//! - **InMemoryCoordinationStore** - single-process store for tests and `--in-memory`

pub mod redis_store;

pub use redis_store::RedisCoordinationStore;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::domain::coordination::{CoordinationError, DistributedLock, LockToken, QuorumStore};
use crate::domain::report::{AgentId, ExecutionReport};
use crate::domain::task::TaskId;

#[derive(Default)]
struct State {
    cycles: HashMap<TaskId, BTreeMap<AgentId, ExecutionReport>>,
    targets: HashMap<TaskId, usize>,
    locks: HashMap<String, (LockToken, Instant)>,
}

/// Process-local coordination store. Lock expiry is checked lazily on access.
#[derive(Default)]
pub struct InMemoryCoordinationStore {
    state: Mutex<State>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held by an unexpired token.
    pub fn is_locked(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .locks
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }
}

#[async_trait]
impl QuorumStore for InMemoryCoordinationStore {
    async fn record(&self, task_id: &TaskId, report: &ExecutionReport) -> Result<(), CoordinationError> {
        self.state
            .lock()
            .cycles
            .entry(task_id.clone())
            .or_default()
            .insert(report.agent_id.clone(), report.clone());
        Ok(())
    }

    async fn cardinality(&self, task_id: &TaskId) -> Result<usize, CoordinationError> {
        Ok(self.state.lock().cycles.get(task_id).map_or(0, BTreeMap::len))
    }

    async fn members(&self, task_id: &TaskId) -> Result<Vec<ExecutionReport>, CoordinationError> {
        Ok(self
            .state
            .lock()
            .cycles
            .get(task_id)
            .map(|cycle| cycle.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn reset(&self, task_id: &TaskId) -> Result<(), CoordinationError> {
        self.state.lock().cycles.remove(task_id);
        Ok(())
    }

    async fn set_quorum_target(&self, task_id: &TaskId, target: usize) -> Result<(), CoordinationError> {
        self.state.lock().targets.insert(task_id.clone(), target);
        Ok(())
    }

    async fn quorum_target(&self, task_id: &TaskId) -> Result<Option<usize>, CoordinationError> {
        Ok(self.state.lock().targets.get(task_id).copied())
    }
}

#[async_trait]
impl DistributedLock for InMemoryCoordinationStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>, CoordinationError> {
        let now = Instant::now();
        let mut state = self.state.lock();

        if let Some((_, expires_at)) = state.locks.get(key) {
            if *expires_at > now {
                return Ok(None);
            }
        }

        let token = LockToken::new();
        state.locks.insert(key.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release(&self, key: &str, token: &LockToken) -> Result<bool, CoordinationError> {
        let mut state = self.state.lock();
        match state.locks.get(key) {
            Some((held, expires_at)) if held == token => {
                let live = *expires_at > Instant::now();
                state.locks.remove(key);
                Ok(live)
            }
            _ => Ok(false),
        }
    }

    async fn extend(&self, key: &str, token: &LockToken, ttl: Duration) -> Result<bool, CoordinationError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.locks.get_mut(key) {
            Some((held, expires_at)) if held == token && *expires_at > now => {
                *expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

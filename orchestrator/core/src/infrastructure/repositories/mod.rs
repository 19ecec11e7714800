// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `TaskOutputRepository` abstraction
//! defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve finalized output records
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresTaskOutputRepository** - transactional insert into `task_outputs`
//! - **InMemoryTaskOutputRepository** - HashMap-backed storage for tests and `--in-memory`

pub mod postgres_task_output;

pub use postgres_task_output::PostgresTaskOutputRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::output::FinalizedOutputRecord;
use crate::domain::repository::{RepositoryError, TaskOutputRepository};
use crate::domain::task::TaskId;

#[derive(Clone, Default)]
pub struct InMemoryTaskOutputRepository {
    records: Arc<RwLock<HashMap<TaskId, Vec<FinalizedOutputRecord>>>>,
}

impl InMemoryTaskOutputRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of finalized cycles stored for `task_id`.
    pub fn count(&self, task_id: &TaskId) -> usize {
        self.records.read().get(task_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl TaskOutputRepository for InMemoryTaskOutputRepository {
    async fn insert(&self, record: &FinalizedOutputRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .entry(record.task_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn find_latest(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<FinalizedOutputRecord>, RepositoryError> {
        let records = self.records.read();
        Ok(records
            .get(task_id)
            .and_then(|cycles| cycles.iter().max_by_key(|r| r.completed_at))
            .cloned())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for finalized output records. The interface lives in
//! the domain layer and is implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `TaskOutputRepository` | `FinalizedOutputRecord` | `InMemoryTaskOutputRepository`, `PostgresTaskOutputRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! The implementation is selected at coordinator startup: PostgreSQL in
//! production, in-memory for `--in-memory` runs and tests.

use async_trait::async_trait;

use crate::domain::output::FinalizedOutputRecord;
use crate::domain::task::TaskId;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

/// Write-once store of finalized cycles.
#[async_trait]
pub trait TaskOutputRepository: Send + Sync {
    /// Insert one record inside a single transaction. Nothing is visible before commit.
    async fn insert(&self, record: &FinalizedOutputRecord) -> Result<(), RepositoryError>;

    /// Record with the greatest `completed_at` for the task, if any cycle has finalized.
    async fn find_latest(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<FinalizedOutputRecord>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

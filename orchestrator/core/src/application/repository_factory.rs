// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository and coordination-store implementations based
//! on the selected storage backend, keeping the domain layer free of
//! infrastructure dependencies.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wires in-memory or PostgreSQL/Redis backends behind the domain traits

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::coordination::{DistributedLock, QuorumStore};
use crate::domain::repository::{StorageBackend, TaskOutputRepository};
use crate::infrastructure::coordination::RedisCoordinationStore;
use crate::infrastructure::coordination::InMemoryCoordinationStore;
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_task_output::PostgresTaskOutputRepository;
use crate::infrastructure::repositories::InMemoryTaskOutputRepository;

/// Creates a TaskOutputRepository implementation based on the configured backend.
/// PostgreSQL connects and applies pending migrations first.
pub async fn create_task_output_repository(
    backend: &StorageBackend,
) -> Result<Arc<dyn TaskOutputRepository>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryTaskOutputRepository::new())),
        StorageBackend::PostgreSQL(config) => {
            let db = Database::new(&config.connection_string)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.run_migrations()
                .await
                .context("Failed to apply database migrations")?;
            Ok(Arc::new(PostgresTaskOutputRepository::new(db.get_pool().clone())))
        }
    }
}

/// Quorum set and lock share one store so both see the same connection.
pub struct CoordinationHandles {
    pub quorum: Arc<dyn QuorumStore>,
    pub lock: Arc<dyn DistributedLock>,
}

/// `None` selects the in-process store.
pub async fn create_coordination_store(redis_address: Option<&str>) -> Result<CoordinationHandles> {
    match redis_address {
        None => {
            let store = Arc::new(InMemoryCoordinationStore::new());
            Ok(CoordinationHandles {
                quorum: store.clone(),
                lock: store,
            })
        }
        Some(address) => {
            let store = Arc::new(
                RedisCoordinationStore::connect(address)
                    .await
                    .with_context(|| format!("Failed to connect to Redis at {}", address))?,
            );
            Ok(CoordinationHandles {
                quorum: store.clone(),
                lock: store,
            })
        }
    }
}

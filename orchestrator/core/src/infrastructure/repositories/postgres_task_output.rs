// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::output::{FinalizedOutputRecord, TaskOutput};
use crate::domain::repository::{RepositoryError, TaskOutputRepository};
use crate::domain::task::TaskId;

pub struct PostgresTaskOutputRepository {
    pool: PgPool,
}

impl PostgresTaskOutputRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskOutputRepository for PostgresTaskOutputRepository {
    async fn insert(&self, record: &FinalizedOutputRecord) -> Result<(), RepositoryError> {
        let outputs_json = serde_json::to_value(&record.outputs)?;

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO task_outputs (task_id, outputs, completed_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.task_id.as_str())
        .bind(outputs_json)
        .bind(record.completed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_latest(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<FinalizedOutputRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT outputs, completed_at
            FROM task_outputs
            WHERE task_id = $1
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(task_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let outputs_json: serde_json::Value = row.try_get("outputs")?;
        let completed_at: DateTime<Utc> = row.try_get("completed_at")?;
        let outputs: Vec<TaskOutput> = serde_json::from_value(outputs_json)?;

        Ok(Some(FinalizedOutputRecord {
            task_id: task_id.clone(),
            outputs,
            completed_at,
        }))
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Redis-backed quorum set and lock.
//!
//! | Key | Type | Contents |
//! |-----|------|----------|
//! | `<task_id>_done` | hash | field = agent id, value = JSON report |
//! | `<task_id>_quorum` | string | acknowledged agent count |
//! | `lock-<task_id>` | string | owner token, `PX` = lock TTL |

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::debug;

use crate::domain::coordination::{CoordinationError, DistributedLock, LockToken, QuorumStore};
use crate::domain::report::ExecutionReport;
use crate::domain::task::TaskId;

const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

const EXTEND_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("PEXPIRE", KEYS[1], ARGV[2])
    else
        return 0
    end
"#;

#[derive(Clone)]
pub struct RedisCoordinationStore {
    conn: ConnectionManager,
    release_script: redis::Script,
    extend_script: redis::Script,
}

impl RedisCoordinationStore {
    pub async fn connect(redis_url: &str) -> Result<Self, CoordinationError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!(redis = %redis_url, "Connected to coordination store");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            release_script: redis::Script::new(RELEASE_SCRIPT),
            extend_script: redis::Script::new(EXTEND_SCRIPT),
        }
    }
}

#[async_trait]
impl QuorumStore for RedisCoordinationStore {
    async fn record(&self, task_id: &TaskId, report: &ExecutionReport) -> Result<(), CoordinationError> {
        let payload = serde_json::to_string(report)?;
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(task_id.quorum_set_key())
            .arg(report.agent_id.as_str())
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn cardinality(&self, task_id: &TaskId) -> Result<usize, CoordinationError> {
        let mut conn = self.conn.clone();
        let len: usize = redis::cmd("HLEN")
            .arg(task_id.quorum_set_key())
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }

    async fn members(&self, task_id: &TaskId) -> Result<Vec<ExecutionReport>, CoordinationError> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = redis::cmd("HVALS")
            .arg(task_id.quorum_set_key())
            .query_async(&mut conn)
            .await?;

        values
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(CoordinationError::from))
            .collect()
    }

    async fn reset(&self, task_id: &TaskId) -> Result<(), CoordinationError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(task_id.quorum_set_key())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_quorum_target(&self, task_id: &TaskId, target: usize) -> Result<(), CoordinationError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(task_id.quorum_target_key())
            .arg(target)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn quorum_target(&self, task_id: &TaskId) -> Result<Option<usize>, CoordinationError> {
        let mut conn = self.conn.clone();
        let target: Option<usize> = redis::cmd("GET")
            .arg(task_id.quorum_target_key())
            .query_async(&mut conn)
            .await?;
        Ok(target)
    }
}

#[async_trait]
impl DistributedLock for RedisCoordinationStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>, CoordinationError> {
        let token = LockToken::new();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        Ok(result.map(|_| token))
    }

    async fn release(&self, key: &str, token: &LockToken) -> Result<bool, CoordinationError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .release_script
            .key(key)
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn extend(&self, key: &str, token: &LockToken, ttl: Duration) -> Result<bool, CoordinationError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();
        let extended: i64 = self
            .extend_script
            .key(key)
            .arg(token.as_str())
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(extended == 1)
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::{JOB_KEY_PATTERN, new_job_key};
use crate::cache::models::job::{JobRecord, JobStatus};
use crate::cache::operations::{JobStore, StoreError};

/// 基于 Redis 的任务存储，每条任务是一个带过期时间的 hash
pub struct RedisJobStore {
    redis: Arc<RedisClient>,
}

impl RedisJobStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    /// pending 状态下写入终态字段，其余状态不做修改
    async fn transition(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let status: Option<String> = conn.hget(key, "status").await?;
        if status.as_deref() != Some(JobStatus::Pending.as_str()) {
            return Ok(());
        }

        let _: () = conn.hset_multiple(key, fields).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, record: &JobRecord, ttl: Duration) -> Result<String, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let key = new_job_key();
        let _: () = conn.hset_multiple(&key, &record.to_fields()).await?;
        // 设置过期时间，worker 一直未处理的任务会被自动回收
        let _: () = conn.expire(&key, ttl.as_secs() as i64).await?;

        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<JobRecord>, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        JobRecord::from_fields(&fields)
            .map(Some)
            .ok_or_else(|| StoreError::Corrupt(key.to_string()))
    }

    async fn claim(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // HSETNX 只会成功一次，并发认领同一任务时只有一方拿到
        let claimed: bool = conn
            .hset_nx(key, "claimedAt", Utc::now().timestamp_millis())
            .await?;

        if claimed {
            // 任务可能恰好在认领前过期，此时 HSETNX 会留下只含 claimedAt 的孤儿 hash
            let has_status: bool = conn.hexists(key, "status").await?;
            if !has_status {
                let _: () = conn.del(key).await?;
                return Ok(false);
            }
        }

        Ok(claimed)
    }

    async fn complete(&self, key: &str, image_url: &str) -> Result<(), StoreError> {
        self.transition(
            key,
            &[
                ("status", JobStatus::Complete.as_str()),
                ("imageUrl", image_url),
            ],
        )
        .await
    }

    async fn fail(&self, key: &str, message: &str) -> Result<(), StoreError> {
        self.transition(key, &[("status", JobStatus::Error.as_str()), ("error", message)])
            .await
    }

    async fn job_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let keys: Vec<String> = conn.keys(JOB_KEY_PATTERN).await?;
        Ok(keys)
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::operations::{CounterStore, StoreError};

/// 基于 Redis 的速率计数存储
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
}

impl RedisCounterStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // 使用 Redis 的 INCR 和 EXPIRE 命令实现计数器
        let count: u64 = conn.incr(key, 1).await?;

        if count == 1 {
            // 窗口内首次递增，设置过期时间；后续递增不再刷新
            let _: () = conn.expire(key, window.as_secs() as i64).await?;
        }

        Ok(count)
    }
}

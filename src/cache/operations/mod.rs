use std::time::Duration;

use async_trait::async_trait;

use crate::cache::models::job::JobRecord;

// Redis 实现
pub mod job;
pub mod rate_limit;

// 进程内实现，本地开发与测试使用
pub mod memory;

pub use job::RedisJobStore;
pub use memory::MemoryStore;
pub use rate_limit::RedisCounterStore;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("corrupt record at {0}")]
    Corrupt(String),
}

/// 速率计数存储
/// incr 必须是原子操作：窗口内首次递增（0 -> 1）时设置过期时间，
/// 之后的递增不再刷新过期时间
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}

/// 生成任务存储
#[async_trait]
pub trait JobStore: Send + Sync {
    /// 写入一条新记录并设置过期时间，返回任务键
    async fn create(&self, record: &JobRecord, ttl: Duration) -> Result<String, StoreError>;

    /// 读取记录，不存在或已过期时返回 None
    async fn get(&self, key: &str) -> Result<Option<JobRecord>, StoreError>;

    /// 原子认领：每个任务只有一次认领会成功，
    /// 并发的 worker 中只有认领成功的一方继续处理
    async fn claim(&self, key: &str) -> Result<bool, StoreError>;

    /// pending -> complete，记录不存在或已处于终态时不做任何修改
    async fn complete(&self, key: &str, image_url: &str) -> Result<(), StoreError>;

    /// pending -> error，记录不存在或已处于终态时不做任何修改
    async fn fail(&self, key: &str, message: &str) -> Result<(), StoreError>;

    /// 枚举任务命名空间下的全部键（包含终态任务，由调用方过滤）
    async fn job_keys(&self) -> Result<Vec<String>, StoreError>;
}

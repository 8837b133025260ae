// 缓存模块
// 速率计数器与生成任务都存放在带过期时间的键值存储中

pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型，方便其他模块使用
pub use models::job::{JobRecord, JobStatus};
pub use operations::{CounterStore, JobStore, StoreError};

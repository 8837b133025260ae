/// 缓存键模块
/// 提供各种缓存键生成函数

// 速率限制键模块
pub mod rate_keys;

// 生成任务键模块
pub mod job_keys;

// 重新导出常用的键生成函数
pub use job_keys::{JOB_KEY_PATTERN, new_job_key};
pub use rate_keys::{GLOBAL_RATE_KEY, ip_rate_key};

use uuid::Uuid;

/// 生成任务键前缀
const JOB_KEY_PREFIX: &str = "image-job:";

/// worker 扫描任务时使用的匹配模式
pub const JOB_KEY_PATTERN: &str = "image-job:*";

/// 生成新任务键，任务 ID 即完整键名
pub fn new_job_key() -> String {
    format!("{}{}", JOB_KEY_PREFIX, Uuid::new_v4())
}

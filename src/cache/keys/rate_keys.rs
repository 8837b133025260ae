/// 按请求方 IP 计数的键前缀
const IP_RATE_PREFIX: &str = "rate:ip:";

/// 全局计数键，所有请求方共用
pub const GLOBAL_RATE_KEY: &str = "rate:global";

/// 生成请求方维度的计数键
pub fn ip_rate_key(ip: &str) -> String {
    format!("{}{}", IP_RATE_PREFIX, ip)
}

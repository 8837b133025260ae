use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub redis_url: Option<String>,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub worker_token: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_per_ip: u32,
    pub rate_limit_global: u32,
    pub rate_limit_window_secs: u64,
    pub job_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub worker_interval_secs: u64,
    pub image_size: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        // WORKER_TOKEN 为空串视为未设置（触发 worker 时不做校验）
        let worker_token = env::var("WORKER_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Config {
            redis_url: env::var("REDIS_URL").ok(),
            openai_api_key: env::var("OPENAI_API_KEY")?,
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            worker_token,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".to_string()),
            server_port: env::var("SERVER_PORT")
                .map(|v| v.parse().unwrap_or(3000))
                .unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".to_string()),
            rate_limit_per_ip: env::var("RATE_LIMIT_PER_IP")
                .map(|v| v.parse().unwrap_or(5))
                .unwrap_or(5),
            rate_limit_global: env::var("RATE_LIMIT_GLOBAL")
                .map(|v| v.parse().unwrap_or(20))
                .unwrap_or(20),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .map(|v| v.parse().unwrap_or(86_400))
                .unwrap_or(86_400),
            job_ttl_secs: env::var("JOB_TTL")
                .map(|v| v.parse().unwrap_or(3_600))
                .unwrap_or(3_600),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT")
                .map(|v| v.parse().unwrap_or(30))
                .unwrap_or(30),
            worker_interval_secs: env::var("WORKER_INTERVAL")
                .map(|v| v.parse().unwrap_or(0))
                .unwrap_or(0),
            image_size: env::var("IMAGE_SIZE").unwrap_or_else(|_| "512x512".to_string()),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

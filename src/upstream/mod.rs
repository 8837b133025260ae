use async_trait::async_trait;

pub mod openai;

pub use openai::OpenAiClient;

/// 上游生成调用错误
/// worker 把这些错误原样写进任务的 error 字段，不会向提交方抛出
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream response missing expected fields")]
    MalformedResponse,
}

/// 图像生成上游
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// 按提示词生成一张图，返回图像 URL
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// 菜谱文本生成上游
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// 根据食材列表返回菜谱文本
    async fn suggest(&self, ingredients: &str) -> Result<String, UpstreamError>;
}

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::Config;
use crate::upstream::{ImageGenerator, RecipeGenerator, UpstreamError};

/// OpenAI 客户端，图像和文本生成共用一个 HTTP 连接池
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    image_size: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            api_base: config.openai_api_base.clone(),
            image_size: config.image_size.clone(),
            timeout: config.upstream_timeout(),
        }
    }

    /// 发送请求并解析 JSON，整个往返受超时约束
    /// 超时会直接取消进行中的调用，不保留部分结果
    async fn post_json(&self, path: &str, body: Value) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.api_base, path);
        let call = async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamError::Status(status.as_u16()));
            }

            Ok(response.json::<Value>().await?)
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let body = json!({
            "prompt": prompt,
            "n": 1,
            "size": self.image_size,
        });

        let data = self.post_json("/v1/images/generations", body).await?;
        data["data"][0]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or(UpstreamError::MalformedResponse)
    }
}

#[async_trait]
impl RecipeGenerator for OpenAiClient {
    async fn suggest(&self, ingredients: &str) -> Result<String, UpstreamError> {
        let prompt = format!(
            "Give me 2 easy recipes using these ingredients: {}. \
             Include ingredients and step-by-step instructions.",
            ingredients
        );
        let body = json!({
            "model": "gpt-3.5-turbo",
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": 500,
            "temperature": 0.7,
        });

        let data = self.post_json("/v1/chat/completions", body).await?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(UpstreamError::MalformedResponse)
    }
}

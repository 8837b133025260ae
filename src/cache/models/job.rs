use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 任务状态，存储与响应中都使用小写形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Complete,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "complete" => Some(JobStatus::Complete),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    /// 终态任务不会再被 worker 处理
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

/// 生成任务缓存数据模型
/// 以 hash 形式存储，字段名与对外响应保持一致
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: JobStatus,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: i64, // Unix 毫秒时间戳
}

impl JobRecord {
    /// 创建一条待处理记录，提示词去除首尾空白
    pub fn pending(prompt: &str) -> Self {
        JobRecord {
            status: JobStatus::Pending,
            prompt: prompt.trim().to_string(),
            image_url: None,
            error: None,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// 转换为 hash 字段列表，用于整体写入
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("status".to_string(), self.status.as_str().to_string()),
            ("prompt".to_string(), self.prompt.clone()),
            ("createdAt".to_string(), self.created_at.to_string()),
        ];
        if let Some(url) = &self.image_url {
            fields.push(("imageUrl".to_string(), url.clone()));
        }
        if let Some(error) = &self.error {
            fields.push(("error".to_string(), error.clone()));
        }
        fields
    }

    /// 从 hash 字段还原记录，字段缺失或状态非法时返回 None
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let status = JobStatus::parse(fields.get("status")?)?;
        let prompt = fields.get("prompt")?.clone();
        let created_at = fields.get("createdAt")?.parse().ok()?;

        Some(JobRecord {
            status,
            prompt,
            image_url: fields.get("imageUrl").cloned(),
            error: fields.get("error").cloned(),
            created_at,
        })
    }
}

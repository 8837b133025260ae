use serde::{Deserialize, Serialize};

/// 提交生成请求
/// prompt 缺失时由 handler 统一按校验失败处理
#[derive(Debug, Deserialize)]
pub struct StartImageGenerationRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartImageGenerationResponse {
    pub job_id: String,
}

/// 状态查询参数 ?jobId=
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatusQuery {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunWorkerResponse {
    pub processed: usize,
}

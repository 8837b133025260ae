use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Json, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};

use crate::{
    AppState,
    admission::Decision,
    cache::models::job::JobRecord,
    cache::operations::JobStore as _,
    utils::{client_ip, error_body},
    worker::ImageWorker,
};

use super::model::{
    ImageStatusQuery, RunWorkerResponse, StartImageGenerationRequest,
    StartImageGenerationResponse,
};

/// 提交生成请求：校验 -> 准入 -> 写入 pending 任务，立即返回任务 ID
#[axum::debug_handler]
pub async fn start_image_generation(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<StartImageGenerationRequest>,
) -> Response {
    // 先校验后计费：非法请求不消耗任何额度
    let prompt = req.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, error_body("Prompt is required.")).into_response();
    }

    let ip = client_ip(&headers, Some(peer));

    match state.gate.admit(&ip).await {
        Ok(Decision::Admitted) => {}
        Ok(Decision::IpLimitExceeded) => {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                error_body("Daily image limit reached for this address. Try again tomorrow."),
            )
                .into_response();
        }
        Ok(Decision::GlobalLimitExceeded) => {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                error_body("Daily image capacity exhausted. Try again tomorrow."),
            )
                .into_response();
        }
        // 计数存储不可用时拒绝请求，不放行
        Err(e) => {
            tracing::error!("admission check failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, error_body("Server error"))
                .into_response();
        }
    }

    match state
        .jobs
        .create(&JobRecord::pending(&prompt), state.config.job_ttl())
        .await
    {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(StartImageGenerationResponse { job_id }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to create job: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Server error")).into_response()
        }
    }
}

/// 查询任务状态，返回完整记录，由客户端根据 status 决定继续轮询还是渲染结果
#[axum::debug_handler]
pub async fn image_status(
    State(state): State<AppState>,
    Query(query): Query<ImageStatusQuery>,
) -> Response {
    let Some(job_id) = query.job_id.filter(|id| !id.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, error_body("Missing jobId")).into_response();
    };

    match state.jobs.get(&job_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, error_body("Job not found")).into_response(),
        Err(e) => {
            tracing::error!("failed to read job {}: {}", job_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Server error")).into_response()
        }
    }
}

/// 触发一轮 worker 扫描
/// 配置了 WORKER_TOKEN 时要求携带匹配的 bearer token
#[axum::debug_handler]
pub async fn run_image_worker(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Response {
    if let Some(expected) = &state.config.worker_token {
        let supplied = bearer.as_ref().map(|TypedHeader(auth)| auth.token());
        if supplied != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, error_body("Unauthorized")).into_response();
        }
    }

    let worker = ImageWorker::new(state.jobs.clone(), state.images.clone());
    match worker.run_once().await {
        Ok(processed) => (StatusCode::OK, Json(RunWorkerResponse { processed })).into_response(),
        Err(e) => {
            tracing::error!("worker pass failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Server error")).into_response()
        }
    }
}

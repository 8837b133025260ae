use std::net::SocketAddr;

use axum::Json;
use axum::http::HeaderMap;
use serde::Serialize;

/// 统一的错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_body(message: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: message.into(),
    })
}

/// 获取请求方 IP
/// 优先读取反向代理头，退化到连接对端地址；
/// 都拿不到时归入共享的 "unknown" 额度桶
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let peer_ip = peer.map(|addr| addr.ip().to_string());

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(peer_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

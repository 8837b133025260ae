use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use imagegen_backend::{
    AppState,
    admission::AdmissionGate,
    cache::operations::{CounterStore, JobStore, MemoryStore, RedisCounterStore, RedisJobStore},
    config::Config,
    middleware::log_errors,
    routes,
    upstream::OpenAiClient,
    worker::{ImageWorker, spawn_interval},
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置存储：未配置 REDIS_URL 时退化为进程内存储（仅限本地开发）
    let (counters, jobs): (Arc<dyn CounterStore>, Arc<dyn JobStore>) = match &config.redis_url {
        Some(url) => {
            let redis_client =
                redis::Client::open(url.clone()).expect("Failed to create Redis client");
            let redis_arc = Arc::new(redis_client);
            (
                Arc::new(RedisCounterStore::new(redis_arc.clone())),
                Arc::new(RedisJobStore::new(redis_arc)),
            )
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set, using in-process store; counters will not span instances"
            );
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    };

    // 设置上游客户端，图像和菜谱共用
    let openai = Arc::new(OpenAiClient::new(reqwest::Client::new(), &config));

    // 设置应用状态
    let state = AppState {
        gate: AdmissionGate::new(counters, &config),
        jobs: jobs.clone(),
        images: openai.clone(),
        recipes: openai.clone(),
        config: config.clone(),
    };

    // 配置了 WORKER_INTERVAL 时在进程内定时跑 worker，
    // 否则只靠 /run-image-worker 外部触发
    if config.worker_interval_secs > 0 {
        let worker = ImageWorker::new(jobs, openai);
        let _ = spawn_interval(
            worker,
            std::time::Duration::from_secs(config.worker_interval_secs),
        );
        tracing::info!(
            "In-process worker scheduled every {}s",
            config.worker_interval_secs
        );
    }

    // 业务路由
    let api_routes = Router::new()
        .route(
            "/start-image-generation",
            post(routes::image::start_image_generation),
        )
        .route("/image-status", get(routes::image::image_status))
        .route("/run-image-worker", post(routes::image::run_image_worker))
        .route("/recipe", post(routes::recipe::suggest_recipes));

    let router = Router::new().nest(&config.api_base_uri.clone(), api_routes);

    // 添加日志中间件
    let router = router.layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

use std::sync::Arc;

use admission::AdmissionGate;
use cache::operations::JobStore;
use config::Config;
use upstream::{ImageGenerator, RecipeGenerator};

pub mod admission;
pub mod cache;
pub mod config;
pub mod middleware;
pub mod routes;
pub mod upstream;
pub mod utils;
pub mod worker;

/// 请求处理路径不持有进程内可变状态，
/// 提交、查询与 worker 之间只通过存储协调
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gate: AdmissionGate,
    pub jobs: Arc<dyn JobStore>,
    pub images: Arc<dyn ImageGenerator>,
    pub recipes: Arc<dyn RecipeGenerator>,
}

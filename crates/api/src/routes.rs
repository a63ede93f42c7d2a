use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers::{
    control::{get_verbosity, reset_metrics, set_verbosity},
    health::{get_status, health_check},
    metrics::get_metrics,
    process::process_batch,
};
use crate::service::ProcessingService;

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProcessingService>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 数据处理
        .route("/process", post(process_batch))
        // 健康检查与负载
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics))
        // 运行期控制
        .route("/verbosity", get(get_verbosity).post(set_verbosity))
        .route("/reset", post(reset_metrics))
        .with_state(state)
}

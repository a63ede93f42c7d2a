//! # FIFO Processing Service
//!
//! 接收分发器发来的数据点，模拟处理耗时与随机失败，并跟踪并发与累计指标。
//!
//! ## API 端点
//!
//! - `POST /process` - 处理一批数据点
//! - `GET /health` - 存活检查与当前并发数
//! - `GET /status` - 并发数、容量、利用率与过载标记
//! - `GET /metrics` - 累计指标快照
//! - `GET /verbosity` / `POST /verbosity` - 查询或设置日志级别
//! - `POST /reset` - 清零累计指标
//!
//! ## 状态
//!
//! 所有可变状态都归 [`ProcessingService`] 所有：
//! - 并发计数：请求进入时加一，守卫析构时减一
//! - 累计指标：计数器、响应时间窗口（1000）、批次记录窗口（100），由同一把锁保护
//! - 指标快照：每个请求结束后整体重写，写入经临时文件再重命名
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fifo_api::{create_app, ProcessingService};
//! use fifo_core::ServiceConfig;
//!
//! # async fn run() -> std::io::Result<()> {
//! let config = ServiceConfig::default();
//! let service = Arc::new(ProcessingService::new(&config));
//! let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
//! axum::serve(listener, create_app(service)).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod concurrency;
pub mod error;
pub mod failure;
pub mod handlers;
pub mod middleware;
pub mod persistence;
pub mod routes;
pub mod service;
pub mod verbosity;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

pub use aggregator::{CycleRecord, MetricsAggregator, MetricsSnapshot, PersistedMetrics};
pub use concurrency::{ConcurrencyTracker, InFlightGuard};
pub use error::{ApiError, ApiResult};
pub use failure::{FailureInjector, RandomFailure};
pub use persistence::SnapshotStore;
pub use service::{HealthReport, ProcessingService, StatusReport, SIMULATED_FAILURE};
pub use verbosity::{VerbosityControl, VerbosityHook};

/// 创建完整的API应用
pub fn create_app(service: Arc<ProcessingService>) -> Router {
    let state = AppState { service };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}

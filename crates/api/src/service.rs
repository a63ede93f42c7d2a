use std::sync::Arc;
use std::time::{Duration, Instant};

use fifo_core::{ProcessRequest, ProcessResponse, ServiceConfig, Verbosity};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::{CycleRecord, MetricsAggregator, MetricsSnapshot};
use crate::concurrency::ConcurrencyTracker;
use crate::error::{ApiError, ApiResult};
use crate::failure::{FailureInjector, RandomFailure};
use crate::persistence::SnapshotStore;
use crate::verbosity::{VerbosityControl, VerbosityHook};

pub const SIMULATED_FAILURE: &str = "Simulated processing failure";

/// 健康检查结果
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: f64,
    pub server_time: String,
    pub concurrent_requests: usize,
}

/// 负载状态
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub concurrent_requests: usize,
    pub max_threads: usize,
    pub utilization_percent: f64,
    pub overloaded: bool,
    pub status: &'static str,
    pub timestamp: f64,
    pub server_time: String,
}

/// 处理服务
///
/// 持有并发计数、累计指标、快照文件、失败注入和日志级别。
/// 所有可变状态只能通过这里的方法修改。
pub struct ProcessingService {
    concurrency: Arc<ConcurrencyTracker>,
    metrics: MetricsAggregator,
    snapshots: SnapshotStore,
    failure: Box<dyn FailureInjector>,
    verbosity: VerbosityControl,
    capacity: usize,
    processing_delay: Duration,
}

impl ProcessingService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            concurrency: Arc::new(ConcurrencyTracker::new()),
            metrics: MetricsAggregator::new(config.response_time_window, config.cycle_window),
            snapshots: SnapshotStore::new(&config.metrics_file),
            failure: Box::new(RandomFailure::new(config.failure_probability)),
            verbosity: VerbosityControl::new(config.verbosity),
            capacity: config.capacity,
            processing_delay: config.processing_delay(),
        }
    }

    pub fn with_failure_injector(mut self, injector: impl FailureInjector + 'static) -> Self {
        self.failure = Box::new(injector);
        self
    }

    /// 安装日志级别回调
    ///
    /// `apply_now` 为 `false` 时保留启动时已生效的过滤器（例如命令行显式指定的级别），
    /// 直到第一次通过 `/verbosity` 调整。
    pub fn with_verbosity_hook(mut self, hook: VerbosityHook, apply_now: bool) -> Self {
        self.verbosity = if apply_now {
            self.verbosity.with_hook(hook)
        } else {
            self.verbosity.with_deferred_hook(hook)
        };
        self
    }

    /// 处理一批数据点
    ///
    /// 进入时登记并发计数，读数即本请求的 `concurrent_requests`。
    /// 计数在所有路径上都会归还，包括请求体无效和调用方中途断开。
    pub async fn handle_request(
        &self,
        payload: ApiResult<ProcessRequest>,
    ) -> ApiResult<ProcessResponse> {
        let in_flight = self.concurrency.enter();
        let current = in_flight.reading();
        let request_start = Instant::now();

        let request = payload?;
        validate_request(&request)?;

        info!(
            "[REQUEST START] {} - 收到 {} 个数据点: {:?} - 并发请求数: {}",
            server_time(),
            request.len(),
            request.ids(),
            current
        );
        for point in &request.points {
            debug!(
                "数据点 {} (第 {} 次尝试): {}",
                point.id, point.attempts, point.data
            );
        }

        let processing_start = Instant::now();
        tokio::time::sleep(self.processing_delay).await;
        let processing_time = processing_start.elapsed().as_secs_f64();

        if self.failure.should_fail(&request) {
            let total_time = request_start.elapsed().as_secs_f64();
            self.metrics.record_failure(total_time);
            self.persist_snapshot().await;
            warn!(
                "[REQUEST FAILED] 数据点 {:?} 模拟处理失败 - 耗时: {:.3}s - 并发请求数: {}",
                request.ids(),
                total_time,
                current
            );
            return Err(ApiError::ProcessingFailed {
                message: SIMULATED_FAILURE.to_string(),
                concurrent_requests: current,
            });
        }

        let total_time = request_start.elapsed().as_secs_f64();
        self.metrics.record_success(CycleRecord::new(
            request.len(),
            processing_time,
            total_time,
            current,
        ));
        self.persist_snapshot().await;
        info!(
            "[REQUEST SUCCESS] 处理了 {} 个数据点 - 处理耗时: {:.3}s - 总耗时: {:.3}s - 并发请求数: {}",
            request.len(),
            processing_time,
            total_time,
            current
        );

        Ok(ProcessResponse::succeeded(
            request.len(),
            processing_time,
            total_time,
            current,
        ))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.concurrency.current())
    }

    /// 清零累计指标，在途请求不受影响
    pub async fn reset(&self) {
        self.metrics.reset();
        info!("指标已重置");
        self.persist_snapshot().await;
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity.get()
    }

    pub fn set_verbosity(&self, level: Verbosity) -> ApiResult<()> {
        Ok(self.verbosity.set(level)?)
    }

    pub fn current_concurrency(&self) -> usize {
        self.concurrency.current()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            timestamp: unix_timestamp(),
            server_time: server_time(),
            concurrent_requests: self.concurrency.current(),
        }
    }

    pub fn status(&self) -> StatusReport {
        let current = self.concurrency.current();
        let overloaded = current > self.capacity;
        let utilization_percent = if self.capacity == 0 {
            0.0
        } else {
            (current as f64 / self.capacity as f64 * 1000.0).round() / 10.0
        };

        StatusReport {
            concurrent_requests: current,
            max_threads: self.capacity,
            utilization_percent,
            overloaded,
            status: if overloaded { "overloaded" } else { "healthy" },
            timestamp: unix_timestamp(),
            server_time: server_time(),
        }
    }

    async fn persist_snapshot(&self) {
        if let Err(e) = self.snapshots.persist(&self.metrics).await {
            warn!(
                "保存指标快照到 {} 失败: {}",
                self.snapshots.path().display(),
                e
            );
        }
    }
}

impl std::fmt::Debug for ProcessingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingService")
            .field("concurrency", &self.concurrency.current())
            .field("capacity", &self.capacity)
            .field("processing_delay", &self.processing_delay)
            .field("verbosity", &self.verbosity.get())
            .finish()
    }
}

fn validate_request(request: &ProcessRequest) -> ApiResult<()> {
    if request.is_empty() {
        return Err(ApiError::Validation("points不能为空".to_string()));
    }
    if request.points.iter().any(|point| point.id.is_empty()) {
        return Err(ApiError::Validation("数据点id不能为空".to_string()));
    }
    Ok(())
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn server_time() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

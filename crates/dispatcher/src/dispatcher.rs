use std::sync::Arc;
use std::time::Duration;

use fifo_core::{DispatcherConfig, FifoError, WorkItem};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::backlog::Backlog;
use crate::client::ProcessingClient;
use crate::metrics::DispatchMetrics;
use crate::work_source::WorkSource;

/// 分发参数，运行期间不可变
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSettings {
    /// 同时在途的最大请求数
    pub max_concurrent: usize,
    /// 每个工作项最多重新分发的次数
    pub max_retries: u32,
    pub request_timeout: Duration,
    /// 重试请求发出前的等待时间
    pub retry_delay: Duration,
}

impl From<&DispatcherConfig> for DispatchSettings {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_requests,
            max_retries: config.max_retries,
            request_timeout: config.request_timeout(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// 单次尝试的结果，每次尝试只会落入其中一种
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Succeeded {
        id: String,
        attempts: u32,
        processed_count: usize,
    },
    /// 失败但仍有重试额度，已追加到重试队列
    Requeued { id: String, retry_count: u32 },
    /// 重试额度耗尽
    Exhausted {
        id: String,
        attempts: u32,
        error: String,
    },
    /// 请求被处理服务拒绝，不重试
    Rejected { id: String, error: String },
}

impl AttemptOutcome {
    pub fn id(&self) -> &str {
        match self {
            AttemptOutcome::Succeeded { id, .. }
            | AttemptOutcome::Requeued { id, .. }
            | AttemptOutcome::Exhausted { id, .. }
            | AttemptOutcome::Rejected { id, .. } => id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptOutcome::Requeued { .. })
    }
}

/// 周期汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub total_items: usize,
    pub successful: usize,
    pub permanently_failed: usize,
    pub retries: usize,
    pub processed_count: usize,
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

impl CycleReport {
    fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Succeeded {
                processed_count, ..
            } => {
                self.successful += 1;
                self.processed_count += processed_count;
            }
            AttemptOutcome::Requeued { .. } => self.retries += 1,
            AttemptOutcome::Exhausted { .. } | AttemptOutcome::Rejected { .. } => {
                self.permanently_failed += 1
            }
        }
    }

    /// 每个工作项都到达了唯一的终态
    pub fn is_complete(&self) -> bool {
        self.successful + self.permanently_failed == self.total_items
    }

    pub fn success_rate(&self) -> f64 {
        let finished = self.successful + self.permanently_failed;
        if finished == 0 {
            0.0
        } else {
            self.successful as f64 / finished as f64 * 100.0
        }
    }
}

/// 有界并发分发器
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn ProcessingClient>,
    settings: DispatchSettings,
    metrics: DispatchMetrics,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn ProcessingClient>, settings: DispatchSettings) -> Self {
        Self {
            client,
            settings,
            metrics: DispatchMetrics::new(),
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// 运行一个完整周期：待处理数据耗尽、重试队列为空且没有在途请求时结束
    ///
    /// 每当一个尝试完成就立即释放其并发名额，再按“重试优先、新数据其次”的顺序补位。
    /// 单个工作项的失败不会中断周期。
    pub async fn run_cycle(&self, backlog: &Backlog) -> CycleReport {
        let started = Instant::now();
        let source = Arc::new(WorkSource::from_backlog(backlog));
        let mut report = CycleReport::new(backlog.len());
        let mut in_flight = JoinSet::new();

        info!(
            "开始处理 {} 条数据，最大并发请求数={}，超时={:?}，最大重试次数={}",
            backlog.len(),
            self.settings.max_concurrent,
            self.settings.request_timeout,
            self.settings.max_retries
        );

        loop {
            while in_flight.len() < self.settings.max_concurrent {
                let Some(admission) = source.pop() else {
                    break;
                };

                let is_retry = admission.is_retry();
                let item = admission.into_item();
                if is_retry {
                    debug!("开始重试数据点 {} (第 {} 次尝试)", item.id, item.attempt());
                } else {
                    debug!("开始新请求: 数据点 {}", item.id);
                }

                let dispatcher = self.clone();
                let source = Arc::clone(&source);
                in_flight.spawn(async move { dispatcher.dispatch_one(item, &source).await });
            }

            report.peak_in_flight = report.peak_in_flight.max(in_flight.len());
            self.metrics.set_in_flight(in_flight.len());

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    // 任务异常退出时无法再追踪该工作项，按永久失败计入
                    error!("分发任务异常退出: {}", e);
                    self.metrics.record_permanent_failure();
                    report.permanently_failed += 1;
                }
            }

            debug!(
                "活动请求: {}, 剩余: {}, 待重试: {}",
                in_flight.len(),
                source.remaining_fresh(),
                source.pending_retries()
            );
        }

        self.metrics.set_in_flight(0);
        report.elapsed = started.elapsed();
        self.metrics.record_cycle(report.elapsed);

        info!(
            "处理完成！最终统计: {} 成功, {} 失败, 重试 {} 次, 成功率: {:.1}%",
            report.successful,
            report.permanently_failed,
            report.retries,
            report.success_rate()
        );

        report
    }

    /// 发送一个工作项并决定其去向：成功、重新入队或永久失败
    pub async fn dispatch_one(&self, mut item: WorkItem, source: &WorkSource) -> AttemptOutcome {
        if item.is_retry() && !self.settings.retry_delay.is_zero() {
            tokio::time::sleep(self.settings.retry_delay).await;
        }

        self.metrics.record_attempt();
        let attempts = item.attempt();

        let result = match tokio::time::timeout(
            self.settings.request_timeout,
            self.client.process(&item),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FifoError::Timeout {
                timeout_ms: self.settings.request_timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(response) => {
                self.metrics.record_success();
                debug!(
                    "数据点 {} 处理成功, processed={}, concurrent={}",
                    item.id, response.processed_count, response.concurrent_requests
                );
                AttemptOutcome::Succeeded {
                    id: item.id,
                    attempts,
                    processed_count: response.processed_count,
                }
            }
            Err(error) if !error.is_retryable() => {
                self.metrics.record_permanent_failure();
                warn!("数据点 {} 被拒绝，不再重试: {}", item.id, error);
                AttemptOutcome::Rejected {
                    id: item.id,
                    error: error.to_string(),
                }
            }
            Err(error) if item.retry_count < self.settings.max_retries => {
                item.retry_count += 1;
                self.metrics.record_retry();
                info!(
                    "数据点 {} 失败 ({})，安排第 {} 次重试",
                    item.id, error, item.retry_count
                );
                let outcome = AttemptOutcome::Requeued {
                    id: item.id.clone(),
                    retry_count: item.retry_count,
                };
                source.requeue(item);
                outcome
            }
            Err(error) => {
                self.metrics.record_permanent_failure();
                warn!(
                    "数据点 {} 超过最大重试次数 {}，放弃: {}",
                    item.id, self.settings.max_retries, error
                );
                AttemptOutcome::Exhausted {
                    id: item.id,
                    attempts,
                    error: error.to_string(),
                }
            }
        }
    }
}

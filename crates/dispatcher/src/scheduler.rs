use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::info;

use crate::backlog::Backlog;
use crate::dispatcher::Dispatcher;

/// 周期调度器：运行完一个周期后，等待剩余的间隔时间再开始下一个周期
///
/// 周期之间不会重叠；耗时超过间隔的周期结束后立即开始下一个，不补偿错过的周期。
pub struct CycleScheduler {
    dispatcher: Dispatcher,
    backlog: Arc<Backlog>,
    interval: Duration,
}

impl CycleScheduler {
    pub fn new(dispatcher: Dispatcher, backlog: Arc<Backlog>, interval: Duration) -> Self {
        Self {
            dispatcher,
            backlog,
            interval,
        }
    }

    /// 持续运行直到收到关闭信号，返回完成的周期数
    ///
    /// 关闭信号只在周期之间的等待阶段处理。
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> u64 {
        let mut completed = 0u64;

        loop {
            let started = Instant::now();
            info!("开始第 {} 个周期...", completed + 1);

            let report = self.dispatcher.run_cycle(&self.backlog).await;
            completed += 1;

            let elapsed = started.elapsed();
            let wait = next_wait(self.interval, elapsed);
            info!(
                "周期完成 ({} 成功, {} 失败)，耗时 {:.2}s，等待 {:.2}s...",
                report.successful,
                report.permanently_failed,
                elapsed.as_secs_f64(),
                wait.as_secs_f64()
            );

            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("调度器循环收到关闭信号");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        completed
    }
}

/// 下一个周期开始前需要等待的时间：`max(0, interval - elapsed)`
pub fn next_wait(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

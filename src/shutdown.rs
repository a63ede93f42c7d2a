use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

/// 应用任务的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// 没有收到关闭信号，应用自行结束
    Finished,
    /// 收到关闭信号后在宽限期内停止
    Graceful,
    /// 宽限期内没有停止，任务已被中止
    TimedOut,
}

/// 关闭协调器
///
/// 分发器和处理服务都订阅同一个广播通道。分发器只在周期间的等待中响应信号，
/// 处理服务则停止接受新连接并等待在途请求结束，所以需要一个宽限期兜底。
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            grace_period,
        }
    }

    /// 订阅关闭信号，须在 [`supervise`](Self::supervise) 之前完成
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// 监督应用任务直到它结束
    ///
    /// 应用先结束时直接返回它的结果；`signal` 先完成时广播关闭信号，
    /// 在宽限期内等待应用停止，超时则中止任务。
    pub async fn supervise<S>(
        &self,
        mut app: JoinHandle<Result<()>>,
        signal: S,
    ) -> Result<ShutdownOutcome>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = &mut app => {
                flatten(result)?;
                info!("应用已退出");
                return Ok(ShutdownOutcome::Finished);
            }
            _ = signal => {
                info!("收到关闭信号，开始优雅关闭...");
            }
        }

        let receivers = self.shutdown_tx.send(()).unwrap_or(0);
        info!("关闭信号已发送给 {} 个订阅者", receivers);

        match tokio::time::timeout(self.grace_period, &mut app).await {
            Ok(result) => {
                flatten(result)?;
                info!("应用已优雅关闭");
                Ok(ShutdownOutcome::Graceful)
            }
            Err(_) => {
                warn!("应用在 {:?} 内未能停止，强制退出", self.grace_period);
                app.abort();
                Ok(ShutdownOutcome::TimedOut)
            }
        }
    }
}

fn flatten(result: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    result.map_err(|e| anyhow!("应用任务异常退出: {e}"))?
}

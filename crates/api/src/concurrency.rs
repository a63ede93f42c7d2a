use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

/// 在途请求计数器
///
/// 每个请求进入时加一，离开时（无论成功、失败还是被取消）减一。
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    current: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个进入的请求，返回的守卫在析构时归还计数
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        let reading = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        InFlightGuard {
            tracker: Arc::clone(self),
            reading,
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

/// 单个请求的在途凭证
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: Arc<ConcurrencyTracker>,
    reading: usize,
}

impl InFlightGuard {
    /// 进入时读取到的并发数（包含本请求）
    pub fn reading(&self) -> usize {
        self.reading
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let remaining = self.tracker.current.fetch_sub(1, Ordering::SeqCst) - 1;
        info!("[REQUEST END] 剩余并发请求数: {}", remaining);
    }
}

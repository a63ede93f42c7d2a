//! 分发器指标
//!
//! 使用 `metrics` crate 的全局记录器；未安装导出器时所有记录都是空操作。

use std::time::Duration;

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};

/// 分发器指标收集器
#[derive(Clone)]
pub struct DispatchMetrics {
    attempts_total: Counter,
    successes_total: Counter,
    retries_total: Counter,
    permanent_failures_total: Counter,
    in_flight: Gauge,
    cycle_duration: Histogram,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            attempts_total: counter!("fifo_dispatch_attempts_total"),
            successes_total: counter!("fifo_dispatch_successes_total"),
            retries_total: counter!("fifo_dispatch_retries_total"),
            permanent_failures_total: counter!("fifo_dispatch_permanent_failures_total"),
            in_flight: gauge!("fifo_dispatch_in_flight"),
            cycle_duration: histogram!("fifo_dispatch_cycle_duration_seconds"),
        }
    }

    pub fn record_attempt(&self) {
        self.attempts_total.increment(1);
    }

    pub fn record_success(&self) {
        self.successes_total.increment(1);
    }

    pub fn record_retry(&self) {
        self.retries_total.increment(1);
    }

    pub fn record_permanent_failure(&self) {
        self.permanent_failures_total.increment(1);
    }

    pub fn set_in_flight(&self, count: usize) {
        self.in_flight.set(count as f64);
    }

    pub fn record_cycle(&self, elapsed: Duration) {
        self.cycle_duration.record(elapsed.as_secs_f64());
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

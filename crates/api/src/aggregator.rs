use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次成功处理的批次记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub timestamp: DateTime<Utc>,
    pub item_count: usize,
    pub processing_time: f64,
    pub total_time: f64,
    pub concurrent_requests: usize,
}

impl CycleRecord {
    pub fn new(
        item_count: usize,
        processing_time: f64,
        total_time: f64,
        concurrent_requests: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            item_count,
            processing_time,
            total_time,
            concurrent_requests,
        }
    }
}

/// `GET /metrics` 返回的实时快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: f64,
    pub start_time: DateTime<Utc>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub throughput_per_minute: f64,
    pub average_response_time: f64,
    pub current_concurrency: usize,
    pub recent_cycles: usize,
}

/// 写入指标文件的持久化内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMetrics {
    pub start_time: DateTime<Utc>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: f64,
    pub cycles: Vec<CycleRecord>,
}

#[derive(Debug)]
struct MetricsState {
    start_time: DateTime<Utc>,
    started: Instant,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    response_times: VecDeque<f64>,
    cycles: VecDeque<CycleRecord>,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            start_time: Utc::now(),
            started: Instant::now(),
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            response_times: VecDeque::new(),
            cycles: VecDeque::new(),
        }
    }

    fn average_response_time(&self) -> f64 {
        if self.response_times.is_empty() {
            0.0
        } else {
            self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
        }
    }
}

/// 处理服务的累计指标
///
/// 所有字段只在持有内部锁时修改，对外读取同样经过该锁，
/// 派生值（成功率、吞吐量、平均响应时间）每次从锁内状态重新计算。
#[derive(Debug)]
pub struct MetricsAggregator {
    state: Mutex<MetricsState>,
    response_time_window: usize,
    cycle_window: usize,
}

impl MetricsAggregator {
    pub fn new(response_time_window: usize, cycle_window: usize) -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
            response_time_window: response_time_window.max(1),
            cycle_window: cycle_window.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_failure(&self, response_time: f64) {
        let mut state = self.lock();
        state.total_requests += 1;
        state.failed_requests += 1;
        push_bounded(&mut state.response_times, response_time, self.response_time_window);
    }

    pub fn record_success(&self, record: CycleRecord) {
        let mut state = self.lock();
        state.total_requests += 1;
        state.successful_requests += 1;
        push_bounded(
            &mut state.response_times,
            record.total_time,
            self.response_time_window,
        );
        push_bounded(&mut state.cycles, record, self.cycle_window);
    }

    pub fn snapshot(&self, current_concurrency: usize) -> MetricsSnapshot {
        let state = self.lock();
        let uptime_seconds = state.started.elapsed().as_secs_f64();

        let success_rate = if state.total_requests == 0 {
            0.0
        } else {
            state.successful_requests as f64 / state.total_requests as f64 * 100.0
        };

        let elapsed_minutes = uptime_seconds / 60.0;
        let throughput_per_minute = if elapsed_minutes > 0.0 {
            state.successful_requests as f64 / elapsed_minutes
        } else {
            0.0
        };

        MetricsSnapshot {
            uptime_seconds,
            start_time: state.start_time,
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            success_rate,
            throughput_per_minute,
            average_response_time: state.average_response_time(),
            current_concurrency,
            recent_cycles: state.cycles.len(),
        }
    }

    pub fn persisted(&self) -> PersistedMetrics {
        let state = self.lock();
        PersistedMetrics {
            start_time: state.start_time,
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            average_response_time: state.average_response_time(),
            cycles: state.cycles.iter().cloned().collect(),
        }
    }

    /// 清零累计计数与滑动窗口，并把起始时间重置为当前时间
    pub fn reset(&self) {
        *self.lock() = MetricsState::new();
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T, capacity: usize) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(value);
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::Verbosity;

/// 分发器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub service_url: String,
    pub max_concurrent_requests: usize,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub interval_seconds: u64,
    pub backlog_path: String,
    pub backlog_limit: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_url: "http://localhost:8000/process".to_string(),
            max_concurrent_requests: 50,
            request_timeout_seconds: 15,
            max_retries: 3,
            retry_delay_ms: 2000,
            interval_seconds: 900, // 15分钟
            backlog_path: "points_data.csv".to_string(),
            backlog_limit: Some(35_000),
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_url.is_empty() {
            return Err(anyhow::anyhow!("处理服务地址不能为空"));
        }

        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err(anyhow::anyhow!("处理服务地址格式无效: {}", self.service_url));
        }

        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("最大并发请求数必须大于0"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        if self.interval_seconds == 0 {
            return Err(anyhow::anyhow!("运行间隔必须大于0"));
        }

        if self.backlog_path.is_empty() {
            return Err(anyhow::anyhow!("待处理数据文件路径不能为空"));
        }

        if self.backlog_limit == Some(0) {
            return Err(anyhow::anyhow!("待处理数据条数上限必须大于0"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// 处理服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub enabled: bool,
    pub bind_address: String,
    /// 声明的处理能力（最大并发请求数），用于状态探针
    pub capacity: usize,
    pub processing_delay_ms: u64,
    pub failure_probability: f64,
    pub metrics_file: String,
    pub verbosity: Verbosity,
    pub response_time_window: usize,
    pub cycle_window: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8000".to_string(),
            capacity: 50,
            processing_delay_ms: 2000,
            failure_probability: 0.02,
            metrics_file: "metrics.json".to_string(),
            verbosity: Verbosity::Info,
            response_time_window: 1000,
            cycle_window: 100,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("绑定地址不能为空"));
        }

        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("绑定地址格式无效: {}", self.bind_address));
        }

        if self.capacity == 0 {
            return Err(anyhow::anyhow!("服务处理能力必须大于0"));
        }

        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(anyhow::anyhow!(
                "失败概率必须在0.0到1.0之间: {}",
                self.failure_probability
            ));
        }

        if self.metrics_file.is_empty() {
            return Err(anyhow::anyhow!("指标快照文件路径不能为空"));
        }

        if self.response_time_window == 0 || self.cycle_window == 0 {
            return Err(anyhow::anyhow!("滚动窗口容量必须大于0"));
        }

        Ok(())
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

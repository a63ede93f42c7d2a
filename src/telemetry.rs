use std::net::SocketAddr;

use anyhow::{Context, Result};
use fifo_api::VerbosityHook;
use fifo_core::{ObservabilityConfig, Verbosity};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// 运行期替换日志过滤器的句柄
pub type LogReloadHandle = reload::Handle<EnvFilter, Registry>;

/// 初始化日志系统，返回可在运行期调整过滤级别的句柄
pub fn init_logging(log_level: &str, log_format: &str) -> Result<LogReloadHandle> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let (filter_layer, reload_handle) = reload::Layer::new(env_filter);

    let registry = tracing_subscriber::registry().with(filter_layer);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(reload_handle)
}

/// 把处理服务的日志级别映射到全局日志过滤器
pub fn verbosity_hook(handle: LogReloadHandle) -> VerbosityHook {
    Box::new(move |level: Verbosity| {
        handle
            .reload(EnvFilter::new(level.filter_directive()))
            .map_err(|e| e.to_string())
    })
}

/// 配置了监听地址时安装Prometheus指标导出器
pub fn install_metrics_exporter(config: &ObservabilityConfig) -> Result<()> {
    let Some(address) = &config.metrics_listen_address else {
        return Ok(());
    };

    let addr: SocketAddr = address
        .parse()
        .with_context(|| format!("指标导出地址格式无效: {address}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("安装Prometheus指标导出器失败")?;

    info!("Prometheus指标导出器监听在 http://{}/metrics", addr);
    Ok(())
}

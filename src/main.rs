use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use fifo_core::AppConfig;
use fifo_processor::{
    app::{AppMode, Application},
    shutdown::{ShutdownCoordinator, ShutdownOutcome},
    telemetry::{init_logging, install_metrics_exporter},
};
use tokio::signal;
use tracing::{info, warn};

/// 收到关闭信号后等待应用停止的最长时间
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("fifo-processor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("FIFO工作项分发器与并发跟踪处理服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（默认依次查找 config/fifo.toml、fifo.toml、/etc/fifo/config.toml）"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("运行模式")
                .value_parser(["dispatcher", "service", "all"])
                .default_value("all"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别（覆盖配置文件）")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式（覆盖配置文件）")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");
    let mode_str = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("all");

    // 加载配置
    let config = AppConfig::load(config_path.map(String::as_str)).with_context(|| {
        format!(
            "加载配置失败: {}",
            config_path.map(String::as_str).unwrap_or("<默认路径>")
        )
    })?;

    // 初始化日志系统
    let explicit_log_level = matches.contains_id("log-level");
    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.observability.log_level);
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.observability.log_format);
    let log_handle = init_logging(log_level, log_format)?;

    info!("启动FIFO处理系统");
    info!("运行模式: {mode_str}");

    install_metrics_exporter(&config.observability)?;

    // 解析运行模式
    let app_mode = AppMode::parse(mode_str, &config)?;

    let app = Application::new(config, app_mode)
        .with_log_reload(log_handle, explicit_log_level);

    // 启动应用，由关闭协调器负责信号处理和宽限期
    let coordinator = ShutdownCoordinator::new(SHUTDOWN_GRACE_PERIOD);
    let shutdown_rx = coordinator.subscribe();
    let app_handle = tokio::spawn(async move { app.run(shutdown_rx).await });

    if coordinator
        .supervise(app_handle, wait_for_shutdown_signal())
        .await?
        == ShutdownOutcome::TimedOut
    {
        warn!("宽限期内未完成的在途工作已被放弃");
    }

    info!("FIFO处理系统已退出");
    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("安装Ctrl+C信号处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("安装SIGTERM信号处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

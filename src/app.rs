use std::sync::Arc;

use anyhow::{Context, Result};
use fifo_api::{create_app, ProcessingService};
use fifo_core::AppConfig;
use fifo_dispatcher::{
    Backlog, CycleScheduler, DispatchSettings, Dispatcher, HttpProcessingClient,
};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

use crate::telemetry::{verbosity_hook, LogReloadHandle};

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 仅运行分发器
    Dispatcher,
    /// 仅运行处理服务
    Service,
    /// 运行所有组件
    All,
}

impl AppMode {
    /// 解析命令行给出的运行模式，并检查对应组件是否启用
    pub fn parse(mode_str: &str, config: &AppConfig) -> Result<Self> {
        match mode_str {
            "dispatcher" => {
                if !config.dispatcher.enabled {
                    return Err(anyhow::anyhow!("Dispatcher模式被禁用，请检查配置"));
                }
                Ok(AppMode::Dispatcher)
            }
            "service" => {
                if !config.service.enabled {
                    return Err(anyhow::anyhow!("处理服务模式被禁用，请检查配置"));
                }
                Ok(AppMode::Service)
            }
            "all" => Ok(AppMode::All),
            _ => Err(anyhow::anyhow!("不支持的运行模式: {mode_str}")),
        }
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    log_handle: Option<LogReloadHandle>,
    /// 命令行显式指定了日志级别，启动时不用服务配置的级别覆盖它
    keep_startup_filter: bool,
}

impl Application {
    pub fn new(config: AppConfig, mode: AppMode) -> Self {
        info!("初始化应用程序，模式: {:?}", mode);
        Self {
            config,
            mode,
            log_handle: None,
            keep_startup_filter: false,
        }
    }

    /// 让处理服务的日志级别控制接管全局日志过滤器
    ///
    /// `keep_startup_filter` 为 `true` 时保留启动时的过滤器，直到第一次调用 `/verbosity`。
    pub fn with_log_reload(mut self, handle: LogReloadHandle, keep_startup_filter: bool) -> Self {
        self.log_handle = Some(handle);
        self.keep_startup_filter = keep_startup_filter;
        self
    }

    /// 运行应用程序
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        match self.mode {
            AppMode::Dispatcher => self.run_dispatcher(shutdown_rx).await,
            AppMode::Service => self.run_service(shutdown_rx).await,
            AppMode::All => self.run_all_components(shutdown_rx).await,
        }
    }

    /// 运行分发器：加载待处理数据后按固定间隔重复处理
    async fn run_dispatcher(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let config = &self.config.dispatcher;
        info!("启动Dispatcher，处理服务地址: {}", config.service_url);

        let backlog = Backlog::from_csv_path(&config.backlog_path, config.backlog_limit)
            .with_context(|| format!("加载待处理数据失败: {}", config.backlog_path))?;
        if backlog.is_empty() {
            warn!("{} 中没有待处理的数据", config.backlog_path);
        }

        let client = HttpProcessingClient::new(&config.service_url, config.request_timeout())
            .context("创建处理服务客户端失败")?;
        let dispatcher = Dispatcher::new(Arc::new(client), DispatchSettings::from(config));
        let scheduler = CycleScheduler::new(dispatcher, Arc::new(backlog), config.interval());

        let completed = scheduler.run(shutdown_rx).await;

        info!("Dispatcher已停止，共完成 {} 个周期", completed);
        Ok(())
    }

    /// 运行处理服务，收到关闭信号后停止接受新连接并等待在途请求结束
    async fn run_service(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let config = &self.config.service;
        info!("启动处理服务: {}", config.bind_address);

        let mut service = ProcessingService::new(config);
        if let Some(handle) = &self.log_handle {
            if self.keep_startup_filter {
                info!(
                    "命令行已指定日志级别，配置的处理服务级别 {} 暂不生效",
                    config.verbosity
                );
            }
            service = service
                .with_verbosity_hook(verbosity_hook(handle.clone()), !self.keep_startup_filter);
        }
        if let Ok(Some(previous)) = service.snapshot_store().load().await {
            info!(
                "上次运行的指标快照: 总请求数 {}, 成功 {}, 失败 {}",
                previous.total_requests, previous.successful_requests, previous.failed_requests
            );
        }

        let app = create_app(Arc::new(service));
        let listener = TcpListener::bind(&config.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", config.bind_address))?;

        info!(
            "处理服务启动在 http://{}，容量 {}，处理延迟 {}ms，失败概率 {}",
            config.bind_address,
            config.capacity,
            config.processing_delay_ms,
            config.failure_probability
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("处理服务收到关闭信号");
            })
            .await
            .context("处理服务运行失败")?;

        info!("处理服务已停止");
        Ok(())
    }

    /// 同时运行处理服务和分发器，任一组件失败时停止另一个并返回错误
    async fn run_all_components(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动所有组件");

        let service = async {
            if self.config.service.enabled {
                self.run_service(shutdown_rx.resubscribe())
                    .await
                    .context("处理服务运行失败")
            } else {
                Ok(())
            }
        };

        let dispatcher = async {
            if self.config.dispatcher.enabled {
                self.run_dispatcher(shutdown_rx.resubscribe())
                    .await
                    .context("Dispatcher运行失败")
            } else {
                Ok(())
            }
        };

        if let Err(e) = tokio::try_join!(service, dispatcher) {
            error!("组件运行失败: {:#}", e);
            return Err(e);
        }

        info!("所有组件已停止");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_mode() {
        let config = AppConfig::default();
        assert_eq!(
            AppMode::parse("dispatcher", &config).unwrap(),
            AppMode::Dispatcher
        );
        assert_eq!(AppMode::parse("service", &config).unwrap(), AppMode::Service);
        assert_eq!(AppMode::parse("all", &config).unwrap(), AppMode::All);
        assert!(AppMode::parse("worker", &config).is_err());
    }

    #[test]
    fn test_disabled_component_mode_is_rejected() {
        let mut config = AppConfig::default();
        config.dispatcher.enabled = false;
        assert!(AppMode::parse("dispatcher", &config).is_err());
        assert_eq!(AppMode::parse("all", &config).unwrap(), AppMode::All);
    }

    #[tokio::test]
    async fn test_dispatcher_fails_on_missing_backlog() {
        let mut config = AppConfig::default();
        config.dispatcher.backlog_path = "/nonexistent/points_data.csv".to_string();
        let app = Application::new(config, AppMode::Dispatcher);

        let (_tx, rx) = broadcast::channel(1);
        assert!(app.run(rx).await.is_err());
    }

    #[tokio::test]
    async fn test_service_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.service.bind_address = "127.0.0.1:0".to_string();
        config.service.metrics_file = dir
            .path()
            .join("metrics.json")
            .to_string_lossy()
            .into_owned();
        let app = Application::new(config, AppMode::Service);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { app.run(rx).await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_all_mode_fails_when_service_cannot_bind() {
        let dir = tempfile::tempdir().unwrap();
        let backlog_path = dir.path().join("points_data.csv");
        std::fs::write(&backlog_path, "id,x\nA,1\n").unwrap();

        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let occupied_addr = occupied.local_addr().unwrap();

        let mut config = AppConfig::default();
        config.service.bind_address = occupied_addr.to_string();
        config.service.metrics_file = dir
            .path()
            .join("metrics.json")
            .to_string_lossy()
            .into_owned();
        config.dispatcher.backlog_path = backlog_path.to_string_lossy().into_owned();
        config.dispatcher.service_url = format!("http://{occupied_addr}/process");
        let app = Application::new(config, AppMode::All);

        let (_tx, rx) = broadcast::channel(1);
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), app.run(rx))
            .await
            .unwrap();
        let error = result.unwrap_err();
        assert!(format!("{error:#}").contains("处理服务运行失败"));
    }
}

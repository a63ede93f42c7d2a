use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    dispatcher_service::{DispatcherConfig, ServiceConfig},
    observability::ObservabilityConfig,
};

/// 默认配置文件查找路径
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config/fifo.toml", "fifo.toml", "/etc/fifo/config.toml"];

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub service: ServiceConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: FIFO_, nesting separator: __)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("FIFO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatcher
            .validate()
            .context("Dispatcher配置验证失败")?;

        self.service.validate().context("处理服务配置验证失败")?;

        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verbosity;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatcher.max_concurrent_requests, 50);
        assert_eq!(config.dispatcher.max_retries, 3);
        assert_eq!(config.dispatcher.interval_seconds, 900);
        assert_eq!(config.service.capacity, 50);
        assert_eq!(config.service.response_time_window, 1000);
        assert_eq!(config.service.cycle_window, 100);
    }

    #[test]
    fn test_from_toml_partial_override() {
        let config = AppConfig::from_toml(
            r#"
            [dispatcher]
            max_concurrent_requests = 2
            max_retries = 1
            retry_delay_ms = 0

            [service]
            verbosity = "METRICS_ONLY"
            failure_probability = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.dispatcher.max_concurrent_requests, 2);
        assert_eq!(config.dispatcher.max_retries, 1);
        assert_eq!(config.dispatcher.retry_delay_ms, 0);
        assert_eq!(config.dispatcher.request_timeout_seconds, 15);
        assert_eq!(config.service.verbosity, Verbosity::MetricsOnly);
        assert_eq!(config.service.failure_probability, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml("[dispatcher]\nmax_concurrent_requests = 0").is_err());
        assert!(AppConfig::from_toml("[service]\nfailure_probability = 1.5").is_err());
        assert!(AppConfig::from_toml("[service]\nbind_address = \"not-an-address\"").is_err());
        assert!(AppConfig::from_toml("[service]\nverbosity = \"DEBUG\"").is_err());
        assert!(AppConfig::from_toml("[observability]\nlog_format = \"xml\"").is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_values() {
        let mut config = AppConfig::default();
        config.dispatcher.backlog_limit = Some(100);
        config.service.processing_delay_ms = 10;

        let serialized = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&serialized).unwrap();

        assert_eq!(parsed.dispatcher.backlog_limit, Some(100));
        assert_eq!(parsed.service.processing_delay_ms, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[dispatcher]\nservice_url = \"http://127.0.0.1:9000/process\"\ninterval_seconds = 60"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.dispatcher.service_url, "http://127.0.0.1:9000/process");
        assert_eq!(config.dispatcher.interval_seconds, 60);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/fifo.toml")).is_err());
    }
}

use fifo_core::config::*;
use fifo_core::Verbosity;
use std::env;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    // 验证默认值
    assert!(config.dispatcher.enabled);
    assert!(config.service.enabled);
    assert_eq!(config.dispatcher.service_url, "http://localhost:8000/process");
    assert_eq!(config.dispatcher.request_timeout_seconds, 15);
    assert_eq!(config.dispatcher.backlog_limit, Some(35000));
    assert_eq!(config.service.bind_address, "0.0.0.0:8000");
    assert_eq!(config.service.verbosity, Verbosity::Info);
    assert_eq!(config.observability.metrics_listen_address, None);
}

#[test]
fn test_file_and_environment_layers() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[dispatcher]
max_concurrent_requests = 8
max_retries = 2

[service]
capacity = 8
"#
    )
    .unwrap();

    // 环境变量覆盖配置文件
    env::set_var("FIFO_DISPATCHER__MAX_RETRIES", "5");
    env::set_var("FIFO_SERVICE__METRICS_FILE", "/tmp/fifo-metrics.json");

    let config = AppConfig::load(file.path().to_str()).unwrap();

    env::remove_var("FIFO_DISPATCHER__MAX_RETRIES");
    env::remove_var("FIFO_SERVICE__METRICS_FILE");

    assert_eq!(config.dispatcher.max_concurrent_requests, 8);
    assert_eq!(config.dispatcher.max_retries, 5);
    assert_eq!(config.service.capacity, 8);
    assert_eq!(config.service.metrics_file, "/tmp/fifo-metrics.json");
    assert_eq!(config.service.processing_delay_ms, 2000);
}

#[test]
fn test_invalid_file_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[dispatcher]\nrequest_timeout_seconds = 0").unwrap();

    assert!(AppConfig::load(file.path().to_str()).is_err());
}

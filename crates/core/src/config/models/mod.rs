pub mod app_config;
pub mod dispatcher_service;
pub mod observability;

pub use app_config::AppConfig;
pub use dispatcher_service::{DispatcherConfig, ServiceConfig};
pub use observability::ObservabilityConfig;

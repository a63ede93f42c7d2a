//! # FIFO Core
//!
//! 分发器（dispatcher）与处理服务（api）共享的基础模块：
//! - `errors`: 统一错误类型
//! - `models`: 工作项、请求/响应线上格式、日志级别
//! - `config`: 配置模型与加载

pub mod config;
pub mod errors;
pub mod models;

pub use config::{AppConfig, DispatcherConfig, ObservabilityConfig, ServiceConfig};
pub use errors::{FifoError, FifoResult};
pub use models::{PointPayload, ProcessRequest, ProcessResponse, Verbosity, WorkItem};

//! # FIFO Processor
//!
//! 命令行入口与组件装配：
//! - `dispatcher` 模式：按固定间隔把待处理数据逐条分发给处理服务
//! - `service` 模式：运行带并发跟踪的处理服务
//! - `all` 模式：在同一进程中同时运行两者

pub mod app;
pub mod shutdown;
pub mod telemetry;

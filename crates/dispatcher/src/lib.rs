//! Dispatcher
//!
//! 有界并发的FIFO分发引擎：按加载顺序逐条发送工作项，失败的工作项进入重试队列，
//! 重试优先于新工作项；每个周期结束后按固定间隔重新运行整个待处理列表。

pub mod backlog;
pub mod client;
pub mod dispatcher;
pub mod metrics;
pub mod scheduler;
pub mod work_source;

pub use backlog::Backlog;
pub use client::{HttpProcessingClient, ProcessingClient};
pub use dispatcher::{AttemptOutcome, CycleReport, DispatchSettings, Dispatcher};
pub use scheduler::CycleScheduler;
pub use work_source::{Admission, WorkSource};

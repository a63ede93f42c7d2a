//! # 数据模型
//!
//! 分发器与处理服务之间共享的数据结构。
//!
//! ## 核心模型
//!
//! ### WorkItem - 工作项
//! 待处理数据中的一条记录：不透明的 `id`、原样透传的数据字段，以及分发器维护的重试次数。
//!
//! ### ProcessRequest / ProcessResponse - 线上格式
//! `POST /process` 的请求体与响应体。分发器每次请求只携带一个工作项，
//! 处理服务同样接受多个工作项的批次。
//!
//! ### Verbosity - 诊断输出级别
//! 处理服务支持的三种日志级别：`VERBOSE`、`INFO`、`METRICS_ONLY`。

pub mod process;
pub mod verbosity;
pub mod work_item;

pub use process::*;
pub use verbosity::*;
pub use work_item::*;

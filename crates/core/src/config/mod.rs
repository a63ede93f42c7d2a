//! 配置管理
//!
//! 配置在进程启动时加载一次，运行期间不可变。加载顺序：
//! 1. 各配置结构的默认值
//! 2. TOML配置文件（`--config` 指定，或默认路径）
//! 3. 环境变量覆盖（前缀 `FIFO_`，层级分隔符 `__`，例如 `FIFO_DISPATCHER__MAX_RETRIES=5`）

pub mod models;

pub use models::{AppConfig, DispatcherConfig, ObservabilityConfig, ServiceConfig};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 待处理数据中的单个工作项
///
/// `data` 由分发器原样透传给处理服务，分发器只修改 `retry_count`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub retry_count: u32,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
            retry_count: 0,
        }
    }

    /// 不携带数据字段的工作项
    pub fn bare(id: impl Into<String>) -> Self {
        Self::new(id, Map::new())
    }

    /// 当前尝试序号（从1开始）
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn is_retry(&self) -> bool {
        self.retry_count > 0
    }
}

use thiserror::Error;

/// 分发器与处理服务共用的错误类型
#[derive(Debug, Error)]
pub enum FifoError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("加载待处理数据失败: {0}")]
    BacklogLoad(String),

    #[error("I/O错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("请求超时: {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("处理服务返回失败: {0}")]
    RemoteFailure(String),

    #[error("请求被处理服务拒绝: HTTP {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("无效的日志级别: {0}，支持: VERBOSE, INFO, METRICS_ONLY")]
    InvalidVerbosity(String),

    #[error("持久化错误: {0}")]
    Persistence(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl FifoError {
    /// 传输失败（连接、超时）和处理服务报告的失败可以重试；
    /// 请求体被判定无效（`Rejected`）则不可重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FifoError::Network(_) | FifoError::Timeout { .. } | FifoError::RemoteFailure(_)
        )
    }
}

/// 统一的Result类型
pub type FifoResult<T> = std::result::Result<T, FifoError>;

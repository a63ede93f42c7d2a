use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fifo_core::{FifoError, ProcessResponse};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("验证错误: {0}")]
    Validation(String),

    /// 处理阶段失败，响应中携带请求进入时的并发读数
    #[error("处理失败: {message}")]
    ProcessingFailed {
        message: String,
        concurrent_requests: usize,
    },

    #[error(transparent)]
    Core(#[from] FifoError),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::ProcessingFailed {
                message,
                concurrent_requests,
            } => {
                let body = ProcessResponse::failed(message.clone(), *concurrent_requests);
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Core(FifoError::InvalidVerbosity(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_VERBOSITY")
            }
            ApiError::Core(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "error_type": error_type,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

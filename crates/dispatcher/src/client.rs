use std::time::Duration;

use async_trait::async_trait;
use fifo_core::{FifoError, FifoResult, ProcessRequest, ProcessResponse, WorkItem};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// 处理服务客户端
///
/// 返回 `Ok` 表示处理成功；处理服务报告的失败、传输错误以及请求被拒绝都以 `Err` 返回，
/// 由 [`FifoError::is_retryable`] 区分是否可以重试。
#[async_trait]
pub trait ProcessingClient: Send + Sync {
    async fn process(&self, item: &WorkItem) -> FifoResult<ProcessResponse>;
}

/// 处理服务只对请求体无效回应400/422，这类请求重发也不会成功。
/// 其余非成功状态（包括408、429等）都按处理失败对待，可以重试。
fn is_validation_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// 基于reqwest的HTTP客户端，每个工作项一次 `POST /process`
pub struct HttpProcessingClient {
    service_url: String,
    request_timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpProcessingClient {
    pub fn new(service_url: impl Into<String>, request_timeout: Duration) -> FifoResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FifoError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            service_url: service_url.into(),
            request_timeout,
            http_client,
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn map_transport_error(&self, error: reqwest::Error) -> FifoError {
        if error.is_timeout() {
            FifoError::Timeout {
                timeout_ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            FifoError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl ProcessingClient for HttpProcessingClient {
    async fn process(&self, item: &WorkItem) -> FifoResult<ProcessResponse> {
        let request = ProcessRequest::single(item);

        debug!("发送数据点 {} 的请求 (第 {} 次尝试)", item.id, item.attempt());

        let response = self
            .http_client
            .post(&self.service_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();

        if is_validation_rejection(status) {
            let body = response.text().await.unwrap_or_default();
            warn!("数据点 {} 的请求被拒绝: HTTP {} - {}", item.id, status, body);
            return Err(FifoError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProcessResponse>(&body)
                .ok()
                .and_then(|response| response.error)
                .unwrap_or_else(|| format!("HTTP {status}: {body}"));
            debug!("数据点 {} 的请求失败: HTTP {} - {}", item.id, status, message);
            return Err(FifoError::RemoteFailure(message));
        }

        let body = response
            .json::<ProcessResponse>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.map_transport_error(e)
                } else {
                    FifoError::RemoteFailure(format!("HTTP {status}: 响应解析失败: {e}"))
                }
            })?;

        if body.success {
            Ok(body)
        } else {
            Err(FifoError::RemoteFailure(
                body.error
                    .unwrap_or_else(|| format!("HTTP {status}: Unknown error")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_statuses_are_rejections() {
        assert!(is_validation_rejection(StatusCode::BAD_REQUEST));
        assert!(is_validation_rejection(StatusCode::UNPROCESSABLE_ENTITY));

        assert!(!is_validation_rejection(StatusCode::NOT_FOUND));
        assert!(!is_validation_rejection(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_validation_rejection(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_validation_rejection(StatusCode::INTERNAL_SERVER_ERROR));
    }
}

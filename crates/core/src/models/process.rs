use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WorkItem;

/// 请求体中的单个数据点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub id: String,
    #[serde(default)]
    pub data: Value,
    /// 第几次尝试（从1开始）
    #[serde(default)]
    pub attempts: u32,
}

/// `POST /process` 请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub points: Vec<PointPayload>,
}

impl ProcessRequest {
    /// 为单个工作项构建请求
    pub fn single(item: &WorkItem) -> Self {
        Self {
            points: vec![PointPayload {
                id: item.id.clone(),
                data: Value::Object(item.data.clone()),
                attempts: item.attempt(),
            }],
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.points.iter().map(|point| point.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// `POST /process` 响应体
///
/// 成功时携带处理数量和耗时；失败时只携带错误信息和并发读数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub processed_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default)]
    pub concurrent_requests: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessResponse {
    pub fn succeeded(
        processed_count: usize,
        processing_time: f64,
        total_time: f64,
        concurrent_requests: usize,
    ) -> Self {
        Self {
            success: true,
            processed_count,
            processing_time: Some(processing_time),
            total_time: Some(total_time),
            concurrent_requests,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, concurrent_requests: usize) -> Self {
        Self {
            success: false,
            processed_count: 0,
            processing_time: None,
            total_time: None,
            concurrent_requests,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_request_carries_attempt_number() {
        let mut data = serde_json::Map::new();
        data.insert("value".to_string(), json!(10));
        let mut item = WorkItem::new("p-3", data);
        item.retry_count = 1;

        let request = ProcessRequest::single(&item);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({"points": [{"id": "p-3", "data": {"value": 10}, "attempts": 2}]})
        );
        assert_eq!(request.ids(), vec!["p-3"]);
    }

    #[test]
    fn test_failed_response_omits_timings() {
        let body = serde_json::to_value(ProcessResponse::failed("Simulated processing failure", 4))
            .unwrap();

        assert_eq!(
            body,
            json!({
                "success": false,
                "processed_count": 0,
                "concurrent_requests": 4,
                "error": "Simulated processing failure"
            })
        );
    }

    #[test]
    fn test_response_parses_minimal_failure_body() {
        let response: ProcessResponse =
            serde_json::from_value(json!({"success": false, "error": "boom"})).unwrap();
        assert!(!response.success);
        assert_eq!(response.processed_count, 0);
        assert_eq!(response.error.as_deref(), Some("boom"));
    }
}

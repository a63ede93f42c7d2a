use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use fifo_core::{ProcessRequest, ProcessResponse};

use crate::error::{ApiError, ApiResult};
use crate::routes::AppState;

/// 处理一批数据点
pub async fn process_batch(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let payload = payload.map(|Json(request)| request).map_err(ApiError::from);
    state.service.handle_request(payload).await.map(Json)
}

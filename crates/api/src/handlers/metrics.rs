use axum::{extract::State, Json};

use crate::aggregator::MetricsSnapshot;
use crate::routes::AppState;

/// 返回累计指标的实时快照
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.snapshot())
}

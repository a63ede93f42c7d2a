use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use fifo_core::Verbosity;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct VerbosityRequest {
    pub level: String,
}

/// 只接受 `VERBOSE`、`INFO`、`METRICS_ONLY`
pub async fn set_verbosity(
    State(state): State<AppState>,
    payload: Result<Json<VerbosityRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let level: Verbosity = request.level.parse()?;
    state.service.set_verbosity(level)?;

    Ok(Json(json!({
        "success": true,
        "verbosity": level,
    })))
}

pub async fn get_verbosity(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "verbosity": state.service.verbosity(),
        "available": Verbosity::ALL,
    }))
}

pub async fn reset_metrics(State(state): State<AppState>) -> Json<Value> {
    state.service.reset().await;
    Json(json!({
        "success": true,
        "message": "指标已重置",
    }))
}

use axum::{extract::State, Json};

use crate::routes::AppState;
use crate::service::{HealthReport, StatusReport};

pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health())
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.service.status())
}

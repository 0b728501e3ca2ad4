//! Health check handler

use axum::{Json, extract::State};

use crate::health::{self, HealthReport};
use crate::web::AppState;

/// Service status, probing the primary manifest upstream
pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(
        health::check(
            state.api.as_ref(),
            state.config.health.probe_reference.as_ref(),
        )
        .await,
    )
}

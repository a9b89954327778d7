use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::storage::Storage;

use super::{
    models::{ErrorResponse, HealthResponse},
    AppState,
};

pub mod chat;
pub mod community;
pub mod feed;
pub mod matching;
pub mod profiles;
pub mod teams;

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}

mod gamification;
mod health;
mod performance;
mod quizzes;
mod users;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use crate::db::DatabaseProxy;
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/health", health::router())
        .nest("/api/quiz", quizzes::router())
        .nest("/api/performance", performance::router())
        .nest("/api/gamification", gamification::router())
        .nest("/api/users", users::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

pub(crate) fn ok<T: Serialize>(data: T) -> Response {
    Json(SuccessResponse {
        success: true,
        data,
    })
    .into_response()
}

pub(crate) fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// Identity is issued upstream; the gateway forwards the acting user in
/// this header.
pub(crate) fn require_user_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("x-user-id header is required"))
}

pub(crate) fn require_proxy(state: &AppState) -> Result<Arc<DatabaseProxy>, AppError> {
    state
        .db_proxy()
        .ok_or_else(|| AppError::service_unavailable("Database not available"))
}

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::users;
use crate::response::AppError;
use crate::routes::{ok, require_proxy, require_user_id};
use crate::state::AppState;

const DEFAULT_LEARNING_PATH: [&str; 3] = ["General", "Math", "Science"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roadmap", get(roadmap))
        .route("/profile", put(update_profile))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoadmapResponse {
    learning_path: Vec<String>,
}

async fn roadmap(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let learning_path = match users::get_by_id(&proxy, &user_id).await {
        Ok(user) => user
            .map(|u| u.learning_path)
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_LEARNING_PATH.iter().map(|s| s.to_string()).collect()),
        Err(err) => return AppError::from(err).into_response(),
    };

    ok(RoadmapResponse { learning_path })
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    match users::update_profile(
        &proxy,
        &user_id,
        payload.name.as_deref(),
        payload.email.as_deref(),
    )
    .await
    {
        Ok(Some(user)) => ok(user),
        Ok(None) => AppError::not_found("User not found").into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

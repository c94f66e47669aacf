use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::db::operations::users;
use crate::response::AppError;
use crate::routes::{ok, require_proxy, require_user_id};
use crate::state::AppState;

const DEFAULT_LEADERBOARD_LIMIT: i64 = 20;
const MAX_LEADERBOARD_LIMIT: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/badges", get(badges))
}

#[derive(Debug, Deserialize)]
struct LeaderboardParams {
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardEntry {
    id: String,
    name: String,
    points: i32,
    level: &'static str,
    level_rank: i32,
}

async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Response {
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    match users::leaderboard(&proxy, limit).await {
        Ok(entries) => ok(entries
            .into_iter()
            .map(|entry| LeaderboardEntry {
                id: entry.id,
                name: entry.name,
                points: entry.total_points,
                level: entry.current_level.display_label(),
                level_rank: entry.total_points / 100 + 1,
            })
            .collect::<Vec<_>>()),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Serialize)]
struct BadgesResponse {
    badges: Vec<String>,
}

async fn badges(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    match users::get_by_id(&proxy, &user_id).await {
        Ok(user) => ok(BadgesResponse {
            badges: user.map(|u| u.badges).unwrap_or_default(),
        }),
        Err(err) => AppError::from(err).into_response(),
    }
}

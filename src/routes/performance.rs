use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::attempts;
use crate::db::operations::users;
use crate::response::AppError;
use crate::routes::{created, ok, require_proxy, require_user_id};
use crate::services::attempt_flow::{self, AnswerJudgment, AttemptInput};
use crate::services::difficulty::Difficulty;
use crate::state::AppState;

const PROGRESS_HISTORY_LIMIT: i64 = 50;
const POINTS_PER_LEVEL_RANK: i32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-answer", post(submit_answer))
        .route("/diagnostic", post(submit_diagnostic))
        .route("/progress", get(progress))
}

fn level_rank(total_points: i32) -> i32 {
    total_points / POINTS_PER_LEVEL_RANK + 1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswerRequest {
    #[serde(default)]
    question_id: Option<String>,
    #[serde(default)]
    correct: Option<bool>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    time_taken: Option<f64>,
    #[serde(default)]
    attempts: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerAttempt {
    id: String,
    score: i32,
    is_correct: bool,
    predicted_level: Difficulty,
    ai_feedback: String,
    time_taken: f64,
    attempts: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Gamification {
    points_earned: i32,
    total_points: i32,
    xp: i32,
    level_rank: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerUser {
    current_level: Difficulty,
    level: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAnswerResponse {
    attempt: AnswerAttempt,
    gamification: Gamification,
    user: AnswerUser,
    new_badges: Vec<String>,
}

/// Entry point where the caller supplies the correctness verdict (the
/// client graded locally); scoring, prediction, feedback, and persistence
/// still run through the shared attempt flow.
async fn submit_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let Some(question_id) = payload.question_id else {
        return AppError::validation("questionId is required").into_response();
    };

    let outcome = attempt_flow::record_attempt(
        &proxy,
        &state.feedback_composer(),
        AttemptInput {
            user_id,
            question_id,
            judgment: AnswerJudgment::Explicit(payload.correct == Some(true)),
            topic: payload.topic,
            time_taken: payload.time_taken,
            attempts: payload.attempts,
        },
    )
    .await;

    match outcome {
        Ok(outcome) => created(SubmitAnswerResponse {
            attempt: AnswerAttempt {
                id: outcome.attempt.id,
                score: outcome.attempt.score,
                is_correct: outcome.attempt.is_correct,
                predicted_level: outcome.attempt.predicted_level,
                ai_feedback: outcome.attempt.ai_feedback,
                time_taken: outcome.attempt.time_taken,
                attempts: outcome.attempt.attempts,
            },
            gamification: Gamification {
                points_earned: outcome.points_earned,
                total_points: outcome.user.total_points,
                xp: outcome.user.total_points,
                level_rank: level_rank(outcome.user.total_points),
            },
            user: AnswerUser {
                current_level: outcome.user.current_level,
                level: outcome.user.current_level.display_label(),
            },
            new_badges: Vec::new(),
        }),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SubmitDiagnosticRequest {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    total: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitDiagnosticResponse {
    level: &'static str,
    diagnostic_completed: bool,
    learning_path: Vec<String>,
}

async fn submit_diagnostic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SubmitDiagnosticRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let (Some(score), Some(total)) = (payload.score, payload.total) else {
        return AppError::validation("score and total are required").into_response();
    };

    let level = attempt_flow::diagnostic_level(score, total);
    let learning_path = attempt_flow::learning_path_for(level);

    match users::complete_diagnostic(&proxy, &user_id, level, &learning_path).await {
        Ok(true) => ok(SubmitDiagnosticResponse {
            level: level.display_label(),
            diagnostic_completed: true,
            learning_path,
        }),
        Ok(false) => AppError::not_found("User not found").into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressStats {
    total_attempts: usize,
    correct_answers: usize,
    accuracy: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressEntry {
    id: String,
    topic: String,
    correct: bool,
    points_earned: i32,
    score: i32,
    time_taken: f64,
    attempts: i32,
    predicted_level: Difficulty,
    ai_feedback: String,
    created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressResponse {
    stats: ProgressStats,
    recent: Vec<ProgressEntry>,
}

async fn progress(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let recent = match attempts::recent_by_user(&proxy, &user_id, PROGRESS_HISTORY_LIMIT).await {
        Ok(recent) => recent,
        Err(err) => return AppError::from(err).into_response(),
    };

    let total_attempts = recent.len();
    let correct_answers = recent.iter().filter(|a| a.is_correct).count();
    let accuracy = if total_attempts > 0 {
        correct_answers as f64 / total_attempts as f64 * 100.0
    } else {
        0.0
    };

    ok(ProgressResponse {
        stats: ProgressStats {
            total_attempts,
            correct_answers,
            accuracy,
        },
        recent: recent
            .into_iter()
            .map(|a| ProgressEntry {
                id: a.id,
                topic: a.topic,
                correct: a.is_correct,
                points_earned: if a.is_correct {
                    attempt_flow::CORRECT_POINTS
                } else {
                    attempt_flow::INCORRECT_POINTS
                },
                score: a.score,
                time_taken: a.time_taken,
                attempts: a.attempts,
                predicted_level: a.predicted_level,
                ai_feedback: a.ai_feedback,
                created_at: a.created_at,
            })
            .collect(),
    })
}

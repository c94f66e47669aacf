use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::operations::attempts;
use crate::db::operations::questions::{self, QuestionRow};
use crate::db::operations::quizzes::{self, NewQuiz, QuizQuestion};
use crate::db::operations::users;
use crate::response::AppError;
use crate::routes::{created, ok, require_proxy, require_user_id};
use crate::services::attempt_flow::{self, AnswerJudgment, AttemptInput};
use crate::services::difficulty::{self, Difficulty};
use crate::services::question_set;
use crate::state::AppState;

const DIAGNOSTIC_SIZE: i64 = 10;
const DEFAULT_QUIZ_SIZE: usize = 5;
const DIFFICULTY_LIST_LIMIT: i64 = 20;
const DASHBOARD_HISTORY_LIMIT: i64 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/diagnostic", get(diagnostic))
        .route("/dashboard", get(dashboard))
        .route("/questions/:difficulty", get(questions_by_difficulty))
        .route("/next-question", get(next_question))
        .route("/generate", post(generate_quiz))
        .route("/generate-ai", post(generate_ai_questions))
        .route("/submit-attempt", post(submit_attempt))
        .route("/predict-level", post(predict_level))
        .route("/:id", get(quiz_by_id))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticQuiz {
    id: &'static str,
    topic: &'static str,
    questions: Vec<QuestionRow>,
}

async fn diagnostic(State(state): State<AppState>) -> Response {
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let questions = match questions::sample_random(&proxy, DIAGNOSTIC_SIZE).await {
        Ok(questions) => questions,
        Err(err) => return AppError::from(err).into_response(),
    };
    if questions.is_empty() {
        return AppError::not_found("No questions available for diagnostic").into_response();
    }

    ok(DiagnosticQuiz {
        id: "diagnostic",
        topic: "Diagnostic",
        questions,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateQuizRequest {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    count: Option<usize>,
}

async fn generate_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GenerateQuizRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let Some(topic) = payload.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return AppError::validation("topic is required").into_response();
    };
    let target = payload
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse_client)
        .unwrap_or_default();
    let count = payload
        .count
        .unwrap_or(DEFAULT_QUIZ_SIZE)
        .min(question_set::MAX_QUIZ_QUESTIONS);

    let selected = match question_set::assemble(&proxy, topic, target, count).await {
        Ok(selected) => selected,
        Err(err) => return AppError::from(err).into_response(),
    };

    // Snapshot the selected questions so later edits to the store never
    // change an already-created quiz.
    let snapshot: Vec<QuizQuestion> = selected
        .into_iter()
        .map(|q| QuizQuestion {
            id: q.id,
            topic: q.topic,
            difficulty: q.difficulty,
            question_text: q.question_text,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        })
        .collect();

    let quiz = quizzes::insert(
        &proxy,
        NewQuiz {
            title: format!("{topic} - {}", target.display_label()),
            topic: topic.to_string(),
            difficulty: target,
            user_id,
            questions: snapshot,
        },
    )
    .await;

    match quiz {
        Ok(quiz) => created(quiz),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn quiz_by_id(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    match quizzes::get_by_id(&proxy, &id).await {
        Ok(Some(quiz)) => ok(quiz),
        Ok(None) => AppError::not_found("Quiz not found").into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn questions_by_difficulty(
    State(state): State<AppState>,
    Path(difficulty): Path<String>,
) -> Response {
    let Some(difficulty) = Difficulty::parse(&difficulty) else {
        return AppError::bad_request("Invalid difficulty").into_response();
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    match questions::find_by_difficulty(&proxy, difficulty, DIFFICULTY_LIST_LIMIT).await {
        Ok(questions) if questions.is_empty() => {
            AppError::not_found(format!("No questions found for difficulty: {difficulty}"))
                .into_response()
        }
        Ok(questions) => ok(questions),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct NextQuestionParams {
    #[serde(default)]
    difficulty: Option<String>,
}

/// Question fields safe to show before an answer is submitted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NextQuestion {
    id: String,
    topic: String,
    difficulty: Difficulty,
    question_text: String,
    options: Vec<String>,
}

async fn next_question(
    State(state): State<AppState>,
    Query(params): Query<NextQuestionParams>,
) -> Response {
    let raw = params.difficulty.as_deref().unwrap_or("easy");
    let Some(difficulty) = Difficulty::parse(raw) else {
        return AppError::bad_request("Invalid difficulty").into_response();
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    match questions::find_by_difficulty(&proxy, difficulty, 1).await {
        Ok(questions) => match questions.into_iter().next() {
            Some(q) => ok(NextQuestion {
                id: q.id,
                topic: q.topic,
                difficulty: q.difficulty,
                question_text: q.question_text,
                options: q.options,
            }),
            None => AppError::not_found("No questions available for this level").into_response(),
        },
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAiRequest {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Serialize)]
struct GeneratedBatch {
    questions: Vec<crate::services::question_gen::GeneratedQuestion>,
}

/// Best-effort: upstream failures degrade to fewer (possibly zero)
/// questions, never to an error response.
async fn generate_ai_questions(
    State(state): State<AppState>,
    Json(payload): Json<GenerateAiRequest>,
) -> Response {
    let topic = payload.topic.unwrap_or_default();
    let difficulty = payload
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse_client)
        .unwrap_or_default();
    let count = payload.count.unwrap_or(DEFAULT_QUIZ_SIZE);

    let questions = state
        .question_generator()
        .generate(&topic, difficulty, count)
        .await;
    ok(GeneratedBatch { questions })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAttemptRequest {
    #[serde(default)]
    question_id: Option<String>,
    #[serde(default)]
    selected_answer: Option<String>,
    #[serde(default)]
    time_taken: Option<f64>,
    #[serde(default)]
    attempts: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptSummary {
    id: String,
    score: i32,
    is_correct: bool,
    predicted_level: Difficulty,
    ai_feedback: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAttemptResponse {
    attempt: AttemptSummary,
    user: users::UserAggregate,
}

async fn submit_attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let (Some(question_id), Some(time_taken)) = (payload.question_id, payload.time_taken) else {
        return AppError::validation("questionId and timeTaken are required").into_response();
    };

    let outcome = attempt_flow::record_attempt(
        &proxy,
        &state.feedback_composer(),
        AttemptInput {
            user_id,
            question_id,
            judgment: AnswerJudgment::Selected(payload.selected_answer),
            topic: None,
            time_taken: Some(time_taken),
            attempts: payload.attempts,
        },
    )
    .await;

    match outcome {
        Ok(outcome) => created(SubmitAttemptResponse {
            attempt: AttemptSummary {
                id: outcome.attempt.id,
                score: outcome.attempt.score,
                is_correct: outcome.attempt.is_correct,
                predicted_level: outcome.attempt.predicted_level,
                ai_feedback: outcome.attempt.ai_feedback,
            },
            user: outcome.user,
        }),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictLevelRequest {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    time_taken: Option<f64>,
    #[serde(default)]
    attempts: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictLevelResponse {
    predicted_difficulty: Difficulty,
}

async fn predict_level(Json(payload): Json<PredictLevelRequest>) -> Response {
    let (Some(score), Some(time_taken)) = (payload.score, payload.time_taken) else {
        return AppError::validation("score and timeTaken are required").into_response();
    };

    let predicted =
        difficulty::predict_level(score, time_taken, payload.attempts.unwrap_or(1));
    ok(PredictLevelResponse {
        predicted_difficulty: predicted,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardUser {
    id: String,
    name: String,
    email: Option<String>,
    current_level: Difficulty,
    total_points: i32,
    badges: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardHistoryEntry {
    id: String,
    topic: String,
    score: i32,
    time_taken: f64,
    predicted_level: Difficulty,
    created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    user: DashboardUser,
    history: Vec<DashboardHistoryEntry>,
}

async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match require_user_id(&headers) {
        Ok(user_id) => user_id,
        Err(err) => return err.into_response(),
    };
    let proxy = match require_proxy(&state) {
        Ok(proxy) => proxy,
        Err(err) => return err.into_response(),
    };

    let user = match users::get_by_id(&proxy, &user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return AppError::not_found("User not found").into_response(),
        Err(err) => return AppError::from(err).into_response(),
    };

    let history = match attempts::recent_by_user(&proxy, &user_id, DASHBOARD_HISTORY_LIMIT).await {
        Ok(attempts) => attempts,
        Err(err) => return AppError::from(err).into_response(),
    };

    ok(DashboardResponse {
        user: DashboardUser {
            id: user.id,
            name: user.name,
            email: user.email,
            current_level: user.current_level,
            total_points: user.total_points,
            badges: user.badges,
        },
        history: history
            .into_iter()
            .map(|a| DashboardHistoryEntry {
                id: a.id,
                topic: a.topic,
                score: a.score,
                time_taken: a.time_taken,
                predicted_level: a.predicted_level,
                created_at: a.created_at,
            })
            .collect(),
    })
}

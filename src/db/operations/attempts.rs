use chrono::Utc;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::operations::naive_to_iso;
use crate::db::DatabaseProxy;
use crate::services::difficulty::Difficulty;

#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: String,
    pub question_id: String,
    pub topic: String,
    pub score: i32,
    pub time_taken: f64,
    pub attempts: i32,
    pub is_correct: bool,
    pub predicted_level: Difficulty,
    pub ai_feedback: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRow {
    pub id: String,
    pub user_id: String,
    pub question_id: String,
    pub topic: String,
    pub score: i32,
    pub time_taken: f64,
    pub attempts: i32,
    pub is_correct: bool,
    pub predicted_level: Difficulty,
    pub ai_feedback: String,
    pub created_at: String,
}

fn map_row(row: PgRow) -> AttemptRow {
    let created_at: chrono::NaiveDateTime = row
        .try_get("createdAt")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    AttemptRow {
        id: row.try_get("id").unwrap_or_default(),
        user_id: row.try_get("userId").unwrap_or_default(),
        question_id: row.try_get("questionId").unwrap_or_default(),
        topic: row.try_get("topic").unwrap_or_default(),
        score: row.try_get("score").unwrap_or_default(),
        time_taken: row.try_get("timeTaken").unwrap_or_default(),
        attempts: row.try_get("attempts").unwrap_or(1),
        is_correct: row.try_get("isCorrect").unwrap_or_default(),
        predicted_level: row
            .try_get::<String, _>("predictedLevel")
            .ok()
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or_default(),
        ai_feedback: row.try_get("aiFeedback").unwrap_or_default(),
        created_at: naive_to_iso(created_at),
    }
}

/// Append-only: one row per answered question. Double submits produce two
/// rows by design; point totals stay consistent through the atomic user
/// update, not through attempt dedup.
pub async fn insert(proxy: &DatabaseProxy, input: &NewAttempt) -> Result<AttemptRow, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().naive_utc();

    sqlx::query(
        r#"
        INSERT INTO "attempts"
          ("id", "userId", "questionId", "topic", "score", "timeTaken", "attempts", "isCorrect", "predictedLevel", "aiFeedback", "createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&id)
    .bind(&input.user_id)
    .bind(&input.question_id)
    .bind(&input.topic)
    .bind(input.score)
    .bind(input.time_taken)
    .bind(input.attempts)
    .bind(input.is_correct)
    .bind(input.predicted_level.as_str())
    .bind(&input.ai_feedback)
    .bind(created_at)
    .execute(proxy.pool())
    .await?;

    Ok(AttemptRow {
        id,
        user_id: input.user_id.clone(),
        question_id: input.question_id.clone(),
        topic: input.topic.clone(),
        score: input.score,
        time_taken: input.time_taken,
        attempts: input.attempts,
        is_correct: input.is_correct,
        predicted_level: input.predicted_level,
        ai_feedback: input.ai_feedback.clone(),
        created_at: naive_to_iso(created_at),
    })
}

pub async fn recent_by_user(
    proxy: &DatabaseProxy,
    user_id: &str,
    limit: i64,
) -> Result<Vec<AttemptRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "userId", "questionId", "topic", "score", "timeTaken", "attempts", "isCorrect", "predictedLevel", "aiFeedback", "createdAt"
        FROM "attempts"
        WHERE "userId" = $1
        ORDER BY "createdAt" DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows.into_iter().map(map_row).collect())
}

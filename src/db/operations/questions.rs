use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::db::operations::naive_to_iso;
use crate::db::DatabaseProxy;
use crate::services::difficulty::Difficulty;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRow {
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

const SELECT_COLUMNS: &str = r#"SELECT "id", "topic", "difficulty", "questionText", "options", "correctAnswer", "explanation", "createdAt" FROM "questions""#;

fn map_row(row: PgRow) -> QuestionRow {
    let created_at: chrono::NaiveDateTime = row
        .try_get("createdAt")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let options: serde_json::Value = row.try_get("options").unwrap_or(serde_json::json!([]));

    QuestionRow {
        id: row.try_get("id").unwrap_or_default(),
        topic: row.try_get("topic").unwrap_or_default(),
        difficulty: row
            .try_get::<String, _>("difficulty")
            .ok()
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or_default(),
        question_text: row.try_get("questionText").unwrap_or_default(),
        options: super::string_list(options),
        correct_answer: row.try_get("correctAnswer").unwrap_or_default(),
        explanation: row.try_get("explanation").ok(),
        created_at: naive_to_iso(created_at),
    }
}

pub async fn get_by_id(
    proxy: &DatabaseProxy,
    id: &str,
) -> Result<Option<QuestionRow>, sqlx::Error> {
    let row = sqlx::query(&format!(r#"{SELECT_COLUMNS} WHERE "id" = $1"#))
        .bind(id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.map(map_row))
}

pub async fn find_by_topic(
    proxy: &DatabaseProxy,
    topic: &str,
    limit: i64,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"{SELECT_COLUMNS} WHERE "topic" = $1 ORDER BY "createdAt" LIMIT $2"#
    ))
    .bind(topic)
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.into_iter().map(map_row).collect())
}

pub async fn find_by_difficulty(
    proxy: &DatabaseProxy,
    difficulty: Difficulty,
    limit: i64,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"{SELECT_COLUMNS} WHERE "difficulty" = $1 ORDER BY "createdAt" LIMIT $2"#
    ))
    .bind(difficulty.as_str())
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;
    Ok(rows.into_iter().map(map_row).collect())
}

/// N uniformly random questions, used by the diagnostic quiz.
pub async fn sample_random(
    proxy: &DatabaseProxy,
    count: i64,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    let rows = sqlx::query(&format!(r#"{SELECT_COLUMNS} ORDER BY RANDOM() LIMIT $1"#))
        .bind(count)
        .fetch_all(proxy.pool())
        .await?;
    Ok(rows.into_iter().map(map_row).collect())
}

/// The `(difficulty, lowercased-trimmed text)` keys already persisted for a
/// topic; this is the bank dedup key, not the row id.
pub async fn bank_keys_for_topic(
    proxy: &DatabaseProxy,
    topic: &str,
) -> Result<HashSet<(String, String)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT "difficulty", lower(btrim("questionText")) AS "textKey" FROM "questions" WHERE "topic" = $1"#,
    )
    .bind(topic)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.try_get("difficulty").unwrap_or_default(),
                row.try_get("textKey").unwrap_or_default(),
            )
        })
        .collect())
}

/// Batched insert. Rows colliding on the bank dedup key are silently
/// skipped, so concurrent synchronizers racing on the same subject are
/// benign.
pub async fn insert_many(
    proxy: &DatabaseProxy,
    questions: &[NewQuestion],
) -> Result<u64, sqlx::Error> {
    if questions.is_empty() {
        return Ok(0);
    }

    let now = Utc::now().naive_utc();
    let mut builder = QueryBuilder::<sqlx::Postgres>::new(
        r#"INSERT INTO "questions" ("id", "topic", "difficulty", "questionText", "options", "correctAnswer", "explanation", "createdAt", "updatedAt") "#,
    );
    builder.push_values(questions, |mut b, q| {
        b.push_bind(Uuid::new_v4().to_string())
            .push_bind(&q.topic)
            .push_bind(q.difficulty.as_str())
            .push_bind(&q.question_text)
            .push_bind(serde_json::json!(q.options))
            .push_bind(&q.correct_answer)
            .push_bind(q.explanation.as_deref())
            .push_bind(now)
            .push_bind(now);
    });
    builder.push(r#" ON CONFLICT ("difficulty", (lower(btrim("questionText")))) DO NOTHING"#);

    let result = builder.build().execute(proxy.pool()).await?;
    Ok(result.rows_affected())
}

pub async fn delete_all(proxy: &DatabaseProxy) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM "questions""#)
        .execute(proxy.pool())
        .await?;
    Ok(result.rows_affected())
}

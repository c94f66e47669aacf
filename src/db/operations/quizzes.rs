use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::operations::naive_to_iso;
use crate::db::DatabaseProxy;
use crate::services::difficulty::Difficulty;

/// A question copy frozen into a quiz at generation time. Later edits to
/// the question store do not affect an already-created quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub user_id: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRow {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub user_id: String,
    pub questions: Vec<QuizQuestion>,
    pub created_at: String,
}

pub async fn insert(proxy: &DatabaseProxy, input: NewQuiz) -> Result<QuizRow, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().naive_utc();

    sqlx::query(
        r#"
        INSERT INTO "quizzes" ("id", "title", "topic", "difficulty", "userId", "questions", "createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&id)
    .bind(&input.title)
    .bind(&input.topic)
    .bind(input.difficulty.as_str())
    .bind(&input.user_id)
    .bind(serde_json::to_value(&input.questions).unwrap_or(serde_json::json!([])))
    .bind(created_at)
    .execute(proxy.pool())
    .await?;

    Ok(QuizRow {
        id,
        title: input.title,
        topic: input.topic,
        difficulty: input.difficulty,
        user_id: input.user_id,
        questions: input.questions,
        created_at: naive_to_iso(created_at),
    })
}

pub async fn get_by_id(proxy: &DatabaseProxy, id: &str) -> Result<Option<QuizRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "title", "topic", "difficulty", "userId", "questions", "createdAt"
        FROM "quizzes"
        WHERE "id" = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?;

    Ok(row.map(|row| {
        let created_at: chrono::NaiveDateTime = row
            .try_get("createdAt")
            .unwrap_or_else(|_| Utc::now().naive_utc());
        let questions: serde_json::Value = row.try_get("questions").unwrap_or(serde_json::json!([]));

        QuizRow {
            id: row.try_get("id").unwrap_or_default(),
            title: row.try_get("title").unwrap_or_default(),
            topic: row.try_get("topic").unwrap_or_default(),
            difficulty: row
                .try_get::<String, _>("difficulty")
                .ok()
                .as_deref()
                .and_then(Difficulty::parse)
                .unwrap_or_default(),
            user_id: row.try_get("userId").unwrap_or_default(),
            questions: serde_json::from_value(questions).unwrap_or_default(),
            created_at: naive_to_iso(created_at),
        }
    }))
}

use chrono::Utc;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::DatabaseProxy;
use crate::services::difficulty::Difficulty;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub current_level: Difficulty,
    pub total_points: i32,
    pub diagnostic_completed: bool,
    pub learning_path: Vec<String>,
    pub badges: Vec<String>,
}

/// The aggregate slice mutated after every attempt.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregate {
    pub current_level: Difficulty,
    pub total_points: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub total_points: i32,
    pub current_level: Difficulty,
}

fn map_row(row: PgRow) -> UserRow {
    let learning_path: serde_json::Value =
        row.try_get("learningPath").unwrap_or(serde_json::json!([]));
    let badges: serde_json::Value = row.try_get("badges").unwrap_or(serde_json::json!([]));

    UserRow {
        id: row.try_get("id").unwrap_or_default(),
        name: row.try_get("name").unwrap_or_default(),
        email: row.try_get("email").ok(),
        current_level: row
            .try_get::<String, _>("currentLevel")
            .ok()
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or_default(),
        total_points: row.try_get("totalPoints").unwrap_or_default(),
        diagnostic_completed: row.try_get("diagnosticCompleted").unwrap_or_default(),
        learning_path: super::string_list(learning_path),
        badges: super::string_list(badges),
    }
}

pub async fn get_by_id(proxy: &DatabaseProxy, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "name", "email", "currentLevel", "totalPoints", "diagnosticCompleted", "learningPath", "badges"
        FROM "users"
        WHERE "id" = $1
        "#,
    )
    .bind(id)
    .fetch_optional(proxy.pool())
    .await?;
    Ok(row.map(map_row))
}

/// Single-statement "set level + increment points" update. The increment is
/// atomic in the database, so racing attempt submissions never lose points.
pub async fn apply_attempt_progress(
    proxy: &DatabaseProxy,
    user_id: &str,
    level: Difficulty,
    points_delta: i32,
) -> Result<Option<UserAggregate>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "users"
        SET "currentLevel" = $2, "totalPoints" = "totalPoints" + $3, "updatedAt" = $4
        WHERE "id" = $1
        RETURNING "currentLevel", "totalPoints"
        "#,
    )
    .bind(user_id)
    .bind(level.as_str())
    .bind(points_delta)
    .bind(Utc::now().naive_utc())
    .fetch_optional(proxy.pool())
    .await?;

    Ok(row.map(|row| UserAggregate {
        current_level: row
            .try_get::<String, _>("currentLevel")
            .ok()
            .as_deref()
            .and_then(Difficulty::parse)
            .unwrap_or_default(),
        total_points: row.try_get("totalPoints").unwrap_or_default(),
    }))
}

/// Diagnostic completion replaces the learning path wholesale.
pub async fn complete_diagnostic(
    proxy: &DatabaseProxy,
    user_id: &str,
    level: Difficulty,
    learning_path: &[String],
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE "users"
        SET "currentLevel" = $2, "diagnosticCompleted" = TRUE, "learningPath" = $3, "updatedAt" = $4
        WHERE "id" = $1
        "#,
    )
    .bind(user_id)
    .bind(level.as_str())
    .bind(serde_json::json!(learning_path))
    .bind(Utc::now().naive_utc())
    .execute(proxy.pool())
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_profile(
    proxy: &DatabaseProxy,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "users"
        SET "name" = COALESCE($2, "name"), "email" = COALESCE($3, "email"), "updatedAt" = $4
        WHERE "id" = $1
        "#,
    )
    .bind(user_id)
    .bind(name.map(str::trim))
    .bind(email.map(|e| e.trim().to_lowercase()))
    .bind(Utc::now().naive_utc())
    .execute(proxy.pool())
    .await?;

    get_by_id(proxy, user_id).await
}

pub async fn leaderboard(
    proxy: &DatabaseProxy,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id", "name", "totalPoints", "currentLevel"
        FROM "users"
        ORDER BY "totalPoints" DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            id: row.try_get("id").unwrap_or_default(),
            name: row.try_get("name").unwrap_or_default(),
            total_points: row.try_get("totalPoints").unwrap_or_default(),
            current_level: row
                .try_get::<String, _>("currentLevel")
                .ok()
                .as_deref()
                .and_then(Difficulty::parse)
                .unwrap_or_default(),
        })
        .collect())
}

/// Idempotent demo-user insert, used by the seed binary so a fresh
/// deployment has an account to submit attempts against.
pub async fn upsert_user(
    proxy: &DatabaseProxy,
    id: &str,
    name: &str,
    email: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "users" ("id", "name", "email", "updatedAt")
        VALUES ($1, $2, $3, $4)
        ON CONFLICT ("id") DO NOTHING
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(Utc::now().naive_utc())
    .execute(proxy.pool())
    .await?;
    Ok(())
}

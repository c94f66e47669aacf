use thiserror::Error;

use crate::db::operations::attempts::{self, AttemptRow, NewAttempt};
use crate::db::operations::questions;
use crate::db::operations::users::{self, UserAggregate};
use crate::db::DatabaseProxy;
use crate::services::difficulty::{self, Difficulty};
use crate::services::feedback::FeedbackComposer;

// Score feeds the readiness formula, points feed the leaderboard; the two
// granularities differ on purpose.
pub const CORRECT_SCORE: i32 = 10;
pub const INCORRECT_SCORE: i32 = 4;
pub const CORRECT_POINTS: i32 = 10;
pub const INCORRECT_POINTS: i32 = 2;

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// How correctness is established, depending on the entry point: either the
/// submitted answer is compared byte-for-byte against the stored correct
/// answer, or the caller supplies the verdict.
#[derive(Debug, Clone)]
pub enum AnswerJudgment {
    Selected(Option<String>),
    Explicit(bool),
}

#[derive(Debug, Clone)]
pub struct AttemptInput {
    pub user_id: String,
    pub question_id: String,
    pub judgment: AnswerJudgment,
    pub topic: Option<String>,
    pub time_taken: Option<f64>,
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub attempt: AttemptRow,
    pub user: UserAggregate,
    pub points_earned: i32,
}

/// The per-submission control flow: validate, score, predict the next
/// level, obtain feedback, persist the attempt, update the user aggregate.
/// Validation failures short-circuit before anything is written.
pub async fn record_attempt(
    proxy: &DatabaseProxy,
    composer: &FeedbackComposer,
    input: AttemptInput,
) -> Result<AttemptOutcome, AttemptError> {
    let user_id = input.user_id.trim();
    if user_id.is_empty() {
        return Err(AttemptError::Validation("user id is required".to_string()));
    }
    let question_id = input.question_id.trim();
    if question_id.is_empty() {
        return Err(AttemptError::Validation("questionId is required".to_string()));
    }

    let question = questions::get_by_id(proxy, question_id)
        .await?
        .ok_or_else(|| AttemptError::NotFound("Question not found".to_string()))?;

    let is_correct = match &input.judgment {
        AnswerJudgment::Explicit(correct) => *correct,
        AnswerJudgment::Selected(answer) => {
            answer.as_deref() == Some(question.correct_answer.as_str())
        }
    };
    let score = if is_correct { CORRECT_SCORE } else { INCORRECT_SCORE };

    let time_taken = input
        .time_taken
        .filter(|t| t.is_finite())
        .map(|t| t.max(0.0))
        .unwrap_or(1.0);
    let tries = input.attempts.unwrap_or(1).max(1);
    let topic = input
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&question.topic)
        .to_string();

    let predicted_level = difficulty::predict_level(f64::from(score), time_taken, tries);
    // The composer never fails; provider outages degrade to templated text.
    let ai_feedback = composer
        .compose(f64::from(score), &topic, time_taken, tries, predicted_level)
        .await;

    let attempt = attempts::insert(
        proxy,
        &NewAttempt {
            user_id: user_id.to_string(),
            question_id: question_id.to_string(),
            topic,
            score,
            time_taken,
            attempts: tries as i32,
            is_correct,
            predicted_level,
            ai_feedback,
        },
    )
    .await?;

    let points_earned = if is_correct { CORRECT_POINTS } else { INCORRECT_POINTS };
    let user = users::apply_attempt_progress(proxy, user_id, predicted_level, points_earned)
        .await?
        .ok_or_else(|| AttemptError::NotFound("User not found".to_string()))?;

    Ok(AttemptOutcome {
        attempt,
        user,
        points_earned,
    })
}

/// Diagnostic percentage to starting level: >=70% hard, >=40% medium.
pub fn diagnostic_level(score: f64, total: f64) -> Difficulty {
    let pct = if total > 0.0 { score / total * 100.0 } else { 0.0 };
    if pct >= 70.0 {
        Difficulty::Hard
    } else if pct >= 40.0 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

/// The learning path assigned wholesale when a diagnostic completes.
pub fn learning_path_for(level: Difficulty) -> Vec<String> {
    let path: &[&str] = match level {
        Difficulty::Hard => &["Advanced Topics", "Algorithms", "System Design"],
        Difficulty::Medium => &["General", "Math", "Science", "Programming"],
        Difficulty::Easy => &["General", "Math", "Science"],
    };
    path.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_level_thresholds() {
        assert_eq!(diagnostic_level(7.0, 10.0), Difficulty::Hard);
        assert_eq!(diagnostic_level(4.0, 10.0), Difficulty::Medium);
        assert_eq!(diagnostic_level(3.0, 10.0), Difficulty::Easy);
        assert_eq!(diagnostic_level(5.0, 0.0), Difficulty::Easy);
    }

    #[test]
    fn test_learning_path_per_level() {
        assert_eq!(learning_path_for(Difficulty::Easy).len(), 3);
        assert_eq!(learning_path_for(Difficulty::Medium).len(), 4);
        assert!(learning_path_for(Difficulty::Hard)
            .contains(&"System Design".to_string()));
    }
}

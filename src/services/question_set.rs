use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::db::operations::questions::{self, QuestionRow};
use crate::db::DatabaseProxy;
use crate::services::bank_sync;
use crate::services::concept_bank;
use crate::services::difficulty::Difficulty;

pub const MAX_QUIZ_QUESTIONS: usize = 15;

// Upper bound on the per-subject fetch; the bank holds 15 rows per subject,
// so this only matters when unrelated rows share the topic name.
const SUBJECT_FETCH_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Unsupported subject: {0}")]
    UnsupportedSubject(String),
    #[error("Question bank not ready for this subject")]
    BankNotReady,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Assembles exactly `count` questions for a subject at a target
/// difficulty: synchronize the bank, fetch the persisted rows that belong
/// to it, shuffle the target bucket, and backfill from the other
/// difficulties when the bucket is short. Fails only when even backfill
/// cannot reach `count`.
pub async fn assemble(
    proxy: &DatabaseProxy,
    subject_input: &str,
    target: Difficulty,
    count: usize,
) -> Result<Vec<QuestionRow>, QuizError> {
    let subject = concept_bank::resolve_subject(subject_input)
        .ok_or_else(|| QuizError::UnsupportedSubject(subject_input.trim().to_string()))?;
    let count = count.clamp(1, MAX_QUIZ_QUESTIONS);

    let bank = bank_sync::ensure_subject_bank(proxy, subject).await?;
    let bank_keys: HashSet<(String, String)> = bank
        .iter()
        .map(|q| concept_bank::dedup_key(q.difficulty, &q.question_text))
        .collect();

    // Guard against stale or unrelated rows stored under the same subject
    // name: only rows whose text matches the generated bank participate.
    let persisted = questions::find_by_topic(proxy, subject, SUBJECT_FETCH_LIMIT).await?;
    let candidates: Vec<QuestionRow> = persisted
        .into_iter()
        .filter(|row| bank_keys.contains(&concept_bank::dedup_key(row.difficulty, &row.question_text)))
        .collect();

    pick_balanced(candidates, target, count, &mut rand::rng()).ok_or(QuizError::BankNotReady)
}

/// The pure selection core: uniform Fisher-Yates permutation of the target
/// bucket, then a shuffled backfill from the remaining rows (any
/// difficulty, already-picked ids excluded). Returns `None` when the pool
/// cannot reach `count`.
pub(crate) fn pick_balanced<R: Rng + ?Sized>(
    rows: Vec<QuestionRow>,
    target: Difficulty,
    count: usize,
    rng: &mut R,
) -> Option<Vec<QuestionRow>> {
    let (mut bucket, mut rest): (Vec<QuestionRow>, Vec<QuestionRow>) =
        rows.into_iter().partition(|row| row.difficulty == target);

    bucket.shuffle(rng);
    bucket.truncate(count);

    if bucket.len() < count {
        let picked: HashSet<String> = bucket.iter().map(|row| row.id.clone()).collect();
        rest.retain(|row| !picked.contains(&row.id));
        rest.shuffle(rng);
        bucket.extend(rest.into_iter().take(count - bucket.len()));
    }

    if bucket.len() < count {
        return None;
    }
    Some(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, difficulty: Difficulty) -> QuestionRow {
        QuestionRow {
            id: id.to_string(),
            topic: "Mathematics".to_string(),
            difficulty,
            question_text: format!("question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".to_string(),
            explanation: None,
            created_at: String::new(),
        }
    }

    fn pool(easy: usize, medium: usize, hard: usize) -> Vec<QuestionRow> {
        let mut rows = Vec::new();
        for i in 0..easy {
            rows.push(row(&format!("e{i}"), Difficulty::Easy));
        }
        for i in 0..medium {
            rows.push(row(&format!("m{i}"), Difficulty::Medium));
        }
        for i in 0..hard {
            rows.push(row(&format!("h{i}"), Difficulty::Hard));
        }
        rows
    }

    #[test]
    fn test_exact_bucket_selection() {
        let picked = pick_balanced(pool(5, 5, 5), Difficulty::Hard, 5, &mut rand::rng()).unwrap();
        assert_eq!(picked.len(), 5);
        assert!(picked.iter().all(|q| q.difficulty == Difficulty::Hard));
    }

    #[test]
    fn test_backfill_from_other_difficulties() {
        let picked = pick_balanced(pool(6, 2, 2), Difficulty::Hard, 6, &mut rand::rng()).unwrap();
        assert_eq!(picked.len(), 6);
        // Every hard question must be in before any backfill happens.
        let hard = picked.iter().filter(|q| q.difficulty == Difficulty::Hard).count();
        assert_eq!(hard, 2);
    }

    #[test]
    fn test_no_duplicate_ids() {
        for _ in 0..20 {
            let picked =
                pick_balanced(pool(4, 4, 4), Difficulty::Medium, 10, &mut rand::rng()).unwrap();
            let unique: HashSet<_> = picked.iter().map(|q| q.id.clone()).collect();
            assert_eq!(unique.len(), picked.len());
        }
    }

    #[test]
    fn test_fails_when_pool_is_short() {
        // 5 hard + 10 others cannot satisfy a request for 20.
        assert!(pick_balanced(pool(5, 5, 5), Difficulty::Hard, 20, &mut rand::rng()).is_none());
        assert!(pick_balanced(Vec::new(), Difficulty::Easy, 1, &mut rand::rng()).is_none());
    }

    #[test]
    fn test_selection_order_varies() {
        let mut orders = HashSet::new();
        for _ in 0..50 {
            let picked =
                pick_balanced(pool(10, 0, 0), Difficulty::Easy, 10, &mut rand::rng()).unwrap();
            orders.insert(
                picked.iter().map(|q| q.id.clone()).collect::<Vec<_>>().join(","),
            );
        }
        // A uniform shuffle of 10 items virtually never repeats one order
        // 50 times.
        assert!(orders.len() > 1);
    }
}

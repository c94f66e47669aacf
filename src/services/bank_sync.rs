use crate::db::operations::questions::{self, NewQuestion};
use crate::db::DatabaseProxy;
use crate::services::concept_bank::{self, BankQuestion};

/// Makes sure the persistent store contains at least the generated bank for
/// a subject, then returns the full generated bank.
///
/// Rows are matched by `(difficulty, lowercased-trimmed question text)`, not
/// by id, so re-running never duplicates. Concurrent calls for the same
/// subject may both attempt inserts; the unique index plus
/// `ON CONFLICT DO NOTHING` makes the race benign.
pub async fn ensure_subject_bank(
    proxy: &DatabaseProxy,
    subject: &str,
) -> Result<Vec<BankQuestion>, sqlx::Error> {
    let bank = concept_bank::questions_for(subject);
    if bank.is_empty() {
        return Ok(bank);
    }

    let existing = questions::bank_keys_for_topic(proxy, subject).await?;
    let missing: Vec<NewQuestion> = bank
        .iter()
        .filter(|q| !existing.contains(&concept_bank::dedup_key(q.difficulty, &q.question_text)))
        .map(|q| NewQuestion {
            topic: q.topic.clone(),
            difficulty: q.difficulty,
            question_text: q.question_text.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer.clone(),
            explanation: None,
        })
        .collect();

    if !missing.is_empty() {
        let inserted = questions::insert_many(proxy, &missing).await?;
        tracing::info!(subject, inserted, "synchronized subject question bank");
    }

    Ok(bank)
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_REVIEW_INTERVAL_DAYS, RETRY_AFTER_WRONG_MINUTES};
use crate::store::keys;
use crate::store::table::{Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Not checked against the question collection; may dangle.
    pub question_id: u64,
    pub correct: bool,
    pub attempts: u32,
    pub last_attempt: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub streak: u32,
}

impl Record for UserProgress {
    const COLLECTION: Collection = Collection::UserProgress;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("question_id", keys::id_value(self.question_id)),
            ("correct", keys::bool_value(self.correct)),
            ("last_attempt", keys::timestamp_value(self.last_attempt)),
            ("next_review", keys::timestamp_value(self.next_review)),
        ]
    }
}

impl UserProgress {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        if self.streak > self.attempts {
            return Err(format!(
                "streak ({}) cannot exceed attempts ({})",
                self.streak, self.attempts
            ));
        }
        Ok(())
    }
}

/// When a question should come back after an answer.
///
/// Correct answers double the interval with every consecutive success
/// (1, 2, 4, ... days, capped); a wrong answer brings it back shortly.
pub fn next_review_after(streak: u32, correct: bool, answered_at: DateTime<Utc>) -> DateTime<Utc> {
    if !correct {
        return answered_at + Duration::minutes(RETRY_AFTER_WRONG_MINUTES);
    }
    let exponent = streak.saturating_sub(1).min(16);
    let days = (1_i64 << exponent).min(MAX_REVIEW_INTERVAL_DAYS);
    answered_at + Duration::days(days)
}

impl Store {
    pub fn get_progress(&self, id: u64) -> Result<Option<UserProgress>, StoreError> {
        self.get_record(id)
    }

    pub fn count_progress(&self) -> usize {
        self.count_records(Collection::UserProgress)
    }

    pub fn list_progress(&self) -> Result<Vec<UserProgress>, StoreError> {
        self.list_records()
    }

    pub fn progress_for_question(&self, question_id: u64) -> Result<Option<UserProgress>, StoreError> {
        let mut rows: Vec<UserProgress> =
            self.scan_index("question_id", &keys::id_value(question_id), 0, 1)?;
        Ok(rows.pop())
    }

    /// Progress rows whose `next_review` is at or before `now`, soonest first.
    pub fn progress_due_before(&self, now: DateTime<Utc>) -> Result<Vec<UserProgress>, StoreError> {
        self.scan_index_upto("next_review", &keys::timestamp_value(now))
    }

    pub fn save_progress(&self, progress: &UserProgress) -> Result<UserProgress, StoreError> {
        progress.validate().map_err(StoreError::Validation)?;
        self.put_record(progress, "save_progress")
    }

    /// Updates (or starts) the progress row of one question after an answer.
    pub fn record_answer(
        &self,
        question_id: u64,
        correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Result<UserProgress, StoreError> {
        let spaced_repetition = self.get_user_settings()?.spaced_repetition;

        let _guard = self.write_guard();
        let mut progress = match self.progress_for_question(question_id)? {
            Some(existing) => existing,
            None => UserProgress {
                id: None,
                question_id,
                correct,
                attempts: 0,
                last_attempt: answered_at,
                next_review: answered_at,
                streak: 0,
            },
        };

        progress.attempts = progress.attempts.saturating_add(1);
        progress.correct = correct;
        progress.streak = if correct { progress.streak.saturating_add(1) } else { 0 };
        progress.last_attempt = answered_at;
        progress.next_review = if spaced_repetition {
            next_review_after(progress.streak, correct, answered_at)
        } else {
            answered_at
        };

        let saved = self.put_record(&progress, "record_answer")?;
        tracing::debug!(
            question_id,
            correct,
            attempts = saved.attempts,
            streak = saved.streak,
            "Recorded answer"
        );
        Ok(saved)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::operations::questions::VerbForm;
use crate::store::{Store, StoreError};

/// One entry of the wrong-answer log shown on the review screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WrongAnswer {
    pub question_id: u64,
    pub form: VerbForm,
    pub user_answer: String,
    pub correct_answer: String,
    pub recorded_at: DateTime<Utc>,
}

impl Store {
    /// Entries in the order they were saved.
    pub fn get_wrong_answers(&self) -> Result<Vec<WrongAnswer>, StoreError> {
        let mut out = Vec::with_capacity(self.wrong_answers.len());
        for item in self.wrong_answers.iter() {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }

    pub fn save_wrong_answer(&self, entry: &WrongAnswer) -> Result<(), StoreError> {
        let sequence = self.raw_db().generate_id()?;
        self.wrong_answers
            .insert(keys::wrong_answer_key(sequence), Self::serialize(entry)?)?;
        Ok(())
    }

    /// Drops the whole log; returns how many entries were removed.
    pub fn clear_wrong_answers(&self) -> Result<usize, StoreError> {
        let removed = self.wrong_answers.len();
        self.wrong_answers.clear()?;
        tracing::info!(removed, "Cleared wrong-answer log");
        Ok(removed)
    }
}

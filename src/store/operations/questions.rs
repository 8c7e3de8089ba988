use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::table::{map_transaction_error, tx_put, Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

/// One of the four conjugation categories every question is tagged with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerbForm {
    Te,
    Ta,
    Nai,
    Ru,
}

impl VerbForm {
    pub const ALL: [VerbForm; 4] = [VerbForm::Te, VerbForm::Ta, VerbForm::Nai, VerbForm::Ru];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Te => "te",
            Self::Ta => "ta",
            Self::Nai => "nai",
            Self::Ru => "ru",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerbType {
    Ichidan,
    Godan,
    Irregular,
}

impl VerbType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ichidan => "ichidan",
            Self::Godan => "godan",
            Self::Irregular => "irregular",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub form: VerbForm,
    pub polite: String,
    pub casual: String,
    pub verb_type: VerbType,
    pub difficulty: u8,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A question as supplied by seed data, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewQuestion {
    pub form: VerbForm,
    pub polite: String,
    pub casual: String,
    pub verb_type: VerbType,
    pub difficulty: u8,
    pub category: String,
}

impl NewQuestion {
    pub fn into_question(self, created_at: DateTime<Utc>) -> Question {
        Question {
            id: None,
            form: self.form,
            polite: self.polite,
            casual: self.casual,
            verb_type: self.verb_type,
            difficulty: self.difficulty,
            category: self.category,
            created_at,
        }
    }
}

impl Record for Question {
    const COLLECTION: Collection = Collection::Questions;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("form", self.form.as_str().to_string()),
            ("verb_type", self.verb_type.as_str().to_string()),
            ("difficulty", self.difficulty.to_string()),
            ("category", self.category.clone()),
        ]
    }
}

impl Question {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        validation::validate_non_empty("polite", &self.polite)?;
        validation::validate_non_empty("casual", &self.casual)?;
        validation::validate_rating("difficulty", self.difficulty)?;
        Ok(())
    }
}

impl Store {
    pub fn add_question(&self, question: &NewQuestion) -> Result<Question, StoreError> {
        let question = question.clone().into_question(Utc::now());
        question.validate().map_err(StoreError::Validation)?;
        self.put_record(&question, "add_question")
    }

    pub fn get_question(&self, id: u64) -> Result<Option<Question>, StoreError> {
        self.get_record(id)
    }

    pub fn count_questions(&self) -> usize {
        self.count_records(Collection::Questions)
    }

    pub fn count_questions_by_form(&self, form: VerbForm) -> Result<usize, StoreError> {
        Ok(self
            .ids_by_index(Collection::Questions, "form", form.as_str())?
            .len())
    }

    /// Questions of one form, `limit` per page, in id order. A page past the
    /// end yields an empty vec.
    pub fn get_questions_paginated(
        &self,
        form: VerbForm,
        page: usize,
        limit: usize,
    ) -> Result<Vec<Question>, StoreError> {
        validation::validate_page(page, limit).map_err(StoreError::Validation)?;
        let offset = (page - 1).saturating_mul(limit);
        self.scan_index("form", form.as_str(), offset, limit)
            .map_err(|e| {
                tracing::error!(form = form.as_str(), page, limit, error = %e, "Failed to fetch question page");
                e
            })
    }

    /// Up to `count` distinct questions of one form, drawn uniformly.
    pub fn get_random_questions(
        &self,
        form: VerbForm,
        count: usize,
    ) -> Result<Vec<Question>, StoreError> {
        self.get_random_questions_with_rng(form, count, &mut rand::thread_rng())
    }

    pub fn get_random_questions_with_rng<R: Rng + ?Sized>(
        &self,
        form: VerbForm,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Question>, StoreError> {
        let ids = self.ids_by_index(Collection::Questions, "form", form.as_str())?;
        if ids.is_empty() || count == 0 {
            return Ok(Vec::new());
        }

        let amount = count.min(ids.len());
        let mut out = Vec::with_capacity(amount);
        for position in rand::seq::index::sample(rng, ids.len(), amount).iter() {
            if let Some(question) = self.get_question(ids[position])? {
                out.push(question);
            }
        }
        Ok(out)
    }

    /// Inserts every question in one transaction; returns the assigned ids in input order.
    pub fn bulk_insert_questions(&self, questions: Vec<NewQuestion>) -> Result<Vec<u64>, StoreError> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Utc::now();
        let rows: Vec<Question> = questions
            .into_iter()
            .map(|q| q.into_question(created_at))
            .collect();
        for (position, row) in rows.iter().enumerate() {
            row.validate().map_err(|msg| StoreError::BulkInsertFailed {
                source: Box::new(StoreError::Validation(format!("question[{position}]: {msg}"))),
            })?;
        }

        let result = (&self.questions, &self.questions_idx, &self.meta)
            .transaction(|(tx_data, tx_idx, tx_meta)| {
                let mut ids = Vec::with_capacity(rows.len());
                for row in &rows {
                    let mut row = row.clone();
                    ids.push(tx_put(tx_data, tx_idx, tx_meta, &mut row)?);
                }
                Ok(ids)
            })
            .map_err(map_transaction_error("bulk_insert_questions"));

        match result {
            Ok(ids) => {
                tracing::info!(count = ids.len(), "Bulk inserted questions");
                Ok(ids)
            }
            Err(e) => {
                tracing::error!(count = rows.len(), error = %e, "Bulk insert of questions failed");
                Err(StoreError::BulkInsertFailed {
                    source: Box::new(e),
                })
            }
        }
    }

    pub fn questions_by_verb_type(&self, verb_type: VerbType) -> Result<Vec<Question>, StoreError> {
        self.scan_index("verb_type", verb_type.as_str(), 0, usize::MAX)
    }

    pub fn questions_by_category(&self, category: &str) -> Result<Vec<Question>, StoreError> {
        self.scan_index("category", category, 0, usize::MAX)
    }

    pub fn questions_by_difficulty(&self, difficulty: u8) -> Result<Vec<Question>, StoreError> {
        self.scan_index("difficulty", &difficulty.to_string(), 0, usize::MAX)
    }

    /// Ids of every question tagged `form`; used by the statistics roll-up.
    pub fn question_ids_by_form(&self, form: VerbForm) -> Result<Vec<u64>, StoreError> {
        self.ids_by_index(Collection::Questions, "form", form.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    use super::*;

    fn new_question(form: VerbForm, polite: &str) -> NewQuestion {
        NewQuestion {
            form,
            polite: polite.to_string(),
            casual: format!("{polite}-casual"),
            verb_type: VerbType::Godan,
            difficulty: 2,
            category: "daily".to_string(),
        }
    }

    fn seeded_store(name: &str) -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join(name)).unwrap();
        store
            .bulk_insert_questions(vec![
                new_question(VerbForm::Te, "行きます"),
                new_question(VerbForm::Te, "書きます"),
                new_question(VerbForm::Te, "読みます"),
                new_question(VerbForm::Ta, "見ます"),
                new_question(VerbForm::Ta, "来ます"),
            ])
            .unwrap();
        (dir, store)
    }

    #[test]
    fn paginates_by_form_in_id_order() {
        let (_dir, store) = seeded_store("paginate-db");

        let first: Vec<u64> = store
            .get_questions_paginated(VerbForm::Te, 1, 2)
            .unwrap()
            .iter()
            .filter_map(|q| q.id)
            .collect();
        let second: Vec<u64> = store
            .get_questions_paginated(VerbForm::Te, 2, 2)
            .unwrap()
            .iter()
            .filter_map(|q| q.id)
            .collect();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![3]);
        assert_eq!(store.get_questions_paginated(VerbForm::Ta, 1, 2).unwrap().len(), 2);
    }

    #[test]
    fn page_past_end_is_empty() {
        let (_dir, store) = seeded_store("paginate-db-2");
        assert!(store
            .get_questions_paginated(VerbForm::Te, 9, 50)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn zero_page_is_rejected() {
        let (_dir, store) = seeded_store("paginate-db-3");
        let err = store.get_questions_paginated(VerbForm::Te, 0, 10).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn random_sample_is_distinct_and_bounded() {
        let (_dir, store) = seeded_store("random-db");
        let mut rng = StdRng::seed_from_u64(7);

        let sample = store
            .get_random_questions_with_rng(VerbForm::Te, 2, &mut rng)
            .unwrap();
        let ids: HashSet<u64> = sample.iter().filter_map(|q| q.id).collect();

        assert_eq!(sample.len(), 2);
        assert_eq!(ids.len(), 2);
        assert!(sample.iter().all(|q| q.form == VerbForm::Te));
    }

    #[test]
    fn random_sample_larger_than_total_returns_all() {
        let (_dir, store) = seeded_store("random-db-2");
        let sample = store.get_random_questions(VerbForm::Ta, 10).unwrap();
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn random_sample_of_empty_form_is_empty() {
        let (_dir, store) = seeded_store("random-db-3");
        assert!(store.get_random_questions(VerbForm::Nai, 10).unwrap().is_empty());
    }

    #[test]
    fn bulk_insert_empty_is_noop() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("bulk-db")).unwrap();
        assert!(store.bulk_insert_questions(Vec::new()).unwrap().is_empty());
        assert_eq!(store.count_questions(), 0);
    }

    #[test]
    fn bulk_insert_rejects_whole_batch_on_invalid_row() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("bulk-db-2")).unwrap();
        let mut bad = new_question(VerbForm::Ru, "食べます");
        bad.difficulty = 9;

        let err = store
            .bulk_insert_questions(vec![new_question(VerbForm::Ru, "寝ます"), bad])
            .unwrap_err();

        assert!(matches!(err, StoreError::BulkInsertFailed { .. }));
        assert_eq!(store.count_questions(), 0);
    }

    #[test]
    fn secondary_lookups_use_indexes() {
        let (_dir, store) = seeded_store("lookup-db");
        assert_eq!(store.questions_by_verb_type(VerbType::Godan).unwrap().len(), 5);
        assert_eq!(store.questions_by_category("daily").unwrap().len(), 5);
        assert!(store.questions_by_difficulty(5).unwrap().is_empty());
    }

    #[test]
    fn category_lookup_is_exact_for_embedded_nul() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("nul-category-db")).unwrap();
        let mut plain = new_question(VerbForm::Te, "食べます");
        plain.category = "food".to_string();
        let mut joined = new_question(VerbForm::Te, "飲みます");
        joined.category = "food\0drink".to_string();
        store.bulk_insert_questions(vec![plain, joined]).unwrap();

        let food = store.questions_by_category("food").unwrap();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].polite, "食べます");
        assert_eq!(store.questions_by_category("food\0drink").unwrap().len(), 1);
    }
}

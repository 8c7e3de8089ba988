use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::table::{Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewQueueItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub question_id: u64,
    pub priority: u8,
    pub due_date: DateTime<Utc>,
    pub review_count: u32,
}

impl Record for ReviewQueueItem {
    const COLLECTION: Collection = Collection::ReviewQueue;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("question_id", keys::id_value(self.question_id)),
            ("priority", self.priority.to_string()),
            ("due_date", keys::timestamp_value(self.due_date)),
        ]
    }
}

impl ReviewQueueItem {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        validation::validate_rating("priority", self.priority)?;
        Ok(())
    }
}

impl Store {
    pub fn enqueue_review(&self, item: &ReviewQueueItem) -> Result<ReviewQueueItem, StoreError> {
        item.validate().map_err(StoreError::Validation)?;
        self.put_record(item, "enqueue_review")
    }

    pub fn get_review(&self, id: u64) -> Result<Option<ReviewQueueItem>, StoreError> {
        self.get_record(id)
    }

    pub fn count_reviews(&self) -> usize {
        self.count_records(Collection::ReviewQueue)
    }

    pub fn reviews_for_question(&self, question_id: u64) -> Result<Vec<ReviewQueueItem>, StoreError> {
        self.scan_index("question_id", &keys::id_value(question_id), 0, usize::MAX)
    }

    /// Items due at `now`, highest priority first, then oldest due date.
    pub fn due_reviews(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReviewQueueItem>, StoreError> {
        let mut due: Vec<ReviewQueueItem> =
            self.scan_index_upto("due_date", &keys::timestamp_value(now))?;
        due.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.due_date.cmp(&b.due_date))
                .then_with(|| a.id.cmp(&b.id))
        });
        due.truncate(limit);
        Ok(due)
    }

    pub fn remove_review(&self, id: u64) -> Result<ReviewQueueItem, StoreError> {
        self.remove_record(id, "remove_review")?
            .ok_or_else(|| StoreError::NotFound {
                entity: "review_queue".to_string(),
                key: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn item(question_id: u64, priority: u8, due_date: DateTime<Utc>) -> ReviewQueueItem {
        ReviewQueueItem {
            id: None,
            question_id,
            priority,
            due_date,
            review_count: 0,
        }
    }

    #[test]
    fn due_reviews_ordered_by_priority() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("review-db")).unwrap();
        let now = Utc::now();

        store.enqueue_review(&item(1, 2, now - Duration::hours(3))).unwrap();
        store.enqueue_review(&item(2, 5, now - Duration::hours(1))).unwrap();
        store.enqueue_review(&item(3, 5, now + Duration::days(1))).unwrap();

        let due = store.due_reviews(now, 10).unwrap();
        let questions: Vec<u64> = due.iter().map(|r| r.question_id).collect();
        assert_eq!(questions, vec![2, 1]);
    }

    #[test]
    fn lookups_by_id_and_question() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("review-db-4")).unwrap();
        let now = Utc::now();
        let first = store.enqueue_review(&item(7, 1, now)).unwrap();
        store.enqueue_review(&item(7, 4, now + Duration::days(2))).unwrap();
        store.enqueue_review(&item(8, 3, now)).unwrap();

        assert_eq!(store.get_review(first.id.unwrap()).unwrap(), Some(first));
        assert_eq!(store.reviews_for_question(7).unwrap().len(), 2);
        assert!(store.reviews_for_question(9).unwrap().is_empty());
    }

    #[test]
    fn priority_out_of_range_rejected() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("review-db-2")).unwrap();
        let err = store.enqueue_review(&item(1, 0, Utc::now())).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn remove_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("review-db-3")).unwrap();
        let saved = store.enqueue_review(&item(4, 3, Utc::now())).unwrap();

        store.remove_review(saved.id.unwrap()).unwrap();
        assert_eq!(store.count_reviews(), 0);
        assert!(matches!(
            store.remove_review(saved.id.unwrap()).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }
}

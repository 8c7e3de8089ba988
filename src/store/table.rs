//! Generic record access shared by every collection.
//!
//! Each collection is a pair of sled trees: the data tree keyed by the
//! big-endian record id, and an index tree holding one empty-valued entry per
//! declared secondary index (see [`keys::index_key`]). Both are always written
//! inside the same transaction together with the `meta` tree, which holds the
//! per-collection id sequence.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;

use crate::store::keys;
use crate::store::trees;
use crate::store::{Store, StoreError};

const EMPTY: &[u8] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Questions,
    UserProgress,
    Statistics,
    GrammarRules,
    UserSettings,
    ReviewQueue,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Questions,
        Collection::UserProgress,
        Collection::Statistics,
        Collection::GrammarRules,
        Collection::UserSettings,
        Collection::ReviewQueue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Questions => trees::QUESTIONS,
            Self::UserProgress => trees::USER_PROGRESS,
            Self::Statistics => trees::STATISTICS,
            Self::GrammarRules => trees::GRAMMAR_RULES,
            Self::UserSettings => trees::USER_SETTINGS,
            Self::ReviewQueue => trees::REVIEW_QUEUE,
        }
    }
}

/// A row stored in one of the six collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;

    fn id(&self) -> Option<u64>;

    fn assign_id(&mut self, id: u64);

    /// `(field, value)` pairs for the declared secondary indexes.
    fn index_entries(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl Store {
    pub fn data_tree(&self, collection: Collection) -> &sled::Tree {
        match collection {
            Collection::Questions => &self.questions,
            Collection::UserProgress => &self.user_progress,
            Collection::Statistics => &self.statistics,
            Collection::GrammarRules => &self.grammar_rules,
            Collection::UserSettings => &self.user_settings,
            Collection::ReviewQueue => &self.review_queue,
        }
    }

    pub fn index_tree(&self, collection: Collection) -> &sled::Tree {
        match collection {
            Collection::Questions => &self.questions_idx,
            Collection::UserProgress => &self.user_progress_idx,
            Collection::Statistics => &self.statistics_idx,
            Collection::GrammarRules => &self.grammar_rules_idx,
            Collection::UserSettings => &self.user_settings_idx,
            Collection::ReviewQueue => &self.review_queue_idx,
        }
    }

    pub fn count_records(&self, collection: Collection) -> usize {
        self.data_tree(collection).len()
    }

    pub(crate) fn get_record<R: Record>(&self, id: u64) -> Result<Option<R>, StoreError> {
        match self.data_tree(R::COLLECTION).get(keys::id_key(id))? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// All rows of a collection in id order.
    pub(crate) fn list_records<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let mut out = Vec::with_capacity(self.count_records(R::COLLECTION));
        for item in self.data_tree(R::COLLECTION).iter() {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }

    pub(crate) fn first_record<R: Record>(&self) -> Result<Option<R>, StoreError> {
        match self.data_tree(R::COLLECTION).first()? {
            Some((_, value)) => Ok(Some(Self::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Ids matching `field == value`, in id order.
    pub(crate) fn ids_by_index(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<u64>, StoreError> {
        let prefix = keys::index_prefix(field, value);
        let mut ids = Vec::new();
        for item in self.index_tree(collection).scan_prefix(&prefix) {
            let (key, _) = item?;
            if let Some(id) = keys::id_from_index_key(&key) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Rows matching `field == value`, skipping `offset` matches and returning at most `limit`.
    pub(crate) fn scan_index<R: Record>(
        &self,
        field: &str,
        value: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<R>, StoreError> {
        let prefix = keys::index_prefix(field, value);
        let mut out = Vec::new();
        for item in self
            .index_tree(R::COLLECTION)
            .scan_prefix(&prefix)
            .skip(offset)
            .take(limit)
        {
            let (key, _) = item?;
            let Some(id) = keys::id_from_index_key(&key) else {
                continue;
            };
            // Index entries never outlive their row inside a transaction, but
            // tolerate a dangling entry left by a crash mid-migration.
            if let Some(record) = self.get_record(id)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Rows whose `field` value is lexically `<= upper`, in value order.
    pub(crate) fn scan_index_upto<R: Record>(
        &self,
        field: &str,
        upper: &str,
    ) -> Result<Vec<R>, StoreError> {
        let start = keys::index_field_prefix(field);
        let end = keys::index_upper_bound(field, upper);
        let mut out = Vec::new();
        for item in self.index_tree(R::COLLECTION).range(start..end) {
            let (key, _) = item?;
            if let Some(id) = keys::id_from_index_key(&key) {
                if let Some(record) = self.get_record(id)? {
                    out.push(record);
                }
            }
        }
        Ok(out)
    }

    /// Inserts a row, assigning a fresh id unless it already carries one.
    pub(crate) fn put_record<R: Record>(
        &self,
        record: &R,
        operation: &'static str,
    ) -> Result<R, StoreError> {
        let collection = R::COLLECTION;
        (
            self.data_tree(collection),
            self.index_tree(collection),
            &self.meta,
        )
            .transaction(|(tx_data, tx_idx, tx_meta)| {
                let mut row = record.clone();
                tx_put(tx_data, tx_idx, tx_meta, &mut row)?;
                Ok(row)
            })
            .map_err(map_transaction_error(operation))
    }

    pub(crate) fn remove_record<R: Record>(
        &self,
        id: u64,
        operation: &'static str,
    ) -> Result<Option<R>, StoreError> {
        let collection = R::COLLECTION;
        (self.data_tree(collection), self.index_tree(collection))
            .transaction(|(tx_data, tx_idx)| tx_remove::<R>(tx_data, tx_idx, id))
            .map_err(map_transaction_error(operation))
    }
}

/// Writes `record` and its index entries, replacing the index entries of any
/// previous row with the same id.
pub(crate) fn tx_put<R: Record>(
    tx_data: &TransactionalTree,
    tx_idx: &TransactionalTree,
    tx_meta: &TransactionalTree,
    record: &mut R,
) -> ConflictableTransactionResult<u64, StoreError> {
    let id = match record.id() {
        Some(id) => {
            advance_sequence(tx_meta, R::COLLECTION, id)?;
            id
        }
        None => {
            let id = next_id(tx_meta, R::COLLECTION)?;
            record.assign_id(id);
            id
        }
    };

    let key = keys::id_key(id);
    if let Some(previous) = tx_data.get(&key[..])? {
        let previous: R = Store::deserialize(&previous).map_err(ConflictableTransactionError::Abort)?;
        for (field, value) in previous.index_entries() {
            tx_idx.remove(keys::index_key(field, &value, id))?;
        }
    }

    let bytes = Store::serialize(record).map_err(ConflictableTransactionError::Abort)?;
    tx_data.insert(&key[..], bytes)?;
    for (field, value) in record.index_entries() {
        tx_idx.insert(keys::index_key(field, &value, id), EMPTY)?;
    }
    Ok(id)
}

pub(crate) fn tx_remove<R: Record>(
    tx_data: &TransactionalTree,
    tx_idx: &TransactionalTree,
    id: u64,
) -> ConflictableTransactionResult<Option<R>, StoreError> {
    let key = keys::id_key(id);
    let Some(raw) = tx_data.remove(&key[..])? else {
        return Ok(None);
    };
    let previous: R = Store::deserialize(&raw).map_err(ConflictableTransactionError::Abort)?;
    for (field, value) in previous.index_entries() {
        tx_idx.remove(keys::index_key(field, &value, id))?;
    }
    Ok(Some(previous))
}

fn read_sequence(
    tx_meta: &TransactionalTree,
    collection: Collection,
) -> ConflictableTransactionResult<u64, StoreError> {
    let key = keys::sequence_key(collection);
    Ok(tx_meta
        .get(key.as_bytes())?
        .and_then(|raw| keys::decode_id(&raw))
        .unwrap_or(0))
}

fn next_id(
    tx_meta: &TransactionalTree,
    collection: Collection,
) -> ConflictableTransactionResult<u64, StoreError> {
    let next = read_sequence(tx_meta, collection)? + 1;
    let key = keys::sequence_key(collection);
    tx_meta.insert(key.as_bytes(), &keys::id_key(next)[..])?;
    Ok(next)
}

/// Explicit ids (from import) push the sequence forward so they are never handed out again.
fn advance_sequence(
    tx_meta: &TransactionalTree,
    collection: Collection,
    id: u64,
) -> ConflictableTransactionResult<(), StoreError> {
    if id > read_sequence(tx_meta, collection)? {
        let key = keys::sequence_key(collection);
        tx_meta.insert(key.as_bytes(), &keys::id_key(id)[..])?;
    }
    Ok(())
}

pub(crate) fn map_transaction_error(
    operation: &'static str,
) -> impl Fn(TransactionError<StoreError>) -> StoreError {
    move |err| match err {
        TransactionError::Abort(store_err) => store_err,
        TransactionError::Storage(sled_err) => {
            tracing::error!(operation, error = %sled_err, "Store transaction failed");
            StoreError::TransactionFailed {
                operation,
                message: sled_err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::store::operations::questions::{Question, VerbForm, VerbType};

    fn question(form: VerbForm) -> Question {
        Question {
            id: None,
            form,
            polite: "食べます".to_string(),
            casual: "食べる".to_string(),
            verb_type: VerbType::Ichidan,
            difficulty: 1,
            category: "food".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn put_assigns_sequential_ids_per_collection() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("table-db")).unwrap();

        let first = store.put_record(&question(VerbForm::Te), "test").unwrap();
        let second = store.put_record(&question(VerbForm::Ta), "test").unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[test]
    fn overwrite_moves_index_entries() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("table-db-2")).unwrap();

        let mut row = store.put_record(&question(VerbForm::Te), "test").unwrap();
        row.form = VerbForm::Nai;
        store.put_record(&row, "test").unwrap();

        assert!(store
            .ids_by_index(Collection::Questions, "form", "te")
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .ids_by_index(Collection::Questions, "form", "nai")
                .unwrap(),
            vec![1]
        );
    }

    #[test]
    fn explicit_id_advances_sequence() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("table-db-3")).unwrap();

        let mut row = question(VerbForm::Te);
        row.id = Some(7);
        store.put_record(&row, "test").unwrap();
        let next = store.put_record(&question(VerbForm::Te), "test").unwrap();

        assert_eq!(next.id, Some(8));
    }

    #[test]
    fn remove_clears_index_entries() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("table-db-4")).unwrap();

        let row = store.put_record(&question(VerbForm::Ru), "test").unwrap();
        let removed: Option<Question> = store.remove_record(1, "test").unwrap();

        assert_eq!(removed.map(|q| q.id), Some(row.id));
        assert_eq!(store.index_tree(Collection::Questions).len(), 0);
    }
}

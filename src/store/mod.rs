pub mod keys;
pub mod migrate;
pub mod operations;
pub mod table;
pub mod trees;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

use crate::store::table::Collection;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub questions: sled::Tree,
    pub user_progress: sled::Tree,
    pub statistics: sled::Tree,
    pub grammar_rules: sled::Tree,
    pub user_settings: sled::Tree,
    pub review_queue: sled::Tree,
    // Secondary index trees
    pub questions_idx: sled::Tree,
    pub user_progress_idx: sled::Tree,
    pub statistics_idx: sled::Tree,
    pub grammar_rules_idx: sled::Tree,
    pub user_settings_idx: sled::Tree,
    pub review_queue_idx: sled::Tree,
    pub meta: sled::Tree,
    pub app_state: sled::Tree,
    pub wrong_answers: sled::Tree,
    // Serializes read-modify-write helpers that pick an existing row by lookup.
    write_lock: Mutex<()>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("schema migration failed at version {version}: {message}")]
    SchemaMigrationFailed { version: u32, message: String },
    #[error("bulk insert failed: {source}")]
    BulkInsertFailed {
        #[source]
        source: Box<StoreError>,
    },
    #[error("transaction failed: operation={operation}, {message}")]
    TransactionFailed {
        operation: &'static str,
        message: String,
    },
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
}

/// Record counts per collection, reported after the store opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub questions: usize,
    pub user_progress: usize,
    pub statistics: usize,
    pub grammar_rules: usize,
    pub user_settings: usize,
    pub review_queue: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub ready: bool,
    pub schema_version: u32,
    pub counts: CollectionCounts,
}

impl Store {
    pub fn open(sled_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = sled_path.as_ref();
        let db = sled::open(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to open study store");
            StoreError::StorageUnavailable(e.to_string())
        })?;
        let open_tree = |name: &str| {
            db.open_tree(name).map_err(|e| {
                tracing::error!(tree = name, error = %e, "Failed to open tree");
                StoreError::StorageUnavailable(e.to_string())
            })
        };

        let questions = open_tree(trees::QUESTIONS)?;
        let user_progress = open_tree(trees::USER_PROGRESS)?;
        let statistics = open_tree(trees::STATISTICS)?;
        let grammar_rules = open_tree(trees::GRAMMAR_RULES)?;
        let user_settings = open_tree(trees::USER_SETTINGS)?;
        let review_queue = open_tree(trees::REVIEW_QUEUE)?;
        // Secondary index trees
        let questions_idx = open_tree(trees::QUESTIONS_IDX)?;
        let user_progress_idx = open_tree(trees::USER_PROGRESS_IDX)?;
        let statistics_idx = open_tree(trees::STATISTICS_IDX)?;
        let grammar_rules_idx = open_tree(trees::GRAMMAR_RULES_IDX)?;
        let user_settings_idx = open_tree(trees::USER_SETTINGS_IDX)?;
        let review_queue_idx = open_tree(trees::REVIEW_QUEUE_IDX)?;
        let meta = open_tree(trees::META)?;
        let app_state = open_tree(trees::APP_STATE)?;
        let wrong_answers = open_tree(trees::WRONG_ANSWERS)?;

        Ok(Self {
            db,
            questions,
            user_progress,
            statistics,
            grammar_rules,
            user_settings,
            review_queue,
            questions_idx,
            user_progress_idx,
            statistics_idx,
            grammar_rules_idx,
            user_settings_idx,
            review_queue_idx,
            meta,
            app_state,
            wrong_answers,
            write_lock: Mutex::new(()),
        })
    }

    /// Opens the store, brings the schema up to date and reports readiness.
    pub fn initialize(sled_path: impl AsRef<Path>) -> Result<(Self, InitReport), StoreError> {
        let store = Self::open(sled_path)?;
        store.run_migrations()?;
        let report = InitReport {
            ready: true,
            schema_version: migrate::get_current_version(&store)?,
            counts: store.collection_counts(),
        };
        tracing::info!(
            schema_version = report.schema_version,
            questions = report.counts.questions,
            user_progress = report.counts.user_progress,
            statistics = report.counts.statistics,
            grammar_rules = report.counts.grammar_rules,
            user_settings = report.counts.user_settings,
            review_queue = report.counts.review_queue,
            "Study store ready"
        );
        Ok((store, report))
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn collection_counts(&self) -> CollectionCounts {
        CollectionCounts {
            questions: self.count_records(Collection::Questions),
            user_progress: self.count_records(Collection::UserProgress),
            statistics: self.count_records(Collection::Statistics),
            grammar_rules: self.count_records(Collection::GrammarRules),
            user_settings: self.count_records(Collection::UserSettings),
            review_queue: self.count_records(Collection::ReviewQueue),
        }
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Held across lookup-then-write sequences so two callers cannot both
    /// miss the row and insert twice. Not re-entrant.
    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sled::Transactional;

use crate::store::operations::progress::UserProgress;
use crate::store::operations::questions::Question;
use crate::store::operations::settings::UserSettings;
use crate::store::operations::statistics::Statistics;
use crate::store::table::{map_transaction_error, tx_put};
use crate::store::{Store, StoreError};

/// Full backup of the four user-data collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSnapshot {
    pub questions: Vec<Question>,
    pub user_progress: Vec<UserProgress>,
    pub statistics: Vec<Statistics>,
    pub user_settings: Vec<UserSettings>,
    pub exported_at: DateTime<Utc>,
}

/// Import payload; a collection left as `None` is not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportSnapshot {
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub user_progress: Option<Vec<UserProgress>>,
    #[serde(default)]
    pub statistics: Option<Vec<Statistics>>,
    #[serde(default)]
    pub user_settings: Option<Vec<UserSettings>>,
}

impl From<ExportSnapshot> for ImportSnapshot {
    fn from(snapshot: ExportSnapshot) -> Self {
        Self {
            questions: Some(snapshot.questions),
            user_progress: Some(snapshot.user_progress),
            statistics: Some(snapshot.statistics),
            user_settings: Some(snapshot.user_settings),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub questions: usize,
    pub user_progress: usize,
    pub statistics: usize,
    pub user_settings: usize,
}

impl ImportSnapshot {
    /// Parses raw JSON, naming the offending collection and row on failure.
    pub fn from_json(raw: &Value) -> Result<Self, StoreError> {
        let object = raw.as_object().ok_or_else(|| {
            StoreError::MalformedSnapshot("snapshot must be a JSON object".to_string())
        })?;

        let snapshot = Self {
            questions: parse_collection(object.get("questions"), "questions")?,
            user_progress: parse_collection(object.get("user_progress"), "user_progress")?,
            statistics: parse_collection(object.get("statistics"), "statistics")?,
            user_settings: parse_collection(object.get("user_settings"), "user_settings")?,
        };

        if snapshot.questions.is_none()
            && snapshot.user_progress.is_none()
            && snapshot.statistics.is_none()
            && snapshot.user_settings.is_none()
        {
            return Err(StoreError::MalformedSnapshot(
                "snapshot contains none of questions, user_progress, statistics, user_settings"
                    .to_string(),
            ));
        }
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_rows(&self.questions, "questions", Question::validate)?;
        validate_rows(&self.user_progress, "user_progress", UserProgress::validate)?;
        validate_rows(&self.statistics, "statistics", Statistics::validate)?;
        validate_rows(&self.user_settings, "user_settings", UserSettings::validate)?;
        Ok(())
    }
}

fn parse_collection<R: DeserializeOwned>(
    raw: Option<&Value>,
    name: &'static str,
) -> Result<Option<Vec<R>>, StoreError> {
    let items = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(StoreError::MalformedSnapshot(format!(
                "{name} must be an array"
            )))
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let row = R::deserialize(item).map_err(|e| {
            StoreError::MalformedSnapshot(format!("{name}[{position}]: {e}"))
        })?;
        rows.push(row);
    }
    Ok(Some(rows))
}

fn validate_rows<R>(
    rows: &Option<Vec<R>>,
    name: &'static str,
    check: fn(&R) -> Result<(), String>,
) -> Result<(), StoreError> {
    for (position, row) in rows.iter().flatten().enumerate() {
        check(row).map_err(|msg| StoreError::MalformedSnapshot(format!("{name}[{position}]: {msg}")))?;
    }
    Ok(())
}

impl Store {
    pub fn export_data(&self) -> Result<ExportSnapshot, StoreError> {
        let snapshot = ExportSnapshot {
            questions: self.list_records()?,
            user_progress: self.list_records()?,
            statistics: self.list_records()?,
            user_settings: self.list_records()?,
            exported_at: Utc::now(),
        };
        tracing::info!(
            questions = snapshot.questions.len(),
            user_progress = snapshot.user_progress.len(),
            statistics = snapshot.statistics.len(),
            user_settings = snapshot.user_settings.len(),
            "Exported study data"
        );
        Ok(snapshot)
    }

    pub fn import_data_json(&self, raw: &Value) -> Result<ImportSummary, StoreError> {
        let snapshot = ImportSnapshot::from_json(raw).map_err(|e| {
            tracing::warn!(error = %e, "Rejected malformed snapshot");
            e
        })?;
        self.import_data(&snapshot)
    }

    /// Upserts every row by id across the four collections in one transaction.
    /// Rows missing from the snapshot are left as they are.
    pub fn import_data(&self, snapshot: &ImportSnapshot) -> Result<ImportSummary, StoreError> {
        snapshot.validate().map_err(|e| {
            tracing::warn!(error = %e, "Rejected malformed snapshot");
            e
        })?;

        let trees = [
            &self.questions,
            &self.questions_idx,
            &self.user_progress,
            &self.user_progress_idx,
            &self.statistics,
            &self.statistics_idx,
            &self.user_settings,
            &self.user_settings_idx,
            &self.meta,
        ];

        trees
            .as_slice()
            .transaction(|tx| {
                let meta = &tx[8];
                for row in snapshot.questions.iter().flatten() {
                    tx_put(&tx[0], &tx[1], meta, &mut row.clone())?;
                }
                for row in snapshot.user_progress.iter().flatten() {
                    tx_put(&tx[2], &tx[3], meta, &mut row.clone())?;
                }
                for row in snapshot.statistics.iter().flatten() {
                    tx_put(&tx[4], &tx[5], meta, &mut row.clone())?;
                }
                for row in snapshot.user_settings.iter().flatten() {
                    tx_put(&tx[6], &tx[7], meta, &mut row.clone())?;
                }
                Ok(())
            })
            .map_err(|e| {
                let err = map_transaction_error("import_data")(e);
                tracing::error!(error = %err, "Import failed, nothing was written");
                err
            })?;

        let summary = ImportSummary {
            questions: snapshot.questions.as_ref().map_or(0, Vec::len),
            user_progress: snapshot.user_progress.as_ref().map_or(0, Vec::len),
            statistics: snapshot.statistics.as_ref().map_or(0, Vec::len),
            user_settings: snapshot.user_settings.as_ref().map_or(0, Vec::len),
        };
        tracing::info!(
            questions = summary.questions,
            user_progress = summary.user_progress,
            statistics = summary.statistics,
            user_settings = summary.user_settings,
            "Imported study data"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::store::operations::questions::{NewQuestion, VerbForm, VerbType};
    use crate::store::CollectionCounts;

    fn seed(store: &Store) {
        store
            .bulk_insert_questions(vec![
                NewQuestion {
                    form: VerbForm::Nai,
                    polite: "知りません".to_string(),
                    casual: "知らない".to_string(),
                    verb_type: VerbType::Godan,
                    difficulty: 3,
                    category: "knowledge".to_string(),
                },
                NewQuestion {
                    form: VerbForm::Ru,
                    polite: "来ます".to_string(),
                    casual: "来る".to_string(),
                    verb_type: VerbType::Irregular,
                    difficulty: 4,
                    category: "motion".to_string(),
                },
            ])
            .unwrap();
        store.record_answer(1, true, Utc::now()).unwrap();
        store.save_user_settings(&UserSettings::default()).unwrap();
    }

    #[test]
    fn export_import_round_trip_is_stable() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("snapshot-db")).unwrap();
        seed(&store);

        let before = store.export_data().unwrap();
        store.import_data(&before.clone().into()).unwrap();
        let after = store.export_data().unwrap();

        assert_eq!(before.questions, after.questions);
        assert_eq!(before.user_progress, after.user_progress);
        assert_eq!(before.statistics, after.statistics);
        assert_eq!(before.user_settings, after.user_settings);
    }

    #[test]
    fn import_overwrites_existing_id_and_keeps_others() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("snapshot-db-2")).unwrap();
        seed(&store);

        let raw = json!({
            "questions": [{
                "id": 1,
                "form": "te",
                "polite": "待ちます",
                "casual": "待って",
                "verb_type": "godan",
                "difficulty": 2,
                "category": "time",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        });
        let summary = store.import_data_json(&raw).unwrap();

        assert_eq!(summary.questions, 1);
        assert_eq!(store.count_questions(), 2);
        let replaced = store.get_question(1).unwrap().unwrap();
        assert_eq!(replaced.form, VerbForm::Te);
        assert_eq!(store.count_questions_by_form(VerbForm::Nai).unwrap(), 0);
        assert!(store.get_question(2).unwrap().is_some());
    }

    #[test]
    fn import_of_new_id_creates_row_with_that_id() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("snapshot-db-3")).unwrap();

        let raw = json!({
            "questions": [{
                "id": 5,
                "form": "ta",
                "polite": "買いました",
                "casual": "買った",
                "verb_type": "godan",
                "difficulty": 1,
                "category": "shopping",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        });
        store.import_data_json(&raw).unwrap();

        assert!(store.get_question(5).unwrap().is_some());
        let ids = store
            .bulk_insert_questions(vec![NewQuestion {
                form: VerbForm::Ta,
                polite: "売りました".to_string(),
                casual: "売った".to_string(),
                verb_type: VerbType::Godan,
                difficulty: 1,
                category: "shopping".to_string(),
            }])
            .unwrap();
        assert_eq!(ids, vec![6]);
    }

    #[test]
    fn malformed_snapshots_are_rejected_without_writes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("snapshot-db-4")).unwrap();

        let cases = [
            json!([1, 2, 3]),
            json!({}),
            json!({ "questions": "nope" }),
            json!({ "questions": [{ "id": 1, "form": "te" }] }),
            json!({ "questions": [{
                "id": 1, "form": "masu", "polite": "a", "casual": "b",
                "verb_type": "godan", "difficulty": 1, "category": "c",
                "created_at": "2024-01-01T00:00:00Z"
            }] }),
            json!({ "user_settings": [{
                "id": 0, "theme": "dark", "language": "ja", "daily_goal": 3,
                "notifications": true, "spaced_repetition": false
            }] }),
        ];

        for raw in cases {
            let err = store.import_data_json(&raw).unwrap_err();
            assert!(
                matches!(err, StoreError::MalformedSnapshot(_)),
                "expected MalformedSnapshot for {raw}, got {err:?}"
            );
        }
        assert_eq!(store.collection_counts(), CollectionCounts::default());
    }

    #[test]
    fn export_serializes_expected_keys() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("snapshot-db-5")).unwrap();
        seed(&store);

        let value = serde_json::to_value(store.export_data().unwrap()).unwrap();
        for key in ["questions", "user_progress", "statistics", "user_settings", "exported_at"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["questions"][0]["verb_type"], "godan");
    }
}

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::operations::questions::VerbForm;
use crate::store::table::{Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

/// Per-form roll-up. `accuracy_rate` is a ratio in 0.0..=1.0 and
/// `average_time` is seconds per answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub form: VerbForm,
    pub total_questions: u64,
    pub correct_answers: u64,
    pub accuracy_rate: f64,
    pub average_time: f64,
    pub last_updated: DateTime<Utc>,
}

impl Record for Statistics {
    const COLLECTION: Collection = Collection::Statistics;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("form", self.form.as_str().to_string()),
            ("last_updated", keys::timestamp_value(self.last_updated)),
        ]
    }
}

impl Statistics {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        validation::validate_ratio("accuracy_rate", self.accuracy_rate)?;
        if !self.average_time.is_finite() || self.average_time < 0.0 {
            return Err(format!(
                "average_time must be a non-negative number, got {}",
                self.average_time
            ));
        }
        Ok(())
    }
}

/// Display-only aggregate; the three parts are read independently.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub statistics: Vec<Statistics>,
    pub total_progress: usize,
    pub total_questions: usize,
    pub generated_at: DateTime<Utc>,
}

impl Store {
    pub fn list_statistics(&self) -> Result<Vec<Statistics>, StoreError> {
        self.list_records()
    }

    pub fn statistics_for_form(&self, form: VerbForm) -> Result<Option<Statistics>, StoreError> {
        let mut rows: Vec<Statistics> = self.scan_index("form", form.as_str(), 0, 1)?;
        Ok(rows.pop())
    }

    /// Writes the row for `stats.form`, reusing the existing row's id.
    pub fn upsert_statistics_for_form(&self, stats: &Statistics) -> Result<Statistics, StoreError> {
        stats.validate().map_err(StoreError::Validation)?;
        let mut row = stats.clone();
        let _guard = self.write_guard();
        if row.id.is_none() {
            row.id = self.statistics_for_form(stats.form)?.and_then(|s| s.id);
        }
        self.put_record(&row, "upsert_statistics_for_form")
    }

    pub fn get_statistics_summary(&self) -> Result<StatisticsSummary, StoreError> {
        let statistics = self.list_statistics().map_err(|e| {
            tracing::error!(error = %e, "Failed to read statistics");
            e
        })?;
        Ok(StatisticsSummary {
            statistics,
            total_progress: self.count_progress(),
            total_questions: self.count_questions(),
            generated_at: Utc::now(),
        })
    }

    /// Rebuilds one statistics row per form from questions and progress.
    pub fn recompute_statistics(&self, now: DateTime<Utc>) -> Result<Vec<Statistics>, StoreError> {
        let progress = self.list_progress()?;
        let mut out = Vec::with_capacity(VerbForm::ALL.len());

        for form in VerbForm::ALL {
            let question_ids: HashSet<u64> = self.question_ids_by_form(form)?.into_iter().collect();
            let answered: Vec<_> = progress
                .iter()
                .filter(|p| question_ids.contains(&p.question_id))
                .collect();
            let correct_answers = answered.iter().filter(|p| p.correct).count() as u64;
            let accuracy_rate = if answered.is_empty() {
                0.0
            } else {
                correct_answers as f64 / answered.len() as f64
            };
            let average_time = self
                .statistics_for_form(form)?
                .map(|s| s.average_time)
                .unwrap_or(0.0);

            let row = self.upsert_statistics_for_form(&Statistics {
                id: None,
                form,
                total_questions: question_ids.len() as u64,
                correct_answers,
                accuracy_rate,
                average_time,
                last_updated: now,
            })?;
            out.push(row);
        }

        tracing::info!(forms = out.len(), progress_rows = progress.len(), "Statistics recomputed");
        Ok(out)
    }
}

use chrono::Utc;

use crate::store::Store;

pub async fn run(store: &Store) {
    tracing::debug!("statistics_rollup: start");
    match store.recompute_statistics(Utc::now()) {
        Ok(rows) => tracing::info!(forms = rows.len(), "statistics_rollup: done"),
        Err(e) => tracing::error!(error = %e, "statistics_rollup failed"),
    }
}

use serde::Serialize;
use sled::Transactional;

use crate::store::table::{map_transaction_error, Collection};
use crate::store::{Store, StoreError};

/// Collections emptied by a reset. Grammar rules and settings survive it.
pub const RESETTABLE_COLLECTIONS: [Collection; 4] = [
    Collection::Questions,
    Collection::UserProgress,
    Collection::Statistics,
    Collection::ReviewQueue,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearSummary {
    pub questions: usize,
    pub user_progress: usize,
    pub statistics: usize,
    pub review_queue: usize,
}

impl Store {
    /// Empties the resettable collections and their indexes in one transaction.
    ///
    /// Keys are collected before the transaction starts; rows written
    /// concurrently after collection survive the reset.
    pub fn clear_all_data(&self) -> Result<ClearSummary, StoreError> {
        let mut trees: Vec<&sled::Tree> = Vec::with_capacity(RESETTABLE_COLLECTIONS.len() * 2);
        let mut doomed: Vec<Vec<sled::IVec>> = Vec::with_capacity(trees.capacity());
        for collection in RESETTABLE_COLLECTIONS {
            for tree in [self.data_tree(collection), self.index_tree(collection)] {
                let mut keys = Vec::with_capacity(tree.len());
                for item in tree.iter().keys() {
                    keys.push(item?);
                }
                trees.push(tree);
                doomed.push(keys);
            }
        }

        trees
            .as_slice()
            .transaction(|tx_trees| {
                for (tx_tree, keys) in tx_trees.iter().zip(&doomed) {
                    for key in keys {
                        tx_tree.remove(key.clone())?;
                    }
                }
                Ok(())
            })
            .map_err(|e| {
                let err = map_transaction_error("clear_all_data")(e);
                tracing::error!(error = %err, "Failed to clear study data");
                err
            })?;

        // data trees sit at even positions
        let summary = ClearSummary {
            questions: doomed[0].len(),
            user_progress: doomed[2].len(),
            statistics: doomed[4].len(),
            review_queue: doomed[6].len(),
        };
        tracing::info!(
            questions = summary.questions,
            user_progress = summary.user_progress,
            statistics = summary.statistics,
            review_queue = summary.review_queue,
            "Cleared study data"
        );
        Ok(summary)
    }
}

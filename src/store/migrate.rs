use crate::store::keys;
use crate::store::operations::grammar_rules::GrammarRule;
use crate::store::operations::progress::UserProgress;
use crate::store::operations::questions::Question;
use crate::store::operations::review_queue::ReviewQueueItem;
use crate::store::operations::settings::UserSettings;
use crate::store::operations::statistics::Statistics;
use crate::store::table::{map_transaction_error, Record};
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_secondary_indexes", m002_secondary_indexes),
        ("003_id_sequences", m003_id_sequences),
        ("004_escaped_index_values", m004_escaped_index_values),
    ]
}

pub fn latest_version() -> u32 {
    migrations().len() as u32
}

/// Applies every migration newer than the persisted schema version.
///
/// Each migration must be idempotent: the process can stop after a migration
/// body succeeds but before its version is recorded, and the body then runs
/// again on the next start. A store written by a newer build is refused.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let latest = latest_version();
    if current > latest {
        tracing::error!(current, latest, "Store schema is newer than this build");
        return Err(StoreError::SchemaMigrationFailed {
            version: current,
            message: format!("store schema version {current} is newer than supported {latest}"),
        });
    }

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store).map_err(|e| {
                tracing::error!(version, name, error = %e, "Migration failed");
                StoreError::SchemaMigrationFailed {
                    version,
                    message: e.to_string(),
                }
            })?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| {
                tracing::error!(len = raw.len(), "Stored schema version is unreadable");
                StoreError::SchemaMigrationFailed {
                    version: 0,
                    message: format!(
                        "stored schema version is {} bytes, expected 4",
                        raw.len()
                    ),
                }
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::SchemaMigrationFailed {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes()[..])?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_secondary_indexes(store: &Store) -> Result<(), StoreError> {
    rebuild_index::<Question>(store)?;
    rebuild_index::<UserProgress>(store)?;
    rebuild_index::<Statistics>(store)?;
    rebuild_index::<GrammarRule>(store)?;
    rebuild_index::<UserSettings>(store)?;
    rebuild_index::<ReviewQueueItem>(store)?;
    Ok(())
}

fn m003_id_sequences(store: &Store) -> Result<(), StoreError> {
    for collection in crate::store::table::Collection::ALL {
        let max_id = match store.data_tree(collection).last()? {
            Some((key, _)) => keys::decode_id(&key).unwrap_or(0),
            None => 0,
        };
        let seq_key = keys::sequence_key(collection);
        let current = store
            .meta
            .get(seq_key.as_bytes())?
            .and_then(|raw| keys::decode_id(&raw))
            .unwrap_or(0);
        if max_id > current {
            store
                .meta
                .insert(seq_key.as_bytes(), &keys::id_key(max_id)[..])?;
        }
    }
    Ok(())
}

/// Free-text index values are escaped; only question categories carry free text.
fn m004_escaped_index_values(store: &Store) -> Result<(), StoreError> {
    rebuild_index::<Question>(store)
}

/// Drops and recreates the index entries of one collection from its rows.
pub fn rebuild_index<R: Record>(store: &Store) -> Result<(), StoreError> {
    let collection = R::COLLECTION;
    let mut stale = Vec::new();
    for item in store.index_tree(collection).iter() {
        let (key, _) = item?;
        stale.push(key);
    }

    let mut fresh = Vec::new();
    for item in store.data_tree(collection).iter() {
        let (key, value) = item?;
        let Some(id) = keys::decode_id(&key) else {
            continue;
        };
        let record: R = Store::deserialize(&value)?;
        for (field, value) in record.index_entries() {
            fresh.push(keys::index_key(field, &value, id));
        }
    }

    store
        .index_tree(collection)
        .transaction(|tx_idx| {
            for key in &stale {
                tx_idx.remove(key.clone())?;
            }
            for key in &fresh {
                tx_idx.insert(key.as_slice(), &[] as &[u8])?;
            }
            Ok(())
        })
        .map_err(map_transaction_error("rebuild_index"))?;

    tracing::debug!(
        collection = collection.as_str(),
        entries = fresh.len(),
        "Rebuilt secondary index"
    );
    Ok(())
}

//! # Snapshot Store
//!
//! Persists the current ledger state on sled. The ledger is a single
//! owned store, so the whole of it is written as one bincode blob under a
//! fixed key. No history is kept: each save replaces the previous snapshot.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                | Value                    |
//! |-------------|--------------------|--------------------------|
//! | `snapshots` | `campus`           | `bincode(snapshot)`      |
//! | `snapshots` | `protocol_version` | version string (UTF-8)   |
//!
//! Both keys are written in one atomic `Batch` and flushed before `save`
//! returns, so a crash leaves either the old snapshot or the new one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Batch, Db, Tree};
use std::path::Path;

use crate::config::{PROTOCOL_VERSION, SNAPSHOT_KEY, SNAPSHOT_TREE};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur while persisting or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const VERSION_KEY: &[u8] = b"protocol_version";

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

/// sled-backed holder of the latest ledger snapshot.
///
/// Cheap to clone; clones share the same database handle.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    db: Db,
    snapshots: Tree,
}

impl LedgerStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a throwaway store that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let snapshots = db.open_tree(SNAPSHOT_TREE)?;
        Ok(Self { db, snapshots })
    }

    /// Replace the stored snapshot with `state` and flush to disk.
    pub fn save<T: Serialize>(&self, state: &T) -> StoreResult<()> {
        let bytes =
            bincode::serialize(state).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut batch = Batch::default();
        batch.insert(SNAPSHOT_KEY, bytes);
        batch.insert(VERSION_KEY, PROTOCOL_VERSION.as_bytes());
        self.snapshots.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }

    /// Load the stored snapshot, or `None` on a fresh store.
    pub fn load<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        match self.snapshots.get(SNAPSHOT_KEY)? {
            Some(bytes) => {
                let state = bincode::deserialize(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Protocol version that wrote the current snapshot.
    pub fn snapshot_version(&self) -> StoreResult<Option<String>> {
        Ok(self
            .snapshots
            .get(VERSION_KEY)?
            .map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    pub fn has_snapshot(&self) -> StoreResult<bool> {
        Ok(self.snapshots.contains_key(SNAPSHOT_KEY)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        next_id: u64,
        owners: BTreeMap<u64, String>,
    }

    fn sample() -> Snapshot {
        let mut owners = BTreeMap::new();
        owners.insert(1, "0xalice".to_string());
        owners.insert(2, "0xbob".to_string());
        Snapshot { next_id: 3, owners }
    }

    #[test]
    fn fresh_store_has_no_snapshot() {
        let store = LedgerStore::open_temporary().unwrap();
        assert!(!store.has_snapshot().unwrap());
        assert!(store.load::<Snapshot>().unwrap().is_none());
        assert!(store.snapshot_version().unwrap().is_none());
    }

    #[test]
    fn save_then_load_returns_same_state() {
        let store = LedgerStore::open_temporary().unwrap();
        store.save(&sample()).unwrap();

        let loaded: Snapshot = store.load().unwrap().expect("snapshot present");
        assert_eq!(loaded, sample());
        assert_eq!(
            store.snapshot_version().unwrap().as_deref(),
            Some(PROTOCOL_VERSION)
        );
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let store = LedgerStore::open_temporary().unwrap();
        store.save(&sample()).unwrap();

        let mut next = sample();
        next.next_id = 9;
        store.save(&next).unwrap();

        let loaded: Snapshot = store.load().unwrap().unwrap();
        assert_eq!(loaded.next_id, 9);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = LedgerStore::open(dir.path()).unwrap();
            store.save(&sample()).unwrap();
        }
        let reopened = LedgerStore::open(dir.path()).unwrap();
        let loaded: Snapshot = reopened.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn corrupt_snapshot_is_a_serialization_error() {
        let store = LedgerStore::open_temporary().unwrap();
        store.snapshots.insert(SNAPSHOT_KEY, &[0xFFu8; 3][..]).unwrap();
        let err = store.load::<Snapshot>().unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use log::{debug, trace};

use super::{
    snapshot::{EntryState, Snapshot},
    Column, KvStore, SnapshotProvider,
};
use crate::core::error::BlockchainError;

/// In memory store: one ordered tree per column plus at most one open
/// cache branch.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    columns: HashMap<Column, BTreeMap<Bytes, Bytes>>,
    snapshot: Option<Snapshot<Column>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // Number of committed entries in a column, pending writes excluded
    pub fn committed_len(&self, column: Column) -> usize {
        self.columns.get(&column).map_or(0, |tree| tree.len())
    }

    fn insert_into_store(&mut self, column: Column, key: Bytes, value: Bytes) {
        self.columns.entry(column).or_default().insert(key, value);
    }

    fn remove_from_store(&mut self, column: Column, key: &[u8]) {
        if let Some(tree) = self.columns.get_mut(&column) {
            tree.remove(key);
        }
    }
}

impl KvStore for MemoryStorage {
    fn get_raw(&self, column: Column, key: &[u8]) -> Result<Option<Bytes>, BlockchainError> {
        if let Some(snapshot) = self.snapshot.as_ref() {
            match snapshot.get(&column, key) {
                EntryState::Stored(value) => return Ok(Some(value.clone())),
                EntryState::Deleted => return Ok(None),
                EntryState::Absent => {}
            }
        }

        Ok(self
            .columns
            .get(&column)
            .and_then(|tree| tree.get(key))
            .cloned())
    }

    fn put_raw(&mut self, column: Column, key: Bytes, value: Bytes) -> Result<(), BlockchainError> {
        match self.snapshot.as_mut() {
            Some(snapshot) => {
                snapshot.put(column, key, value);
            }
            None => self.insert_into_store(column, key, value),
        }
        Ok(())
    }

    fn delete_raw(&mut self, column: Column, key: &[u8]) -> Result<(), BlockchainError> {
        match self.snapshot.as_mut() {
            Some(snapshot) => {
                snapshot.delete(column, Bytes::copy_from_slice(key));
            }
            None => self.remove_from_store(column, key),
        }
        Ok(())
    }

    fn iter_prefix(
        &self,
        column: Column,
        prefix: &[u8],
    ) -> Result<Vec<(Bytes, Bytes)>, BlockchainError> {
        let store = self.columns.get(&column);
        let entries = match self.snapshot.as_ref() {
            Some(snapshot) => {
                snapshot.merge_prefix(&column, prefix, store.into_iter().flat_map(|t| t.iter()))
            }
            None => store
                .into_iter()
                .flat_map(|tree| tree.iter())
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        Ok(entries)
    }
}

impl SnapshotProvider for MemoryStorage {
    fn has_snapshot(&self) -> Result<bool, BlockchainError> {
        Ok(self.snapshot.is_some())
    }

    fn start_snapshot(&mut self) -> Result<(), BlockchainError> {
        trace!("starting snapshot");
        if self.snapshot.is_some() {
            return Err(BlockchainError::SnapshotAlreadyStarted);
        }

        self.snapshot = Some(Snapshot::new());
        Ok(())
    }

    fn end_snapshot(&mut self, apply: bool) -> Result<(), BlockchainError> {
        trace!("end snapshot");
        let snapshot = self
            .snapshot
            .take()
            .ok_or(BlockchainError::SnapshotNotStarted)?;

        if apply {
            trace!("applying snapshot");
            for (column, batch) in snapshot.into_parts() {
                for (key, value) in batch {
                    match value {
                        Some(value) => self.insert_into_store(column, key, value),
                        None => self.remove_from_store(column, &key),
                    }
                }
            }
        } else {
            debug!("discarding snapshot");
        }

        Ok(())
    }
}

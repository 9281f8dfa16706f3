mod changes;

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

use bytes::Bytes;

pub use changes::Changes;

/// Represents the state of an entry in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState<T> {
    /// The entry has been added/modified in our snapshot
    Stored(T),
    /// The entry has been deleted in our snapshot
    Deleted,
    /// The entry is not present in our snapshot, must fallback on the store
    Absent,
}

/// Cache branch over a store: a set of pending changes per column,
/// applied to the store or dropped as a whole.
#[derive(Debug, Clone)]
pub struct Snapshot<C: Hash + Eq> {
    pub trees: HashMap<C, Changes>,
}

impl<C: Hash + Eq> Default for Snapshot<C> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }
}

impl<C: Hash + Eq> Snapshot<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the snapshot and return its changes per column
    pub fn into_parts(self) -> HashMap<C, Changes> {
        self.trees
    }

    /// Remove a key from our snapshot.
    /// Returns the previous value state.
    pub fn delete<K: Into<Bytes>>(&mut self, column: C, key: K) -> EntryState<Bytes> {
        self.trees.entry(column).or_default().remove(key)
    }

    /// Insert a key-value pair into our snapshot.
    /// Returns the previous value state.
    pub fn put<K: Into<Bytes>, V: Into<Bytes>>(
        &mut self,
        column: C,
        key: K,
        value: V,
    ) -> EntryState<Bytes> {
        self.trees.entry(column).or_default().insert(key, value)
    }

    /// Get a value from our snapshot.
    pub fn get<K: AsRef<[u8]>>(&self, column: &C, key: K) -> EntryState<&Bytes> {
        match self.trees.get(column) {
            Some(batch) => match batch.writes.get(key.as_ref()) {
                Some(Some(v)) => EntryState::Stored(v),
                Some(None) => EntryState::Deleted,
                None => EntryState::Absent,
            },
            None => EntryState::Absent,
        }
    }

    /// Merge the entries of the store starting with `prefix` with our
    /// pending writes. Keys touched by the snapshot always win.
    pub fn merge_prefix<'a>(
        &self,
        column: &C,
        prefix: &[u8],
        store: impl Iterator<Item = (&'a Bytes, &'a Bytes)>,
    ) -> Vec<(Bytes, Bytes)> {
        let mut merged: BTreeMap<Bytes, Bytes> = store
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(tree) = self.trees.get(column) {
            for (k, v) in tree.writes.iter().filter(|(k, _)| k.starts_with(prefix)) {
                match v {
                    Some(v) => {
                        merged.insert(k.clone(), v.clone());
                    }
                    None => {
                        merged.remove(k);
                    }
                }
            }
        }

        merged.into_iter().collect()
    }
}

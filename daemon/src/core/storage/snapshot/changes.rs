use std::collections::{
    btree_map::{Entry, IntoIter},
    BTreeMap,
};

use bytes::Bytes;

use super::EntryState;

/// Pending writes of a single column.
/// A `None` value marks a key deleted by the branch.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    pub writes: BTreeMap<Bytes, Option<Bytes>>,
}

impl Changes {
    /// Set a key to a new value.
    /// Returns the previous value state if any.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> EntryState<Bytes>
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        match self.writes.insert(key.into(), Some(value.into())) {
            Some(Some(prev)) => EntryState::Stored(prev),
            Some(None) => EntryState::Deleted,
            None => EntryState::Absent,
        }
    }

    /// Remove a key.
    /// Returns the previous value state if any.
    pub fn remove<K>(&mut self, key: K) -> EntryState<Bytes>
    where
        K: Into<Bytes>,
    {
        match self.writes.entry(key.into()) {
            Entry::Occupied(mut entry) => match entry.get_mut().take() {
                Some(v) => EntryState::Stored(v),
                None => EntryState::Deleted,
            },
            Entry::Vacant(v) => {
                v.insert(None);
                EntryState::Absent
            }
        }
    }
}

impl IntoIterator for Changes {
    type Item = (Bytes, Option<Bytes>);
    type IntoIter = IntoIter<Bytes, Option<Bytes>>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

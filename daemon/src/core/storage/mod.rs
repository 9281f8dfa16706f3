mod column;
mod constants;
mod memory;
mod providers;

pub mod snapshot;

pub use self::{column::Column, memory::MemoryStorage, providers::*};

use bytes::Bytes;
use primitive_types::U256;
use serde::{de::DeserializeOwned, Serialize};
use zena_common::coin::u256_to_be_bytes;

use crate::core::error::BlockchainError;

/// Raw key/value access to the columns of a store.
///
/// Reads see the pending writes of the open snapshot, if any, and writes
/// land in that snapshot until it is ended.
pub trait KvStore {
    fn get_raw(&self, column: Column, key: &[u8]) -> Result<Option<Bytes>, BlockchainError>;

    fn put_raw(&mut self, column: Column, key: Bytes, value: Bytes) -> Result<(), BlockchainError>;

    fn delete_raw(&mut self, column: Column, key: &[u8]) -> Result<(), BlockchainError>;

    /// Every entry of the column whose key starts with `prefix`, in key order
    fn iter_prefix(
        &self,
        column: Column,
        prefix: &[u8],
    ) -> Result<Vec<(Bytes, Bytes)>, BlockchainError>;

    fn contains(&self, column: Column, key: &[u8]) -> Result<bool, BlockchainError> {
        Ok(self.get_raw(column, key)?.is_some())
    }

    /// Delete every key of a column
    fn clear_column(&mut self, column: Column) -> Result<(), BlockchainError> {
        for (key, _) in self.iter_prefix(column, &[])? {
            self.delete_raw(column, &key)?;
        }
        Ok(())
    }

    fn load_optional<V: DeserializeOwned>(
        &self,
        column: Column,
        key: &[u8],
    ) -> Result<Option<V>, BlockchainError> {
        self.get_raw(column, key)?
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| BlockchainError::corrupted(column, key, e))
            })
            .transpose()
    }

    fn store<V: Serialize>(
        &mut self,
        column: Column,
        key: &[u8],
        value: &V,
    ) -> Result<(), BlockchainError> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(column, Bytes::copy_from_slice(key), Bytes::from(bytes))
    }

    fn load_u64(&self, column: Column, key: &[u8]) -> Result<Option<u64>, BlockchainError> {
        self.get_raw(column, key)?
            .map(|bytes| {
                let array: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| BlockchainError::corrupted(column, key, "expected 8 bytes"))?;
                Ok(u64::from_be_bytes(array))
            })
            .transpose()
    }

    fn store_u64(&mut self, column: Column, key: &[u8], value: u64) -> Result<(), BlockchainError> {
        self.put_raw(
            column,
            Bytes::copy_from_slice(key),
            Bytes::copy_from_slice(&value.to_be_bytes()),
        )
    }

    fn load_u256(&self, column: Column, key: &[u8]) -> Result<Option<U256>, BlockchainError> {
        self.get_raw(column, key)?
            .map(|bytes| {
                if bytes.len() != 32 {
                    return Err(BlockchainError::corrupted(column, key, "expected 32 bytes"));
                }
                Ok(U256::from_big_endian(&bytes))
            })
            .transpose()
    }

    fn store_u256(&mut self, column: Column, key: &[u8], value: &U256) -> Result<(), BlockchainError> {
        self.put_raw(
            column,
            Bytes::copy_from_slice(key),
            Bytes::copy_from_slice(&u256_to_be_bytes(value)),
        )
    }
}

/// Full store used by the node: raw access, cache branches and every
/// typed provider on top of them.
pub trait Storage:
    KvStore
    + SnapshotProvider
    + AccountProvider
    + BalanceProvider
    + EvmStateProvider
    + FeeMarketProvider
    + FractionalBalanceProvider
    + Send
    + Sync
    + 'static
{
}

impl<T> Storage for T where
    T: KvStore
        + SnapshotProvider
        + AccountProvider
        + BalanceProvider
        + EvmStateProvider
        + FeeMarketProvider
        + FractionalBalanceProvider
        + Send
        + Sync
        + 'static
{
}

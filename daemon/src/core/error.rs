use thiserror::Error;
use zena_common::{
    error::{CoinError, DecError},
    params::ParamsError,
};

use super::{bank::BankError, genesis::GenesisError, precisebank::PreciseBankError};
use crate::core::storage::Column;

/// Failure of the node side collaborators.
///
/// This is the state error type of the admission pipeline: a decorator
/// receiving it returns `AnteError::State`, never a verdict on the tx.
#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error("Snapshot already started")]
    SnapshotAlreadyStarted,
    #[error("Snapshot not started")]
    SnapshotNotStarted,
    #[error("Corrupted data in column {column} for key {key}: {reason}")]
    CorruptedData {
        column: Column,
        key: String,
        reason: String,
    },
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    PreciseBank(#[from] PreciseBankError),
    #[error(transparent)]
    Genesis(#[from] GenesisError),
    #[error(transparent)]
    Coin(#[from] CoinError),
    #[error(transparent)]
    Dec(#[from] DecError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl BlockchainError {
    pub fn corrupted<K: AsRef<[u8]>, R: ToString>(column: Column, key: K, reason: R) -> Self {
        BlockchainError::CorruptedData {
            column,
            key: hex::encode(key),
            reason: reason.to_string(),
        }
    }
}

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::error::CoinError;

/// Kind of an admission failure, surfaced to the host with its code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    Internal,
    InvalidSequence,
    Unauthorized,
    InsufficientFunds,
    InvalidTransactionType,
    UnknownAddress,
    InvalidCoins,
    OutOfGas,
    InsufficientFee,
    InvalidRequest,
    InvalidSigner,
    InvalidChainId,
    InvalidType,
    UnknownExtensionOptions,
    NotSupported,
    InvalidBaseFee,
    CreateDisabled,
    CallDisabled,
}

impl ErrorKind {
    pub fn code(&self) -> u32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::InvalidSequence => 3,
            ErrorKind::Unauthorized => 4,
            ErrorKind::InsufficientFunds => 5,
            ErrorKind::InvalidTransactionType => 6,
            ErrorKind::UnknownAddress => 9,
            ErrorKind::InvalidCoins => 10,
            ErrorKind::OutOfGas => 11,
            ErrorKind::InsufficientFee => 13,
            ErrorKind::InvalidRequest => 18,
            ErrorKind::InvalidSigner => 24,
            ErrorKind::InvalidChainId => 28,
            ErrorKind::InvalidType => 29,
            ErrorKind::UnknownExtensionOptions => 31,
            ErrorKind::NotSupported => 37,
            ErrorKind::InvalidBaseFee => 101,
            ErrorKind::CreateDisabled => 102,
            ErrorKind::CallDisabled => 103,
        }
    }
}

/// Error returned by a decorator.
///
/// Every variant except `State` carries the human readable context of the
/// failure, the kind suffix is appended when displayed. `State` wraps a
/// failure of a collaborator (store, keeper) and is never a verdict on the
/// transaction itself.
#[derive(Error, Debug)]
pub enum AnteError<E> {
    #[error("State error: {0}")]
    State(E),
    #[error("{0}: internal")]
    Internal(String),
    #[error("{0}: invalid sequence")]
    InvalidSequence(String),
    #[error("{0}: unauthorized")]
    Unauthorized(String),
    #[error("{0}: insufficient funds")]
    InsufficientFunds(String),
    #[error("{0}: invalid transaction type")]
    InvalidTransactionType(String),
    #[error("{0}: unknown address")]
    UnknownAddress(String),
    #[error("{0}: invalid coins")]
    InvalidCoins(String),
    #[error("{0}: out of gas")]
    OutOfGas(String),
    #[error("{0}: insufficient fee")]
    InsufficientFee(String),
    #[error("{0}: invalid request")]
    InvalidRequest(String),
    #[error("{0}: tx intended signer does not match the given signer")]
    InvalidSigner(String),
    #[error("{0}: invalid chain-id")]
    InvalidChainId(String),
    #[error("{0}: invalid type")]
    InvalidType(String),
    #[error("{0}: unknown extension options")]
    UnknownExtensionOptions(String),
    #[error("{0}: feature not supported")]
    NotSupported(String),
    #[error("{0}: invalid base fee")]
    InvalidBaseFee(String),
    #[error("{0}: EVM Create operation is disabled")]
    CreateDisabled(String),
    #[error("{0}: EVM Call operation is disabled")]
    CallDisabled(String),
}

impl<E> AnteError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnteError::State(_) | AnteError::Internal(_) => ErrorKind::Internal,
            AnteError::InvalidSequence(_) => ErrorKind::InvalidSequence,
            AnteError::Unauthorized(_) => ErrorKind::Unauthorized,
            AnteError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            AnteError::InvalidTransactionType(_) => ErrorKind::InvalidTransactionType,
            AnteError::UnknownAddress(_) => ErrorKind::UnknownAddress,
            AnteError::InvalidCoins(_) => ErrorKind::InvalidCoins,
            AnteError::OutOfGas(_) => ErrorKind::OutOfGas,
            AnteError::InsufficientFee(_) => ErrorKind::InsufficientFee,
            AnteError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AnteError::InvalidSigner(_) => ErrorKind::InvalidSigner,
            AnteError::InvalidChainId(_) => ErrorKind::InvalidChainId,
            AnteError::InvalidType(_) => ErrorKind::InvalidType,
            AnteError::UnknownExtensionOptions(_) => ErrorKind::UnknownExtensionOptions,
            AnteError::NotSupported(_) => ErrorKind::NotSupported,
            AnteError::InvalidBaseFee(_) => ErrorKind::InvalidBaseFee,
            AnteError::CreateDisabled(_) => ErrorKind::CreateDisabled,
            AnteError::CallDisabled(_) => ErrorKind::CallDisabled,
        }
    }

    pub fn code(&self) -> u32 {
        self.kind().code()
    }

    /// Map the collaborator error, keeping the verdict untouched
    pub fn map_state<F, T>(self, f: F) -> AnteError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            AnteError::State(e) => AnteError::State(f(e)),
            AnteError::Internal(m) => AnteError::Internal(m),
            AnteError::InvalidSequence(m) => AnteError::InvalidSequence(m),
            AnteError::Unauthorized(m) => AnteError::Unauthorized(m),
            AnteError::InsufficientFunds(m) => AnteError::InsufficientFunds(m),
            AnteError::InvalidTransactionType(m) => AnteError::InvalidTransactionType(m),
            AnteError::UnknownAddress(m) => AnteError::UnknownAddress(m),
            AnteError::InvalidCoins(m) => AnteError::InvalidCoins(m),
            AnteError::OutOfGas(m) => AnteError::OutOfGas(m),
            AnteError::InsufficientFee(m) => AnteError::InsufficientFee(m),
            AnteError::InvalidRequest(m) => AnteError::InvalidRequest(m),
            AnteError::InvalidSigner(m) => AnteError::InvalidSigner(m),
            AnteError::InvalidChainId(m) => AnteError::InvalidChainId(m),
            AnteError::InvalidType(m) => AnteError::InvalidType(m),
            AnteError::UnknownExtensionOptions(m) => AnteError::UnknownExtensionOptions(m),
            AnteError::NotSupported(m) => AnteError::NotSupported(m),
            AnteError::InvalidBaseFee(m) => AnteError::InvalidBaseFee(m),
            AnteError::CreateDisabled(m) => AnteError::CreateDisabled(m),
            AnteError::CallDisabled(m) => AnteError::CallDisabled(m),
        }
    }
}

// Coin arithmetic failures inside the pipeline are always invalid coins
impl<E> From<CoinError> for AnteError<E> {
    fn from(err: CoinError) -> Self {
        AnteError::InvalidCoins(err.to_string())
    }
}

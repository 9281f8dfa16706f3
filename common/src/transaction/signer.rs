use thiserror::Error;

use super::{EvmTxData, MsgEthereumTx, DYNAMIC_FEE_TX_TYPE, LEGACY_TX_TYPE};
use crate::{
    crypto::{recover_signer, sign_hash, Address, SecretKey, SignatureError},
    params::Rules,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("transaction type {0} not supported")]
    TxTypeNotSupported(u8),
    #[error("invalid chain id for signer: have {got}, want {expected}")]
    InvalidChainId { expected: u64, got: u64 },
    #[error("{0} higher than 2^128")]
    FeeOverflow(&'static str),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Recovers senders of EVM transactions for a given set of rules.
///
/// Access list envelopes need berlin, dynamic fee envelopes need london.
/// Unprotected legacy transactions are recovered as well, rejecting them
/// is a policy decision of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signer {
    chain_id: u64,
    berlin: bool,
    london: bool,
}

impl Signer {
    pub fn new(rules: &Rules) -> Self {
        Self {
            chain_id: rules.chain_id,
            berlin: rules.is_berlin,
            london: rules.is_london,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn check_envelope(&self, data: &EvmTxData) -> Result<(), SignerError> {
        let supported = match data.tx_type() {
            LEGACY_TX_TYPE => true,
            DYNAMIC_FEE_TX_TYPE => self.london,
            _ => self.berlin,
        };

        if !supported {
            return Err(SignerError::TxTypeNotSupported(data.tx_type()));
        }

        if let Some(chain_id) = data.chain_id() {
            if chain_id != self.chain_id {
                return Err(SignerError::InvalidChainId {
                    expected: self.chain_id,
                    got: chain_id,
                });
            }
        }

        Ok(())
    }

    pub fn sender(&self, msg: &MsgEthereumTx) -> Result<Address, SignerError> {
        self.check_envelope(&msg.data)?;
        Ok(recover_signer(&msg.data.signing_hash()?, &msg.signature)?)
    }

    pub fn sign(&self, data: EvmTxData, key: &SecretKey) -> Result<MsgEthereumTx, SignerError> {
        self.check_envelope(&data)?;
        let signature = sign_hash(&data.signing_hash()?, key)?;
        Ok(MsgEthereumTx {
            data,
            signature,
            from: None,
        })
    }
}

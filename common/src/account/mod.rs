use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::crypto::{empty_code_hash, Address, Hash};

/// Native account as stored by the account keeper
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
}

impl BaseAccount {
    pub fn new(address: Address, account_number: u64) -> Self {
        Self {
            address,
            account_number,
            sequence: 0,
        }
    }
}

/// Account as seen by the EVM state database.
/// `balance` is expressed in the extended denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvmAccount {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: Hash,
}

impl EvmAccount {
    pub fn new(nonce: u64, balance: U256) -> Self {
        Self {
            nonce,
            balance,
            code_hash: empty_code_hash(),
        }
    }

    // Contracts carry code, externally owned accounts don't
    pub fn is_contract(&self) -> bool {
        !self.code_hash.is_zero() && self.code_hash != empty_code_hash()
    }
}

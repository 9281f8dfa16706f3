use std::collections::HashSet;

use log::info;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use zena_common::{coin::ConversionFactor, crypto::Address};

use super::{PreciseBank, PreciseBankError};
use crate::core::{error::BlockchainError, storage::KvStore};

/// Fractional balance of a single account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionalBalance {
    pub address: Address,
    pub amount: U256,
}

impl FractionalBalance {
    pub fn new(address: Address, amount: U256) -> Self {
        Self { address, amount }
    }
}

/// Genesis state of the fractional ledger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreciseBankGenesis {
    #[serde(default)]
    pub balances: Vec<FractionalBalance>,
    #[serde(default)]
    pub remainder: U256,
}

impl PreciseBankGenesis {
    pub fn new(balances: Vec<FractionalBalance>, remainder: U256) -> Self {
        Self { balances, remainder }
    }

    /// Stateless checks: every balance is unique and in `(0, CF)`, the
    /// remainder is in `[0, CF)` and both add up to whole integer units
    pub fn validate(&self, conversion_factor: ConversionFactor) -> Result<(), PreciseBankError> {
        let cf = conversion_factor.get();
        let mut seen = HashSet::with_capacity(self.balances.len());
        let mut sum = U256::zero();

        for balance in self.balances.iter() {
            if !seen.insert(balance.address) {
                return Err(PreciseBankError::InvalidGenesis(format!(
                    "duplicate fractional balance for {}",
                    balance.address
                )));
            }

            if balance.amount.is_zero() || balance.amount >= cf {
                return Err(PreciseBankError::InvalidFractionalBalance {
                    address: balance.address,
                    amount: balance.amount,
                    max: cf,
                });
            }

            sum = sum
                .checked_add(balance.amount)
                .ok_or(PreciseBankError::Overflow)?;
        }

        if self.remainder >= cf {
            return Err(PreciseBankError::InvalidRemainder {
                amount: self.remainder,
                max: cf,
            });
        }

        let total = sum
            .checked_add(self.remainder)
            .ok_or(PreciseBankError::Overflow)?;
        let (_, left) = conversion_factor.split(total);
        if !left.is_zero() {
            return Err(PreciseBankError::InvalidGenesis(format!(
                "sum of fractional balances {} and remainder {} is not a multiple of {}",
                sum, self.remainder, cf
            )));
        }

        Ok(())
    }

    pub fn total_fractional(&self) -> U256 {
        self.balances
            .iter()
            .fold(U256::zero(), |sum, balance| sum.saturating_add(balance.amount))
    }
}

impl PreciseBank {
    /// Load the fractional ledger. The integer balances, reserve included,
    /// must already be set so the reserve backing can be checked.
    pub fn init_genesis<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        genesis: &PreciseBankGenesis,
    ) -> Result<(), BlockchainError> {
        genesis.validate(self.conversion_factor)?;

        for balance in genesis.balances.iter() {
            self.set_fractional_balance(storage, &balance.address, balance.amount)?;
        }
        self.set_remainder_amount(storage, genesis.remainder)?;

        self.check_reserve_backing(storage)?;
        info!(
            "precisebank genesis loaded with {} fractional balances",
            genesis.balances.len()
        );
        Ok(())
    }

    pub fn export_genesis<S: KvStore + ?Sized>(&self, storage: &S) -> Result<PreciseBankGenesis, BlockchainError> {
        let mut balances = Vec::new();
        self.iterate_fractional_balances(storage, |address, amount| {
            balances.push(FractionalBalance::new(*address, amount));
            false
        })?;

        Ok(PreciseBankGenesis {
            balances,
            remainder: self.get_remainder_amount(storage)?,
        })
    }
}

use primitive_types::U256;
use zena_common::crypto::{Address, ADDRESS_SIZE};

use crate::core::{
    error::BlockchainError,
    storage::{constants::REMAINDER_AMOUNT, Column, KvStore},
};

/// Raw entries of the fractional balance ledger.
///
/// Nothing is range checked here, the precisebank keeper owns the
/// invariants. A zero value is stored as an absent entry.
pub trait FractionalBalanceProvider {
    fn get_fractional_balance(&self, address: &Address) -> Result<U256, BlockchainError>;

    fn set_fractional_balance_raw(
        &mut self,
        address: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError>;

    fn delete_fractional_balance(&mut self, address: &Address) -> Result<(), BlockchainError>;

    // Every non zero fractional balance, sorted by address
    fn get_fractional_balances(&self) -> Result<Vec<(Address, U256)>, BlockchainError>;

    fn get_remainder_amount(&self) -> Result<U256, BlockchainError>;

    fn set_remainder_amount_raw(&mut self, amount: U256) -> Result<(), BlockchainError>;

    fn delete_remainder_amount(&mut self) -> Result<(), BlockchainError>;
}

impl<T: KvStore + ?Sized> FractionalBalanceProvider for T {
    fn get_fractional_balance(&self, address: &Address) -> Result<U256, BlockchainError> {
        Ok(self
            .load_u256(Column::FractionalBalances, address.as_bytes())?
            .unwrap_or_default())
    }

    fn set_fractional_balance_raw(
        &mut self,
        address: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        if amount.is_zero() {
            return self.delete_fractional_balance(address);
        }
        self.store_u256(Column::FractionalBalances, address.as_bytes(), &amount)
    }

    fn delete_fractional_balance(&mut self, address: &Address) -> Result<(), BlockchainError> {
        self.delete_raw(Column::FractionalBalances, address.as_bytes())
    }

    fn get_fractional_balances(&self) -> Result<Vec<(Address, U256)>, BlockchainError> {
        self.iter_prefix(Column::FractionalBalances, &[])?
            .into_iter()
            .map(|(key, value)| {
                let bytes: [u8; ADDRESS_SIZE] = key.as_ref().try_into().map_err(|_| {
                    BlockchainError::corrupted(Column::FractionalBalances, &key, "invalid address")
                })?;
                if value.len() != 32 {
                    return Err(BlockchainError::corrupted(
                        Column::FractionalBalances,
                        &key,
                        "expected 32 bytes",
                    ));
                }
                Ok((Address::new(bytes), U256::from_big_endian(&value)))
            })
            .collect()
    }

    fn get_remainder_amount(&self) -> Result<U256, BlockchainError> {
        Ok(self
            .load_u256(Column::PreciseBank, REMAINDER_AMOUNT)?
            .unwrap_or_default())
    }

    fn set_remainder_amount_raw(&mut self, amount: U256) -> Result<(), BlockchainError> {
        if amount.is_zero() {
            return self.delete_remainder_amount();
        }
        self.store_u256(Column::PreciseBank, REMAINDER_AMOUNT, &amount)
    }

    fn delete_remainder_amount(&mut self) -> Result<(), BlockchainError> {
        self.delete_raw(Column::PreciseBank, REMAINDER_AMOUNT)
    }
}

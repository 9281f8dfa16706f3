mod burn;
mod genesis;
mod mint;
mod send;

use log::trace;
use primitive_types::U256;
use thiserror::Error;
use zena_common::{
    coin::{ChainCoinInfo, Coin, Coins, ConversionFactor},
    config::PRECISEBANK_MODULE_NAME,
    crypto::Address,
};

pub use genesis::*;

use super::{
    bank::{Bank, BankError},
    error::BlockchainError,
    storage::{FractionalBalanceProvider, KvStore},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreciseBankError {
    #[error("module account {} cannot be minted to: unauthorized", PRECISEBANK_MODULE_NAME)]
    MintToReserve,
    #[error("module account {} cannot be burned from: unauthorized", PRECISEBANK_MODULE_NAME)]
    BurnFromReserve,
    #[error("module account {} is not allowed to send funds: unauthorized", PRECISEBANK_MODULE_NAME)]
    SendFromReserve,
    #[error("module account {} is not allowed to receive funds: unauthorized", PRECISEBANK_MODULE_NAME)]
    SendToReserve,
    #[error("fractional balance {amount} of {address} is out of range [0, {max})")]
    InvalidFractionalBalance {
        address: Address,
        amount: U256,
        max: U256,
    },
    #[error("remainder amount {amount} is out of range [0, {max})")]
    InvalidRemainder { amount: U256, max: U256 },
    #[error("reserve balance {reserve} does not back the fractional balances, expected {expected}")]
    ReserveMismatch { reserve: String, expected: String },
    #[error("invalid precisebank genesis: {0}")]
    InvalidGenesis(String),
    #[error("precisebank amount overflow")]
    Overflow,
}

/// Fractional balance ledger.
///
/// Tracks the sub units of the extended denom that the integer bank can't
/// represent. An extended balance is `integer * CF + fractional`, where the
/// fractional part of every account is in `[0, CF)`. The reserve module
/// account holds the integer units backing every fractional balance plus
/// the global remainder, so at all times
/// `reserve * CF == sum(fractional) + remainder`.
///
/// Every operation checks the funds it needs before its first write.
#[derive(Clone, Debug)]
pub struct PreciseBank {
    bank: Bank,
    coin_info: ChainCoinInfo,
    conversion_factor: ConversionFactor,
}

impl PreciseBank {
    pub fn new(bank: Bank, coin_info: ChainCoinInfo) -> Self {
        let conversion_factor = coin_info.conversion_factor();
        Self {
            bank,
            coin_info,
            conversion_factor,
        }
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn coin_info(&self) -> &ChainCoinInfo {
        &self.coin_info
    }

    pub fn conversion_factor(&self) -> ConversionFactor {
        self.conversion_factor
    }

    pub fn reserve_address(&self) -> Address {
        Address::for_module(PRECISEBANK_MODULE_NAME)
    }

    fn integer_denom(&self) -> &str {
        &self.coin_info.denom
    }

    fn extended_denom(&self) -> &str {
        &self.coin_info.extended_denom
    }

    fn integer_coins(&self, amount: U256) -> Coins {
        Coins::from(Coin::new(self.integer_denom(), amount))
    }

    fn extended_coin(&self, amount: U256) -> Coin {
        Coin::new(self.extended_denom(), amount)
    }

    // Coins handled by the bank as is, and the amount of extended denom
    fn split_coins(&self, coins: &Coins) -> (Coins, U256) {
        if self.conversion_factor.is_one() {
            return (coins.clone(), U256::zero());
        }

        let extended = coins.amount_of(self.extended_denom());
        let passthrough = coins
            .iter()
            .filter(|coin| coin.denom != self.extended_denom())
            .cloned()
            .collect();
        (Coins::from_unchecked(passthrough), extended)
    }

    pub fn get_fractional_balance<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        address: &Address,
    ) -> Result<U256, BlockchainError> {
        storage.get_fractional_balance(address)
    }

    /// Set the fractional balance of an account, a zero amount deletes it
    pub fn set_fractional_balance<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        address: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        if amount >= self.conversion_factor.get() {
            return Err(PreciseBankError::InvalidFractionalBalance {
                address: *address,
                amount,
                max: self.conversion_factor.get(),
            }
            .into());
        }

        storage.set_fractional_balance_raw(address, amount)
    }

    pub fn delete_fractional_balance<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        address: &Address,
    ) -> Result<(), BlockchainError> {
        storage.delete_fractional_balance(address)
    }

    /// Visit every non zero fractional balance until `f` returns true
    pub fn iterate_fractional_balances<S, F>(&self, storage: &S, mut f: F) -> Result<(), BlockchainError>
    where
        S: KvStore + ?Sized,
        F: FnMut(&Address, U256) -> bool,
    {
        for (address, amount) in storage.get_fractional_balances()? {
            if f(&address, amount) {
                break;
            }
        }
        Ok(())
    }

    pub fn get_total_sum_fractional_balances<S: KvStore + ?Sized>(
        &self,
        storage: &S,
    ) -> Result<U256, BlockchainError> {
        storage
            .get_fractional_balances()?
            .into_iter()
            .try_fold(U256::zero(), |sum, (_, amount)| sum.checked_add(amount))
            .ok_or_else(|| PreciseBankError::Overflow.into())
    }

    pub fn get_remainder_amount<S: KvStore + ?Sized>(&self, storage: &S) -> Result<U256, BlockchainError> {
        storage.get_remainder_amount()
    }

    pub fn set_remainder_amount<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        if amount >= self.conversion_factor.get() {
            return Err(PreciseBankError::InvalidRemainder {
                amount,
                max: self.conversion_factor.get(),
            }
            .into());
        }

        storage.set_remainder_amount_raw(amount)
    }

    pub fn delete_remainder_amount<S: KvStore + ?Sized>(&self, storage: &mut S) -> Result<(), BlockchainError> {
        storage.delete_remainder_amount()
    }

    /// Balance of an account. The extended denom includes the fractional
    /// part, every other denom comes from the bank as is.
    pub fn get_balance<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        address: &Address,
        denom: &str,
    ) -> Result<U256, BlockchainError> {
        if self.conversion_factor.is_one() || denom != self.extended_denom() {
            return self.bank.get_balance(storage, address, denom);
        }

        let integer = self.bank.get_balance(storage, address, self.integer_denom())?;
        let fractional = storage.get_fractional_balance(address)?;
        Ok(self.conversion_factor.to_extended(integer, fractional)?)
    }

    // The extended balance of `address` covers `amount`, once `integer_out`
    // units of the integer denom have been spent elsewhere
    fn check_extended_funds<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        address: &Address,
        amount: U256,
        integer_out: U256,
    ) -> Result<(), BlockchainError> {
        let balance = self.get_balance(storage, address, self.extended_denom())?;
        let spent = integer_out
            .checked_mul(self.conversion_factor.get())
            .ok_or(PreciseBankError::Overflow)?;
        let spendable = balance.saturating_sub(spent);

        if spendable < amount {
            trace!("{} can't spend {} out of {}", address, amount, spendable);
            return Err(BankError::InsufficientFunds {
                balance: self.extended_coin(spendable).to_string(),
                amount: self.extended_coin(amount).to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The reserve holds exactly the integer units backing every fractional
    /// balance and the remainder
    pub fn check_reserve_backing<S: KvStore + ?Sized>(&self, storage: &S) -> Result<(), BlockchainError> {
        let reserve = self
            .bank
            .get_balance(storage, &self.reserve_address(), self.integer_denom())?;
        let sum = self.get_total_sum_fractional_balances(storage)?;
        let remainder = self.get_remainder_amount(storage)?;
        let total = sum.checked_add(remainder).ok_or(PreciseBankError::Overflow)?;

        let (expected, left) = self.conversion_factor.split(total);
        if !left.is_zero() || expected != reserve {
            return Err(PreciseBankError::ReserveMismatch {
                reserve: Coin::new(self.integer_denom(), reserve).to_string(),
                expected: format!(
                    "{} (fractional sum {} + remainder {})",
                    Coin::new(self.integer_denom(), expected),
                    sum,
                    remainder
                ),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;
    use zena_common::config::MINT_MODULE_NAME;

    pub const DENOM: &str = "uzena";
    pub const EXTENDED_DENOM: &str = "azena";

    // 6 decimals chain, CF = 10^12
    pub fn keeper() -> PreciseBank {
        PreciseBank::new(
            Bank::default(),
            ChainCoinInfo {
                denom: DENOM.to_string(),
                extended_denom: EXTENDED_DENOM.to_string(),
                display_denom: "zena".to_string(),
                decimals: 6,
            },
        )
    }

    pub fn cf() -> U256 {
        keeper().conversion_factor().get()
    }

    pub fn extended(amount: U256) -> Coins {
        Coins::from(Coin::new(EXTENDED_DENOM, amount))
    }

    pub fn integer(amount: u64) -> Coins {
        Coins::from(Coin::new(DENOM, amount))
    }

    pub fn fund(keeper: &PreciseBank, storage: &mut MemoryStorage, to: &Address, amount: U256) {
        keeper
            .mint_coins(storage, MINT_MODULE_NAME, &extended(amount))
            .unwrap();
        keeper
            .send_coins_from_module_to_account(storage, MINT_MODULE_NAME, to, &extended(amount))
            .unwrap();
    }

    #[test]
    fn test_get_balance() {
        let keeper = keeper();
        let mut storage = MemoryStorage::new();
        let user = Address::new([1; 20]);

        keeper
            .bank()
            .init_balance(&mut storage, &user, &integer(3))
            .unwrap();
        storage.set_fractional_balance_raw(&user, 42.into()).unwrap();

        assert_eq!(
            keeper.get_balance(&storage, &user, EXTENDED_DENOM).unwrap(),
            cf() * 3 + 42
        );
        assert_eq!(keeper.get_balance(&storage, &user, DENOM).unwrap(), 3.into());
    }

    #[test]
    fn test_fractional_balance_range() {
        let keeper = keeper();
        let mut storage = MemoryStorage::new();
        let user = Address::new([1; 20]);

        keeper
            .set_fractional_balance(&mut storage, &user, cf() - 1)
            .unwrap();
        assert_eq!(
            keeper.get_fractional_balance(&storage, &user).unwrap(),
            cf() - 1
        );

        let err = keeper
            .set_fractional_balance(&mut storage, &user, cf())
            .unwrap_err();
        assert!(matches!(
            err,
            BlockchainError::PreciseBank(PreciseBankError::InvalidFractionalBalance { .. })
        ));

        // Zero deletes the entry
        keeper
            .set_fractional_balance(&mut storage, &user, U256::zero())
            .unwrap();
        assert!(storage.get_fractional_balances().unwrap().is_empty());
    }

    #[test]
    fn test_remainder_range() {
        let keeper = keeper();
        let mut storage = MemoryStorage::new();

        keeper.set_remainder_amount(&mut storage, 5.into()).unwrap();
        assert_eq!(keeper.get_remainder_amount(&storage).unwrap(), 5.into());
        assert!(keeper.set_remainder_amount(&mut storage, cf()).is_err());

        keeper.delete_remainder_amount(&mut storage).unwrap();
        assert_eq!(keeper.get_remainder_amount(&storage).unwrap(), U256::zero());
    }

    #[test]
    fn test_iterate_and_sum() {
        let keeper = keeper();
        let mut storage = MemoryStorage::new();
        for i in 1..=3u8 {
            keeper
                .set_fractional_balance(&mut storage, &Address::new([i; 20]), U256::from(i))
                .unwrap();
        }

        assert_eq!(
            keeper.get_total_sum_fractional_balances(&storage).unwrap(),
            6.into()
        );

        let mut seen = Vec::new();
        keeper
            .iterate_fractional_balances(&storage, |address, _| {
                seen.push(*address);
                seen.len() == 2
            })
            .unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_reserve_backing_mismatch() {
        let keeper = keeper();
        let mut storage = MemoryStorage::new();
        keeper.check_reserve_backing(&storage).unwrap();

        keeper
            .set_fractional_balance(&mut storage, &Address::new([1; 20]), 1.into())
            .unwrap();
        assert!(keeper.check_reserve_backing(&storage).is_err());
    }
}

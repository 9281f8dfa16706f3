use log::debug;
use primitive_types::U256;
use zena_common::{coin::Coins, config::PRECISEBANK_MODULE_NAME, crypto::Address};

use super::{PreciseBank, PreciseBankError};
use crate::core::{
    bank::BankError,
    error::BlockchainError,
    storage::{FractionalBalanceProvider, KvStore},
};

impl PreciseBank {
    /// Burn coins held by a module account, the mirror of
    /// [`PreciseBank::mint_coins`]
    pub fn burn_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::BurnFromReserve.into());
        }

        if !self.bank.permissions(module)?.burner {
            return Err(BankError::NoBurnPermission(module.to_string()).into());
        }

        coins
            .validate()
            .map_err(|_| BankError::InvalidCoins(coins.to_string()))?;

        let address = self.bank.module_address(module)?;
        let (passthrough, extended) = self.split_coins(coins);
        if !extended.is_zero() {
            let integer_out = passthrough.amount_of(self.integer_denom());
            self.check_extended_funds(storage, &address, extended, integer_out)?;
        }

        if !passthrough.is_empty() {
            self.bank.burn_coins(storage, module, &passthrough)?;
        }

        if !extended.is_zero() {
            self.burn_extended_coin(storage, module, &address, extended)?;
        }

        debug!("burned {} from module {}", coins, module);
        Ok(())
    }

    // A borrow on the module fractional balance sends one unit to the
    // reserve, unless the burned fraction overflows the remainder: that
    // unit is then burned directly. Without borrow, a remainder overflow
    // burns one unit out of the reserve.
    fn burn_extended_coin<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        address: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        let cf = self.conversion_factor.get();
        let (mut integer_burn, fractional_burn) = self.conversion_factor.split(amount);

        let fractional = storage.get_fractional_balance(address)?;
        let remainder = storage.get_remainder_amount()?;

        let needs_borrow = fractional < fractional_burn;
        let new_fractional = if needs_borrow {
            fractional + cf - fractional_burn
        } else {
            fractional - fractional_burn
        };

        let remainder_sum = remainder + fractional_burn;
        let remainder_overflow = remainder_sum >= cf;
        let new_remainder = if remainder_overflow {
            remainder_sum - cf
        } else {
            remainder_sum
        };

        if needs_borrow && !remainder_overflow {
            self.bank.send_coins(
                storage,
                address,
                &self.reserve_address(),
                &self.integer_coins(U256::one()),
            )?;
        }

        if !needs_borrow && remainder_overflow {
            self.bank.burn_coins(
                storage,
                PRECISEBANK_MODULE_NAME,
                &self.integer_coins(U256::one()),
            )?;
        }

        if needs_borrow && remainder_overflow {
            integer_burn += U256::one();
        }

        if !integer_burn.is_zero() {
            self.bank
                .burn_coins(storage, module, &self.integer_coins(integer_burn))?;
        }

        self.set_fractional_balance(storage, address, new_fractional)?;
        self.set_remainder_amount(storage, new_remainder)
    }
}

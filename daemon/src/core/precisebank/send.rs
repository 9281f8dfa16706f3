use log::trace;
use primitive_types::U256;
use zena_common::{coin::Coins, config::PRECISEBANK_MODULE_NAME, crypto::Address};

use super::{PreciseBank, PreciseBankError};
use crate::core::{
    bank::BankError,
    error::BlockchainError,
    storage::{FractionalBalanceProvider, KvStore},
};

impl PreciseBank {
    /// Transfer coins between two accounts. The extended denom moves
    /// through the fractional balances, every other denom goes to the bank.
    pub fn send_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from: &Address,
        to: &Address,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        let reserve = self.reserve_address();
        if *from == reserve {
            return Err(PreciseBankError::SendFromReserve.into());
        }
        if *to == reserve {
            return Err(PreciseBankError::SendToReserve.into());
        }

        coins
            .validate()
            .map_err(|_| BankError::InvalidCoins(coins.to_string()))?;

        let (passthrough, extended) = self.split_coins(coins);
        if !extended.is_zero() {
            let integer_out = passthrough.amount_of(self.integer_denom());
            self.check_extended_funds(storage, from, extended, integer_out)?;
        }

        if !passthrough.is_empty() {
            self.bank.send_coins(storage, from, to, &passthrough)?;
        }

        if !extended.is_zero() {
            self.send_extended_coins(storage, from, to, extended)?;
        }

        Ok(())
    }

    pub fn send_coins_from_account_to_module<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from: &Address,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::SendToReserve.into());
        }

        let to = self.bank.module_address(module)?;
        self.send_coins(storage, from, &to, coins)
    }

    pub fn send_coins_from_module_to_account<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        to: &Address,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::SendFromReserve.into());
        }

        let from = self.bank.module_address(module)?;
        self.send_coins(storage, &from, to, coins)
    }

    pub fn send_coins_from_module_to_module<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from_module: &str,
        to_module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if from_module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::SendFromReserve.into());
        }
        if to_module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::SendToReserve.into());
        }

        let from = self.bank.module_address(from_module)?;
        let to = self.bank.module_address(to_module)?;
        self.send_coins(storage, &from, &to, coins)
    }

    // Funds were checked by the caller. The sender borrows one integer unit
    // when its fractional balance is too low, the recipient carries one
    // when its fractional balance overflows. Borrow and carry together
    // move the extra unit directly, otherwise it goes through the reserve.
    fn send_extended_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        if from == to {
            return Ok(());
        }

        let cf = self.conversion_factor.get();
        let (mut integer_amount, fractional_amount) = self.conversion_factor.split(amount);

        let sender_fractional = storage.get_fractional_balance(from)?;
        let recipient_fractional = storage.get_fractional_balance(to)?;

        let sender_needs_borrow = sender_fractional < fractional_amount;
        let new_sender_fractional = if sender_needs_borrow {
            sender_fractional + cf - fractional_amount
        } else {
            sender_fractional - fractional_amount
        };

        let recipient_sum = recipient_fractional + fractional_amount;
        let recipient_needs_carry = recipient_sum >= cf;
        let new_recipient_fractional = if recipient_needs_carry {
            recipient_sum - cf
        } else {
            recipient_sum
        };

        if sender_needs_borrow && recipient_needs_carry {
            integer_amount += U256::one();
        }

        if !integer_amount.is_zero() {
            self.bank
                .send_coins(storage, from, to, &self.integer_coins(integer_amount))?;
        }

        let reserve = self.reserve_address();
        if sender_needs_borrow && !recipient_needs_carry {
            trace!("{} borrows one unit from its integer balance", from);
            self.bank
                .send_coins(storage, from, &reserve, &self.integer_coins(U256::one()))?;
        }

        if !sender_needs_borrow && recipient_needs_carry {
            trace!("{} carries one unit from the reserve", to);
            self.bank
                .send_coins(storage, &reserve, to, &self.integer_coins(U256::one()))?;
        }

        self.set_fractional_balance(storage, from, new_sender_fractional)?;
        self.set_fractional_balance(storage, to, new_recipient_fractional)
    }
}

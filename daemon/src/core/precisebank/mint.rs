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
    /// Mint coins to a module account. The extended denom is split into
    /// integer units minted by the bank and a fractional part credited to
    /// the module, backed by the reserve.
    pub fn mint_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if module == PRECISEBANK_MODULE_NAME {
            return Err(PreciseBankError::MintToReserve.into());
        }

        if !self.bank.permissions(module)?.minter {
            return Err(BankError::NoMintPermission(module.to_string()).into());
        }

        coins
            .validate()
            .map_err(|_| BankError::InvalidCoins(coins.to_string()))?;

        let (passthrough, extended) = self.split_coins(coins);
        if !passthrough.is_empty() {
            self.bank.mint_coins(storage, module, &passthrough)?;
        }

        if !extended.is_zero() {
            let address = self.bank.module_address(module)?;
            self.mint_extended_coin(storage, module, &address, extended)?;
        }

        debug!("minted {} to module {}", coins, module);
        Ok(())
    }

    // A carry on the module fractional balance takes one unit out of the
    // reserve when the remainder covers the minted fraction, otherwise
    // that unit is minted directly. Without carry, a remainder too small
    // to back the fraction is topped up by minting one unit to the reserve.
    fn mint_extended_coin<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        address: &Address,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        let cf = self.conversion_factor.get();
        let (mut integer_mint, fractional_mint) = self.conversion_factor.split(amount);

        let fractional = storage.get_fractional_balance(address)?;
        let remainder = storage.get_remainder_amount()?;

        let remainder_insufficient = remainder < fractional_mint;
        let new_remainder = if remainder_insufficient {
            remainder + cf - fractional_mint
        } else {
            remainder - fractional_mint
        };

        let fractional_sum = fractional + fractional_mint;
        let carry = fractional_sum >= cf;
        let new_fractional = if carry {
            fractional_sum - cf
        } else {
            fractional_sum
        };

        if carry && !remainder_insufficient {
            self.bank.send_coins(
                storage,
                &self.reserve_address(),
                address,
                &self.integer_coins(U256::one()),
            )?;
        }

        if carry && remainder_insufficient {
            integer_mint += U256::one();
        }

        if !integer_mint.is_zero() {
            self.bank
                .mint_coins(storage, module, &self.integer_coins(integer_mint))?;
        }

        if !carry && remainder_insufficient {
            self.bank.mint_coins(
                storage,
                PRECISEBANK_MODULE_NAME,
                &self.integer_coins(U256::one()),
            )?;
        }

        self.set_fractional_balance(storage, address, new_fractional)?;
        self.set_remainder_amount(storage, new_remainder)
    }
}

use primitive_types::U256;

use crate::{
    account::{BaseAccount, EvmAccount},
    coin::{Coins, Dec},
    crypto::Address,
    params::{EvmParams, FeeMarketParams},
};

/// Native account store.
pub trait AccountKeeper<E> {
    fn get_account(&self, address: &Address) -> Result<Option<BaseAccount>, E>;

    /// Build a fresh account with the next account number, without storing it
    fn new_account_with_address(&mut self, address: &Address) -> Result<BaseAccount, E>;

    fn set_account(&mut self, account: BaseAccount) -> Result<(), E>;

    /// Sequence of an account, 0 for accounts that don't exist yet
    fn get_sequence(&self, address: &Address) -> Result<u64, E> {
        Ok(self
            .get_account(address)?
            .map(|account| account.sequence)
            .unwrap_or(0))
    }
}

/// View of the EVM module: parameters and the state database accounts.
/// Prices and balances are in the 18 decimals domain.
pub trait EvmKeeper<E> {
    fn get_evm_params(&self) -> Result<EvmParams, E>;

    /// Base fee for EVM transactions, None before london
    fn get_evm_base_fee(&self) -> Result<Option<U256>, E>;

    /// Global minimum gas price scaled to 18 decimals
    fn get_evm_min_gas_price(&self) -> Result<Dec, E>;

    /// Index of the transaction being processed in the current block
    fn get_tx_index_transient(&self) -> Result<u64, E>;

    fn get_evm_account(&self, address: &Address) -> Result<Option<EvmAccount>, E>;
}

/// Fee market state for the current block
pub trait FeeMarketKeeper<E> {
    fn get_fee_market_params(&self) -> Result<FeeMarketParams, E>;

    /// Current base fee, None when the base fee is disabled
    fn get_base_fee(&self) -> Result<Option<Dec>, E>;

    fn get_base_fee_enabled(&self) -> Result<bool, E>;

    fn get_min_gas_price(&self) -> Result<Dec, E> {
        Ok(self.get_fee_market_params()?.min_gas_price)
    }

    fn get_transient_gas_wanted(&self) -> Result<u64, E>;

    /// Add `gas` to the gas wanted of the current block and return the new total.
    /// Never rejects, enforcing the block limit is up to the caller
    fn add_transient_gas_wanted(&mut self, gas: u64) -> Result<u64, E>;
}

/// Balances as exposed by the fractional balance ledger.
/// Extended denom amounts include the fractional part.
pub trait BankKeeper<E> {
    fn get_balance(&self, address: &Address, denom: &str) -> Result<U256, E>;

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        coins: &Coins,
    ) -> Result<(), E>;
}

/// Every collaborator the admission pipeline needs, as one state view
pub trait AnteState<E>:
    AccountKeeper<E> + EvmKeeper<E> + FeeMarketKeeper<E> + BankKeeper<E>
{
}

impl<E, T> AnteState<E> for T where
    T: AccountKeeper<E> + EvmKeeper<E> + FeeMarketKeeper<E> + BankKeeper<E>
{
}

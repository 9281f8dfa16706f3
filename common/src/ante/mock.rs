use std::collections::HashMap;

use primitive_types::U256;

use super::{AccountKeeper, BankKeeper, EvmKeeper, FeeMarketKeeper};
use crate::{
    account::{BaseAccount, EvmAccount},
    coin::{Coins, Dec},
    config::DEFAULT_EXTENDED_DENOM,
    crypto::{Address, Hash},
    params::{EvmParams, FeeMarketParams},
};

// In memory collaborators for the decorator tests, 18 decimals chain
#[derive(Default)]
pub struct MockState {
    pub accounts: HashMap<Address, BaseAccount>,
    pub balances: HashMap<(Address, String), U256>,
    pub code_hashes: HashMap<Address, Hash>,
    pub evm_params: EvmParams,
    pub fee_market_params: FeeMarketParams,
    // Base fee of the fee market, None when disabled
    pub base_fee: Option<Dec>,
    // Base fee seen by the EVM, None before london
    pub evm_base_fee: Option<U256>,
    pub evm_min_gas_price: Dec,
    pub tx_index: u64,
    pub gas_wanted: u64,
}

impl MockState {
    pub fn set_balance(&mut self, address: &Address, denom: &str, amount: u64) {
        self.balances
            .insert((*address, denom.to_string()), U256::from(amount));
    }

    pub fn balance(&self, address: &Address, denom: &str) -> u64 {
        self.balances
            .get(&(*address, denom.to_string()))
            .map(|v| v.low_u64())
            .unwrap_or(0)
    }

    pub fn sequence(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.sequence).unwrap_or(0)
    }
}

impl AccountKeeper<String> for MockState {
    fn get_account(&self, address: &Address) -> Result<Option<BaseAccount>, String> {
        Ok(self.accounts.get(address).cloned())
    }

    fn new_account_with_address(&mut self, address: &Address) -> Result<BaseAccount, String> {
        Ok(BaseAccount::new(*address, self.accounts.len() as u64))
    }

    fn set_account(&mut self, account: BaseAccount) -> Result<(), String> {
        self.accounts.insert(account.address, account);
        Ok(())
    }
}

impl EvmKeeper<String> for MockState {
    fn get_evm_params(&self) -> Result<EvmParams, String> {
        Ok(self.evm_params.clone())
    }

    fn get_evm_base_fee(&self) -> Result<Option<U256>, String> {
        Ok(self.evm_base_fee)
    }

    fn get_evm_min_gas_price(&self) -> Result<Dec, String> {
        Ok(self.evm_min_gas_price)
    }

    fn get_tx_index_transient(&self) -> Result<u64, String> {
        Ok(self.tx_index)
    }

    fn get_evm_account(&self, address: &Address) -> Result<Option<EvmAccount>, String> {
        let balance = self
            .balances
            .get(&(*address, DEFAULT_EXTENDED_DENOM.to_string()))
            .copied();
        let account = self.accounts.get(address);
        if account.is_none() && balance.is_none() {
            return Ok(None);
        }

        let mut evm_account = EvmAccount::new(
            account.map(|a| a.sequence).unwrap_or(0),
            balance.unwrap_or_default(),
        );
        if let Some(code_hash) = self.code_hashes.get(address) {
            evm_account.code_hash = *code_hash;
        }
        Ok(Some(evm_account))
    }
}

impl FeeMarketKeeper<String> for MockState {
    fn get_fee_market_params(&self) -> Result<FeeMarketParams, String> {
        Ok(self.fee_market_params.clone())
    }

    fn get_base_fee(&self) -> Result<Option<Dec>, String> {
        Ok(self.base_fee)
    }

    fn get_base_fee_enabled(&self) -> Result<bool, String> {
        Ok(!self.fee_market_params.no_base_fee)
    }

    fn get_transient_gas_wanted(&self) -> Result<u64, String> {
        Ok(self.gas_wanted)
    }

    fn add_transient_gas_wanted(&mut self, gas: u64) -> Result<u64, String> {
        self.gas_wanted += gas;
        Ok(self.gas_wanted)
    }
}

impl BankKeeper<String> for MockState {
    fn get_balance(&self, address: &Address, denom: &str) -> Result<U256, String> {
        Ok(self
            .balances
            .get(&(*address, denom.to_string()))
            .copied()
            .unwrap_or_default())
    }

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        coins: &Coins,
    ) -> Result<(), String> {
        let to = Address::for_module(module);
        for coin in coins.iter() {
            let from_balance = self.get_balance(from, &coin.denom)?;
            let left = from_balance
                .checked_sub(coin.amount)
                .ok_or_else(|| "insufficient funds".to_string())?;
            let to_balance = self.get_balance(&to, &coin.denom)?;
            self.balances.insert((*from, coin.denom.clone()), left);
            self.balances
                .insert((to, coin.denom.clone()), to_balance + coin.amount);
        }
        Ok(())
    }
}

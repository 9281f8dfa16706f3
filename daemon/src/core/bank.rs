use indexmap::IndexMap;
use log::{debug, trace};
use primitive_types::U256;
use thiserror::Error;
use zena_common::{
    account::BaseAccount,
    coin::{Coin, Coins},
    config::{
        EVM_MODULE_NAME, FEEMARKET_MODULE_NAME, FEE_COLLECTOR_NAME, MINT_MODULE_NAME,
        PRECISEBANK_MODULE_NAME,
    },
    crypto::Address,
};

use crate::core::{
    error::BlockchainError,
    storage::{AccountProvider, BalanceProvider, KvStore},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("spendable balance {balance} is smaller than {amount}: insufficient funds")]
    InsufficientFunds { balance: String, amount: String },
    #[error("module account {0} does not exist: unknown address")]
    UnknownModule(String),
    #[error("module account {0} does not have permissions to mint tokens: unauthorized")]
    NoMintPermission(String),
    #[error("module account {0} does not have permissions to burn tokens: unauthorized")]
    NoBurnPermission(String),
    #[error("{0}: invalid coins")]
    InvalidCoins(String),
    #[error("balance overflow for {0}")]
    Overflow(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModulePermissions {
    pub minter: bool,
    pub burner: bool,
}

impl ModulePermissions {
    pub const NONE: Self = Self {
        minter: false,
        burner: false,
    };
    pub const MINTER: Self = Self {
        minter: true,
        burner: false,
    };
    pub const MINTER_BURNER: Self = Self {
        minter: true,
        burner: true,
    };
}

/// Integer bank of the chain.
///
/// Moves whole units between accounts and module accounts, and mints or
/// burns them for the modules allowed to. Module accounts are registered
/// up front with their permissions.
#[derive(Clone, Debug)]
pub struct Bank {
    modules: IndexMap<String, ModulePermissions>,
}

impl Default for Bank {
    fn default() -> Self {
        let mut modules = IndexMap::new();
        modules.insert(FEE_COLLECTOR_NAME.to_string(), ModulePermissions::NONE);
        modules.insert(MINT_MODULE_NAME.to_string(), ModulePermissions::MINTER);
        modules.insert(EVM_MODULE_NAME.to_string(), ModulePermissions::MINTER_BURNER);
        modules.insert(FEEMARKET_MODULE_NAME.to_string(), ModulePermissions::NONE);
        modules.insert(
            PRECISEBANK_MODULE_NAME.to_string(),
            ModulePermissions::MINTER_BURNER,
        );
        Self { modules }
    }
}

impl Bank {
    pub fn new(modules: IndexMap<String, ModulePermissions>) -> Self {
        Self { modules }
    }

    pub fn with_module<N: Into<String>>(mut self, name: N, permissions: ModulePermissions) -> Self {
        self.modules.insert(name.into(), permissions);
        self
    }

    pub fn modules(&self) -> impl Iterator<Item = (&String, &ModulePermissions)> {
        self.modules.iter()
    }

    pub fn module_address(&self, name: &str) -> Result<Address, BankError> {
        if !self.modules.contains_key(name) {
            return Err(BankError::UnknownModule(name.to_string()));
        }
        Ok(Address::for_module(name))
    }

    pub fn permissions(&self, name: &str) -> Result<&ModulePermissions, BankError> {
        self.modules
            .get(name)
            .ok_or_else(|| BankError::UnknownModule(name.to_string()))
    }

    pub fn get_balance<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        address: &Address,
        denom: &str,
    ) -> Result<U256, BlockchainError> {
        storage.get_balance_of(address, denom)
    }

    pub fn get_all_balances<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        address: &Address,
    ) -> Result<Coins, BlockchainError> {
        storage.get_all_balances(address)
    }

    pub fn get_supply<S: KvStore + ?Sized>(
        &self,
        storage: &S,
        denom: &str,
    ) -> Result<U256, BlockchainError> {
        storage.get_supply(denom)
    }

    pub fn send_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from: &Address,
        to: &Address,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        validate_coins(coins)?;
        trace!("send {} from {} to {}", coins, from, to);

        // Every debit is checked before the first write
        for coin in coins.iter() {
            let balance = storage.get_balance_of(from, &coin.denom)?;
            if balance < coin.amount {
                return Err(BankError::InsufficientFunds {
                    balance: Coin::new(coin.denom.clone(), balance).to_string(),
                    amount: coin.to_string(),
                }
                .into());
            }
        }

        for coin in coins.iter() {
            let balance = storage.get_balance_of(from, &coin.denom)?;
            storage.set_balance_of(from, &coin.denom, balance - coin.amount)?;
            self.add_balance(storage, to, coin)?;
        }

        ensure_account(storage, to)
    }

    pub fn send_coins_from_account_to_module<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from: &Address,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        let to = self.module_address(module)?;
        self.send_coins(storage, from, &to, coins)
    }

    pub fn send_coins_from_module_to_account<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        to: &Address,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        let from = self.module_address(module)?;
        self.send_coins(storage, &from, to, coins)
    }

    pub fn send_coins_from_module_to_module<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        from_module: &str,
        to_module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        let from = self.module_address(from_module)?;
        let to = self.module_address(to_module)?;
        self.send_coins(storage, &from, &to, coins)
    }

    pub fn mint_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if !self.permissions(module)?.minter {
            return Err(BankError::NoMintPermission(module.to_string()).into());
        }
        validate_coins(coins)?;

        let to = Address::for_module(module);
        for coin in coins.iter() {
            let supply = storage.get_supply(&coin.denom)?;
            let supply = supply
                .checked_add(coin.amount)
                .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
            self.add_balance(storage, &to, coin)?;
            storage.set_supply(&coin.denom, supply)?;
        }
        ensure_account(storage, &to)?;

        debug!("minted {} to module {}", coins, module);
        Ok(())
    }

    pub fn burn_coins<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        if !self.permissions(module)?.burner {
            return Err(BankError::NoBurnPermission(module.to_string()).into());
        }
        validate_coins(coins)?;

        let from = Address::for_module(module);
        for coin in coins.iter() {
            let balance = storage.get_balance_of(&from, &coin.denom)?;
            if balance < coin.amount {
                return Err(BankError::InsufficientFunds {
                    balance: Coin::new(coin.denom.clone(), balance).to_string(),
                    amount: coin.to_string(),
                }
                .into());
            }
        }

        for coin in coins.iter() {
            let balance = storage.get_balance_of(&from, &coin.denom)?;
            storage.set_balance_of(&from, &coin.denom, balance - coin.amount)?;
            let supply = storage.get_supply(&coin.denom)?;
            storage.set_supply(&coin.denom, supply.saturating_sub(coin.amount))?;
        }

        debug!("burned {} from module {}", coins, module);
        Ok(())
    }

    /// Credit a genesis balance, accounting it in the supply
    pub fn init_balance<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        address: &Address,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        validate_coins(coins)?;
        for coin in coins.iter() {
            let supply = storage
                .get_supply(&coin.denom)?
                .checked_add(coin.amount)
                .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
            self.add_balance(storage, address, coin)?;
            storage.set_supply(&coin.denom, supply)?;
        }
        ensure_account(storage, address)
    }

    fn add_balance<S: KvStore + ?Sized>(
        &self,
        storage: &mut S,
        address: &Address,
        coin: &Coin,
    ) -> Result<(), BlockchainError> {
        let balance = storage
            .get_balance_of(address, &coin.denom)?
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
        storage.set_balance_of(address, &coin.denom, balance)
    }
}

fn validate_coins(coins: &Coins) -> Result<(), BankError> {
    coins
        .validate()
        .map_err(|_| BankError::InvalidCoins(coins.to_string()))
}

// Receiving funds creates the account, like a transfer to a fresh address
fn ensure_account<S: KvStore + ?Sized>(
    storage: &mut S,
    address: &Address,
) -> Result<(), BlockchainError> {
    if storage.has_account(address)? {
        return Ok(());
    }

    let number = storage.next_account_number()?;
    trace!("creating account {} with number {}", address, number);
    storage.set_account(&BaseAccount::new(*address, number))
}

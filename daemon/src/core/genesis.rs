use std::{collections::HashSet, path::Path};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zena_common::{
    coin::{ChainCoinInfo, Coins},
    crypto::Address,
    params::EvmParams,
};

use super::{
    error::BlockchainError,
    feemarket::{self, FeeMarketGenesis},
    precisebank::{PreciseBank, PreciseBankGenesis},
    storage::{BalanceProvider, EvmStateProvider, KvStore},
};

/// Errors that can occur during genesis state loading and validation
#[derive(Error, Debug)]
pub enum GenesisError {
    #[error("Genesis state file not found: {0}")]
    FileNotFound(String),

    #[error("Duplicate account in genesis: {0}")]
    DuplicateAccount(Address),

    #[error("Invalid genesis balance for {address}: {reason}")]
    InvalidBalance { address: Address, reason: String },

    #[error("Genesis balance of {address} uses the extended denom {denom}")]
    ExtendedDenomBalance { address: Address, denom: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Integer balances of an account at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub coins: Coins,
}

/// Root structure of the genesis JSON file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub evm_params: EvmParams,
    #[serde(default)]
    pub fee_market: FeeMarketGenesis,
    #[serde(default)]
    pub precisebank: PreciseBankGenesis,
}

impl GenesisState {
    /// Stateless checks of every section
    pub fn validate(&self, coin_info: &ChainCoinInfo) -> Result<(), BlockchainError> {
        coin_info.validate()?;

        let mut seen = HashSet::with_capacity(self.accounts.len());
        for account in self.accounts.iter() {
            if !seen.insert(account.address) {
                return Err(GenesisError::DuplicateAccount(account.address).into());
            }

            account
                .coins
                .validate()
                .map_err(|e| GenesisError::InvalidBalance {
                    address: account.address,
                    reason: e.to_string(),
                })?;

            // Extended balances are rebuilt from the integer and fractional parts
            if coin_info.denom != coin_info.extended_denom
                && !account.coins.amount_of(&coin_info.extended_denom).is_zero()
            {
                return Err(GenesisError::ExtendedDenomBalance {
                    address: account.address,
                    denom: coin_info.extended_denom.clone(),
                }
                .into());
            }
        }

        self.fee_market.validate()?;
        self.precisebank
            .validate(coin_info.conversion_factor())?;
        Ok(())
    }
}

/// Load genesis state from a JSON file
pub fn load_genesis_state(path: &Path) -> Result<GenesisState, BlockchainError> {
    if !path.exists() {
        return Err(GenesisError::FileNotFound(path.to_string_lossy().to_string()).into());
    }

    let content = std::fs::read_to_string(path).map_err(GenesisError::from)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the genesis state into an empty store. The precisebank reserve
/// must be funded through `accounts` so that it backs the fractional
/// balances.
pub fn init_genesis<S: KvStore + ?Sized>(
    storage: &mut S,
    precisebank: &PreciseBank,
    genesis: &GenesisState,
) -> Result<(), BlockchainError> {
    genesis.validate(precisebank.coin_info())?;

    storage.set_evm_params(&genesis.evm_params)?;
    for account in genesis.accounts.iter() {
        precisebank
            .bank()
            .init_balance(storage, &account.address, &account.coins)?;
    }

    feemarket::init_genesis(storage, &genesis.fee_market)?;
    precisebank.init_genesis(storage, &genesis.precisebank)?;

    info!("genesis loaded with {} accounts", genesis.accounts.len());
    Ok(())
}

pub fn export_genesis<S: KvStore + ?Sized>(
    storage: &S,
    precisebank: &PreciseBank,
) -> Result<GenesisState, BlockchainError> {
    let accounts = storage
        .get_accounts_balances()?
        .into_iter()
        .map(|(address, coins)| GenesisAccount { address, coins })
        .collect();

    Ok(GenesisState {
        accounts,
        evm_params: storage.get_evm_params_or_default()?,
        fee_market: feemarket::export_genesis(storage)?,
        precisebank: precisebank.export_genesis(storage)?,
    })
}

use log::trace;
use zena_common::params::FeeMarketParams;

use crate::core::{
    error::BlockchainError,
    storage::{
        constants::{BLOCK_GAS_WANTED, FEE_MARKET_PARAMS, TRANSIENT_BLOCK_GAS_WANTED},
        Column, KvStore,
    },
};

/// Persisted state of the fee market.
///
/// The gas wanted of the previous block is durable, the gas wanted of the
/// current block lives in the transient column and is gone at the next
/// block. Both are big endian u64.
pub trait FeeMarketProvider {
    fn get_fee_market_params_or_default(&self) -> Result<FeeMarketParams, BlockchainError>;

    fn set_fee_market_params(&mut self, params: &FeeMarketParams) -> Result<(), BlockchainError>;

    fn get_block_gas_wanted(&self) -> Result<u64, BlockchainError>;

    fn set_block_gas_wanted(&mut self, gas: u64) -> Result<(), BlockchainError>;

    fn get_transient_gas_wanted(&self) -> Result<u64, BlockchainError>;

    fn set_transient_gas_wanted(&mut self, gas: u64) -> Result<(), BlockchainError>;

    // Saturates instead of overflowing, the caller enforces the block limit
    fn add_transient_gas_wanted(&mut self, gas: u64) -> Result<u64, BlockchainError> {
        let total = self.get_transient_gas_wanted()?.saturating_add(gas);
        self.set_transient_gas_wanted(total)?;
        Ok(total)
    }
}

impl<T: KvStore + ?Sized> FeeMarketProvider for T {
    fn get_fee_market_params_or_default(&self) -> Result<FeeMarketParams, BlockchainError> {
        Ok(self
            .load_optional(Column::FeeMarket, FEE_MARKET_PARAMS)?
            .unwrap_or_default())
    }

    fn set_fee_market_params(&mut self, params: &FeeMarketParams) -> Result<(), BlockchainError> {
        self.store(Column::FeeMarket, FEE_MARKET_PARAMS, params)
    }

    fn get_block_gas_wanted(&self) -> Result<u64, BlockchainError> {
        Ok(self
            .load_u64(Column::FeeMarket, BLOCK_GAS_WANTED)?
            .unwrap_or(0))
    }

    fn set_block_gas_wanted(&mut self, gas: u64) -> Result<(), BlockchainError> {
        trace!("set block gas wanted to {}", gas);
        self.store_u64(Column::FeeMarket, BLOCK_GAS_WANTED, gas)
    }

    fn get_transient_gas_wanted(&self) -> Result<u64, BlockchainError> {
        Ok(self
            .load_u64(Column::Transient, TRANSIENT_BLOCK_GAS_WANTED)?
            .unwrap_or(0))
    }

    fn set_transient_gas_wanted(&mut self, gas: u64) -> Result<(), BlockchainError> {
        self.store_u64(Column::Transient, TRANSIENT_BLOCK_GAS_WANTED, gas)
    }
}

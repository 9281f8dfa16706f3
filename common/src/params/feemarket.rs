use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    coin::Dec,
    config::{
        DEFAULT_BASE_FEE, DEFAULT_BASE_FEE_CHANGE_DENOMINATOR, DEFAULT_ELASTICITY_MULTIPLIER,
        DEFAULT_ENABLE_HEIGHT,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("base fee change denominator cannot be 0")]
    ZeroBaseFeeChangeDenominator,
    #[error("elasticity multiplier cannot be 0")]
    ZeroElasticityMultiplier,
    #[error("enable height cannot be negative: {0}")]
    NegativeEnableHeight(i64),
    #[error("base fee cannot be negative: {0}")]
    NegativeBaseFee(Dec),
    #[error("min gas price cannot be negative: {0}")]
    NegativeMinGasPrice(Dec),
    #[error("min gas multiplier cannot be negative: {0}")]
    NegativeMinGasMultiplier(Dec),
    #[error("min gas multiplier cannot be greater than 1: {0}")]
    MinGasMultiplierTooHigh(Dec),
    #[error("invalid chain config: {0}")]
    ChainConfig(String),
}

/// Parameters of the EIP-1559 fee market
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketParams {
    // Disables the base fee entirely, the chain falls back to legacy pricing
    pub no_base_fee: bool,
    // Bounds the amount the base fee can change between blocks
    pub base_fee_change_denominator: u32,
    // Bounds the maximum gas limit an EIP-1559 block may have
    pub elasticity_multiplier: u32,
    // Height at which the base fee calculation is enabled
    pub enable_height: i64,
    // Base fee of the current block
    pub base_fee: Dec,
    // Global floor for gas prices, also the lower bound of the base fee
    pub min_gas_price: Dec,
    // Fraction of the gas wanted accounted for the next base fee
    pub min_gas_multiplier: Dec,
}

impl Default for FeeMarketParams {
    fn default() -> Self {
        Self {
            no_base_fee: false,
            base_fee_change_denominator: DEFAULT_BASE_FEE_CHANGE_DENOMINATOR,
            elasticity_multiplier: DEFAULT_ELASTICITY_MULTIPLIER,
            enable_height: DEFAULT_ENABLE_HEIGHT,
            base_fee: Dec::from_u64(DEFAULT_BASE_FEE),
            min_gas_price: Dec::zero(),
            min_gas_multiplier: Dec::from_raw(500_000_000_000_000_000),
        }
    }
}

impl FeeMarketParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.base_fee_change_denominator == 0 {
            return Err(ParamsError::ZeroBaseFeeChangeDenominator);
        }

        if self.elasticity_multiplier == 0 {
            return Err(ParamsError::ZeroElasticityMultiplier);
        }

        if self.enable_height < 0 {
            return Err(ParamsError::NegativeEnableHeight(self.enable_height));
        }

        if self.base_fee.is_negative() {
            return Err(ParamsError::NegativeBaseFee(self.base_fee));
        }

        if self.min_gas_price.is_negative() {
            return Err(ParamsError::NegativeMinGasPrice(self.min_gas_price));
        }

        if self.min_gas_multiplier.is_negative() {
            return Err(ParamsError::NegativeMinGasMultiplier(self.min_gas_multiplier));
        }

        if self.min_gas_multiplier > Dec::one() {
            return Err(ParamsError::MinGasMultiplierTooHigh(self.min_gas_multiplier));
        }

        Ok(())
    }

    pub fn is_base_fee_enabled(&self, height: u64) -> bool {
        !self.no_base_fee && height as i128 >= self.enable_height as i128
    }
}

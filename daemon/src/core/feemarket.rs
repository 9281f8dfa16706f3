use log::{debug, trace};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use zena_common::{coin::Dec, error::DecError, params::FeeMarketParams};

use crate::core::{
    error::BlockchainError,
    storage::{FeeMarketProvider, KvStore},
};

/// Genesis state of the fee market
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketGenesis {
    pub params: FeeMarketParams,
    // Gas wanted of the block before the first one
    pub block_gas: u64,
}

impl FeeMarketGenesis {
    pub fn validate(&self) -> Result<(), BlockchainError> {
        Ok(self.params.validate()?)
    }
}

pub fn init_genesis<S: KvStore + ?Sized>(
    storage: &mut S,
    genesis: &FeeMarketGenesis,
) -> Result<(), BlockchainError> {
    genesis.validate()?;
    storage.set_fee_market_params(&genesis.params)?;
    storage.set_block_gas_wanted(genesis.block_gas)
}

pub fn export_genesis<S: KvStore + ?Sized>(storage: &S) -> Result<FeeMarketGenesis, BlockchainError> {
    Ok(FeeMarketGenesis {
        params: storage.get_fee_market_params_or_default()?,
        block_gas: storage.get_block_gas_wanted()?,
    })
}

/// Current base fee, None while the base fee is disabled
pub fn get_base_fee<S: KvStore + ?Sized>(storage: &S) -> Result<Option<Dec>, BlockchainError> {
    let params = storage.get_fee_market_params_or_default()?;
    if params.no_base_fee {
        return Ok(None);
    }
    Ok(Some(params.base_fee))
}

pub fn set_base_fee<S: KvStore + ?Sized>(storage: &mut S, base_fee: Dec) -> Result<(), BlockchainError> {
    let mut params = storage.get_fee_market_params_or_default()?;
    params.base_fee = base_fee;
    storage.set_fee_market_params(&params)
}

/// Base fee of the block at `height`, from the gas wanted of its parent.
///
/// `block_max_gas` is the gas limit of the block, `u64::MAX` when the
/// block is unlimited. Returns None when the base fee is not enabled at
/// this height.
pub fn calculate_base_fee<S: KvStore + ?Sized>(
    storage: &S,
    height: u64,
    block_max_gas: u64,
) -> Result<Option<Dec>, BlockchainError> {
    let params = storage.get_fee_market_params_or_default()?;
    if !params.is_base_fee_enabled(height) {
        return Ok(None);
    }

    // First block of the fee market starts from the configured base fee
    if height as i128 == params.enable_height as i128 {
        return Ok(Some(params.base_fee));
    }

    let parent_base_fee = params.base_fee;
    let parent_gas_used = storage.get_block_gas_wanted()?;
    // elasticity_multiplier is never 0 for validated params
    let parent_gas_target = block_max_gas / params.elasticity_multiplier.max(1) as u64;

    if parent_gas_used == parent_gas_target {
        return Ok(Some(parent_base_fee));
    }

    if parent_gas_target == 0 {
        return Ok(Some(Dec::zero()));
    }

    let denominator = params.base_fee_change_denominator as u64;
    if parent_gas_used > parent_gas_target {
        let delta = scaled_delta(
            &parent_base_fee,
            parent_gas_used - parent_gas_target,
            parent_gas_target,
        )?;
        let delta = delta.checked_quo_int(denominator)?.max(Dec::one());
        let base_fee = parent_base_fee.checked_add(&delta)?;
        trace!("base fee goes up by {} to {}", delta, base_fee);
        return Ok(Some(base_fee));
    }

    let delta = scaled_delta(
        &parent_base_fee,
        parent_gas_target - parent_gas_used,
        parent_gas_target,
    )?;
    let delta = delta.checked_quo_int(denominator)?;
    let base_fee = parent_base_fee
        .checked_sub(&delta)?
        .max(params.min_gas_price);
    trace!("base fee goes down by {} to {}", delta, base_fee);

    Ok(Some(base_fee))
}

// base_fee * gas_delta / gas_target, the division truncates
fn scaled_delta(base_fee: &Dec, gas_delta: u64, gas_target: u64) -> Result<Dec, DecError> {
    if base_fee.is_negative() {
        return Err(DecError::Negative);
    }

    let raw = U256::from(base_fee.raw() as u128) * U256::from(gas_delta) / U256::from(gas_target);
    if raw > U256::from(i128::MAX as u128) {
        return Err(DecError::Overflow);
    }
    Ok(Dec::from_raw(raw.as_u128() as i128))
}

/// Update the base fee for the block starting at `height`
pub fn begin_block<S: KvStore + ?Sized>(
    storage: &mut S,
    height: u64,
    block_max_gas: u64,
) -> Result<(), BlockchainError> {
    let Some(base_fee) = calculate_base_fee(storage, height, block_max_gas)? else {
        return Ok(());
    };

    set_base_fee(storage, base_fee)?;
    debug!("base fee for block {} is {}", height, base_fee);
    Ok(())
}

/// Record the gas wanted of the ending block, used by the next base fee.
/// The gas wanted of the txs is discounted by `min_gas_multiplier` but
/// never goes below the gas actually used.
pub fn end_block<S: KvStore + ?Sized>(storage: &mut S, gas_used: u64) -> Result<u64, BlockchainError> {
    let params = storage.get_fee_market_params_or_default()?;
    let gas_wanted = storage.get_transient_gas_wanted()?;

    let limited = params
        .min_gas_multiplier
        .checked_mul_int(U256::from(gas_wanted))?;
    let updated = limited
        .max(Dec::from_u64(gas_used))
        .truncate_u256()?;
    let updated = if updated > U256::from(u64::MAX) {
        u64::MAX
    } else {
        updated.low_u64()
    };

    storage.set_block_gas_wanted(updated)?;
    Ok(updated)
}

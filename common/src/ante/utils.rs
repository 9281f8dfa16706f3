use primitive_types::U256;

use super::{AnteContext, AnteError, EvmKeeper};
use crate::{
    coin::{Coins, Dec},
    config::DEFAULT_PRIORITY_REDUCTION,
    crypto::Address,
    error::CoinError,
    params::{EvmParams, Rules},
    transaction::{EvmTxData, Fee, Signer},
};

/// Values extracted once at the start of the EVM chain and shared by
/// every later decorator.
///
/// All prices and fees are in the 18 decimals domain.
#[derive(Clone, Debug)]
pub struct DecoratorUtils {
    pub evm_params: EvmParams,
    pub rules: Rules,
    pub signer: Signer,
    pub base_fee: Option<U256>,
    pub mempool_min_gas_price: Dec,
    pub global_min_gas_price: Dec,
    pub block_tx_index: u64,
    // Sum of the gas limits of the messages seen so far
    pub tx_gas_limit: u64,
    pub gas_wanted: u64,
    pub min_priority: i64,
    pub tx_fee: U256,
    // Set by the signature decorator
    pub sender: Option<Address>,
}

impl DecoratorUtils {
    pub fn new<S, E>(ctx: &AnteContext, state: &S) -> Result<Self, AnteError<E>>
    where
        S: EvmKeeper<E> + ?Sized,
    {
        let evm_params = state.get_evm_params().map_err(AnteError::State)?;
        let rules = ctx.chain_config.rules(ctx.height, ctx.time);
        let base_fee = state.get_evm_base_fee().map_err(AnteError::State)?;

        if rules.is_london && base_fee.is_none() {
            return Err(AnteError::InvalidBaseFee(
                "base fee is supported but evm block context value is nil".to_string(),
            ));
        }

        let global_min_gas_price = state.get_evm_min_gas_price().map_err(AnteError::State)?;
        let mempool_min_gas_price = ctx
            .coin_info
            .conversion_factor()
            .scale_price(&ctx.min_gas_prices.amount_of(&ctx.coin_info.denom))?;

        Ok(Self {
            evm_params,
            signer: Signer::new(&rules),
            rules,
            base_fee,
            mempool_min_gas_price,
            global_min_gas_price,
            block_tx_index: state.get_tx_index_transient().map_err(AnteError::State)?,
            tx_gas_limit: 0,
            gas_wanted: 0,
            min_priority: i64::MAX,
            tx_fee: U256::zero(),
            sender: None,
        })
    }
}

// Whether an integer fee is below a decimal requirement.
// A fee too large for a Dec is above any requirement that fits one.
fn is_below(fee: U256, required: &Dec) -> bool {
    match Dec::from_u256(fee) {
        Ok(fee) => fee < *required,
        Err(_) => false,
    }
}

fn required_fee(price: &Dec, gas_limit: u64) -> Result<Dec, CoinError> {
    Ok(price.checked_mul_int(U256::from(gas_limit))?)
}

/// Node local floor, checked in check mode only
pub fn check_mempool_fee<E>(
    fee: U256,
    mempool_min_gas_price: &Dec,
    gas_limit: u64,
) -> Result<(), AnteError<E>> {
    let required = required_fee(mempool_min_gas_price, gas_limit)?;
    if is_below(fee, &required) {
        return Err(AnteError::InsufficientFee(format!(
            "insufficient fee; got: {} required: {}",
            fee, required
        )));
    }

    Ok(())
}

/// Chain wide floor, a zero price disables it
pub fn check_global_fee<E>(
    fee: U256,
    global_min_gas_price: &Dec,
    gas_limit: u64,
) -> Result<(), AnteError<E>> {
    if global_min_gas_price.is_zero() {
        return Ok(());
    }

    let required = required_fee(global_min_gas_price, gas_limit)?;
    if is_below(fee, &required) {
        return Err(AnteError::InsufficientFee(format!(
            "provided fee < minimum global fee ({} < {}). Please increase the priority tip (for EIP-1559 txs) or the gas prices (for access list or legacy txs)",
            fee,
            required.truncate_i128()
        )));
    }

    Ok(())
}

/// Priority of an EVM transaction: the tip it pays above the base fee,
/// divided by the priority reduction.
///
/// Legacy transactions priced under the base fee get a negative priority.
/// A tip too large for an i64 gives `i64::MAX`.
pub fn get_tx_priority(data: &EvmTxData, base_fee: Option<U256>) -> i64 {
    let price = data.effective_gas_price(base_fee);
    let (tip, negative) = match base_fee {
        Some(base_fee) if price < base_fee => (base_fee - price, true),
        Some(base_fee) => (price - base_fee, false),
        None => (price, false),
    };

    let priority = tip / U256::from(DEFAULT_PRIORITY_REDUCTION);
    if priority > U256::from(i64::MAX as u64) {
        return i64::MAX;
    }

    let priority = priority.low_u64() as i64;
    if negative {
        -priority
    } else {
        priority
    }
}

/// Lowest priority among the messages of a transaction
pub fn get_msg_priority(data: &EvmTxData, min_priority: i64, base_fee: Option<U256>) -> i64 {
    min_priority.min(get_tx_priority(data, base_fee))
}

/// Gas wanted accumulated over the messages of a transaction.
/// In check mode a message can't claim more than `max_tx_gas_wanted`, 0 means no cap.
pub fn update_cumulative_gas_wanted(
    is_check_tx: bool,
    msg_gas_wanted: u64,
    max_tx_gas_wanted: u64,
    cumulative_gas_wanted: u64,
) -> u64 {
    let gas = if is_check_tx && max_tx_gas_wanted != 0 {
        msg_gas_wanted.min(max_tx_gas_wanted)
    } else {
        msg_gas_wanted
    };

    cumulative_gas_wanted.saturating_add(gas)
}

/// Reject a transaction wanting more gas than a whole block, otherwise
/// record its gas wanted and priority on the context
pub fn check_block_gas_limit<E>(
    mut ctx: AnteContext,
    gas_wanted: u64,
    min_priority: i64,
) -> Result<AnteContext, AnteError<E>> {
    if gas_wanted > ctx.block_gas_limit {
        return Err(AnteError::OutOfGas(format!(
            "tx gas ({}) exceeds block gas limit ({})",
            gas_wanted, ctx.block_gas_limit
        )));
    }

    ctx.gas_wanted = gas_wanted;
    ctx.priority = min_priority;
    Ok(ctx)
}

/// The fee declared by the transaction must be the one of its messages
pub fn check_tx_fee<E>(fee: &Fee, tx_fee: &Coins, tx_gas_limit: u64) -> Result<(), AnteError<E>> {
    if fee.amount != *tx_fee {
        return Err(AnteError::InvalidRequest(format!(
            "invalid AuthInfo Fee Amount ({} != {})",
            fee.amount, tx_fee
        )));
    }

    if fee.gas_limit != tx_gas_limit {
        return Err(AnteError::InvalidRequest(format!(
            "invalid AuthInfo Fee GasLimit ({} != {})",
            fee.gas_limit, tx_gas_limit
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ante::{ErrorKind, ExecMode},
        coin::Coin,
        crypto::Address,
        transaction::{DynamicFeeTx, LegacyTx},
    };

    fn legacy(gas_price: u64) -> EvmTxData {
        EvmTxData::Legacy(LegacyTx {
            chain_id: Some(9000),
            nonce: 0,
            gas_price: U256::from(gas_price),
            gas: 21_000,
            to: Some(Address::zero()),
            value: U256::zero(),
            data: Vec::new(),
        })
    }

    fn dynamic(tip: u64, cap: u64) -> EvmTxData {
        EvmTxData::DynamicFee(DynamicFeeTx {
            chain_id: 9000,
            nonce: 0,
            gas_tip_cap: U256::from(tip),
            gas_fee_cap: U256::from(cap),
            gas: 21_000,
            to: Some(Address::zero()),
            value: U256::zero(),
            data: Vec::new(),
            access_list: Vec::new(),
        })
    }

    #[test]
    fn test_tx_priority() {
        // No base fee: the whole price is the tip
        assert_eq!(get_tx_priority(&legacy(5_000_000), None), 5);

        // Tip capped by the fee cap
        let base_fee = Some(U256::from(1_000_000_000u64));
        assert_eq!(get_tx_priority(&dynamic(10_000_000, 1_005_000_000), base_fee), 5);
        assert_eq!(get_tx_priority(&dynamic(3_000_000, 2_000_000_000), base_fee), 3);

        // Legacy price under the base fee
        assert_eq!(get_tx_priority(&legacy(998_000_000), base_fee), -2);
    }

    #[test]
    fn test_msg_priority_keeps_minimum() {
        assert_eq!(get_msg_priority(&legacy(5_000_000), i64::MAX, None), 5);
        assert_eq!(get_msg_priority(&legacy(5_000_000), 2, None), 2);
    }

    #[test]
    fn test_cumulative_gas_wanted() {
        assert_eq!(update_cumulative_gas_wanted(true, 100, 40, 10), 50);
        assert_eq!(update_cumulative_gas_wanted(true, 100, 0, 10), 110);
        assert_eq!(update_cumulative_gas_wanted(false, 100, 40, 10), 110);
        assert_eq!(update_cumulative_gas_wanted(false, u64::MAX, 0, 10), u64::MAX);
    }

    #[test]
    fn test_mempool_and_global_fee() {
        let price = Dec::from_u64(10);
        assert!(check_mempool_fee::<String>(U256::from(1000), &price, 100).is_ok());

        let err = check_mempool_fee::<String>(U256::from(999), &price, 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);

        assert!(check_global_fee::<String>(U256::zero(), &Dec::zero(), 100).is_ok());
        let err = check_global_fee::<String>(U256::zero(), &price, 100).unwrap_err();
        assert!(err.to_string().starts_with("provided fee < minimum global fee (0 < 1000)"));

        // Fees too large for a decimal always pass
        assert!(check_global_fee::<String>(U256::MAX, &price, 100).is_ok());
    }

    #[test]
    fn test_block_gas_limit() {
        let ctx = AnteContext::new(1, 0, ExecMode::Deliver).with_block_gas_limit(100);
        let err = check_block_gas_limit::<String>(ctx.clone(), 101, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfGas);

        let ctx = check_block_gas_limit::<String>(ctx, 100, 7).unwrap();
        assert_eq!(ctx.gas_wanted, 100);
        assert_eq!(ctx.priority, 7);
    }

    #[test]
    fn test_check_tx_fee() {
        let amount = Coins::from(Coin::new("azena", 100u64));
        let fee = Fee {
            amount: amount.clone(),
            gas_limit: 10,
            payer: None,
        };
        assert!(check_tx_fee::<String>(&fee, &amount, 10).is_ok());
        assert!(check_tx_fee::<String>(&fee, &amount, 11).is_err());
        assert!(check_tx_fee::<String>(&fee, &Coins::empty(), 10).is_err());
    }
}

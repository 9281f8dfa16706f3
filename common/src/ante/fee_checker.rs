use log::trace;
use primitive_types::U256;

use super::{AnteContext, AnteError, FeeMarketKeeper};
use crate::{
    coin::{Coin, Coins, Dec},
    config::DEFAULT_PRIORITY_REDUCTION,
    error::CoinError,
    transaction::Transaction,
};

/// Computes the fee to deduct and the priority of a native transaction
pub type TxFeeChecker<S, E> =
    Box<dyn Fn(&AnteContext, &S, &Transaction) -> Result<(Coins, i64), AnteError<E>> + Send + Sync>;

/// Fee checker pricing native transactions with the EIP-1559 rules of the
/// fee market once london is active and a base fee exists, falling back
/// to the node minimum gas prices otherwise
pub fn new_dynamic_fee_checker<S, E>() -> TxFeeChecker<S, E>
where
    S: FeeMarketKeeper<E> + ?Sized + 'static,
    E: 'static,
{
    Box::new(check_tx_fee_with_dynamic_fee::<S, E>)
}

fn clamp_priority(value: U256) -> i64 {
    if value > U256::from(i64::MAX as u64) {
        i64::MAX
    } else {
        value.low_u64() as i64
    }
}

/// Dynamic fee branch of the fee checker.
///
/// The tip is bounded by the max priority price of the first
/// `ExtensionOptionDynamicFeeTx`, an option without a value means no tip
/// and no option means no bound. The fee cap is the fee divided by the gas
/// limit, the fee paid is `min(base fee + tip, fee cap) * gas`.
pub fn check_tx_fee_with_dynamic_fee<S, E>(
    ctx: &AnteContext,
    keeper: &S,
    tx: &Transaction,
) -> Result<(Coins, i64), AnteError<E>>
where
    S: FeeMarketKeeper<E> + ?Sized,
{
    // Genesis transactions
    if ctx.height == 0 {
        return check_tx_fee_with_validator_min_gas_prices(ctx, tx);
    }

    if !ctx.is_london() {
        return check_tx_fee_with_validator_min_gas_prices(ctx, tx);
    }

    let base_fee = match keeper.get_base_fee().map_err(AnteError::State)? {
        Some(base_fee) => base_fee,
        None => return check_tx_fee_with_validator_min_gas_prices(ctx, tx),
    };

    let max_priority_price = match tx.max_priority_price() {
        Some(Some(price)) => price,
        Some(None) => Dec::zero(),
        None => Dec::from_int(i64::MAX),
    };

    if max_priority_price.is_negative() {
        return Err(AnteError::InsufficientFee(
            "max priority price cannot be negative".to_string(),
        ));
    }

    let gas = tx.gas();
    if gas == 0 {
        return Err(AnteError::InvalidRequest(
            "gas limit must be positive".to_string(),
        ));
    }

    let denom = ctx.coin_info.denom.as_str();
    let fee_coins = &tx.fee.amount;
    if fee_coins.len() > 1 {
        return Err(AnteError::InvalidCoins(format!(
            "expected only one fee coin, got {}",
            fee_coins
        )));
    }

    if fee_coins.iter().any(|coin| coin.denom != denom) {
        return Err(AnteError::InvalidCoins(format!(
            "expected only native token {} for fee, but got {}",
            denom, fee_coins
        )));
    }

    let fee_cap = fee_coins.amount_of(denom) / U256::from(gas);
    let base_fee = base_fee.truncate_u256().map_err(CoinError::from)?;
    if fee_cap < base_fee {
        return Err(AnteError::InsufficientFee(format!(
            "gas prices too low, got: {}{} required: {}{}. Please retry using a higher gas price or a higher fee",
            fee_cap, denom, base_fee, denom
        )));
    }

    let tip = max_priority_price
        .truncate_u256()
        .map_err(CoinError::from)?;
    let effective_price = base_fee.saturating_add(tip).min(fee_cap);
    // Can't overflow, the effective price is at most the fee cap
    let effective_fee = effective_price * U256::from(gas);
    let priority = clamp_priority(
        (effective_price - base_fee) / U256::from(DEFAULT_PRIORITY_REDUCTION),
    );

    trace!(
        "dynamic fee: base fee {}, fee cap {}, effective price {}, priority {}",
        base_fee,
        fee_cap,
        effective_price,
        priority
    );

    Ok((Coins::from(Coin::new(denom, effective_fee)), priority))
}

/// Legacy branch of the fee checker.
///
/// In check mode the fee must cover the node minimum gas prices for at
/// least one denom, delivery accepts any fee. The priority is the lowest
/// gas price among the fee coins.
pub fn check_tx_fee_with_validator_min_gas_prices<E>(
    ctx: &AnteContext,
    tx: &Transaction,
) -> Result<(Coins, i64), AnteError<E>> {
    let fee_coins = &tx.fee.amount;
    let gas = tx.gas();

    if ctx.is_check_tx() && !ctx.min_gas_prices.is_zero() {
        let required = ctx.min_gas_prices.required_fees(gas)?;
        if !fee_coins.is_any_gte(&required) {
            return Err(AnteError::InsufficientFee(format!(
                "insufficient fees; got: {} required: {}",
                fee_coins, required
            )));
        }
    }

    Ok((fee_coins.clone(), get_tx_priority_from_fee(fee_coins, gas)))
}

fn get_tx_priority_from_fee(fees: &Coins, gas: u64) -> i64 {
    if gas == 0 {
        return 0;
    }

    let mut priority = 0;
    for fee in fees.iter() {
        let gas_price = fee.amount / U256::from(gas);
        let p = clamp_priority(gas_price / U256::from(DEFAULT_PRIORITY_REDUCTION));
        if priority == 0 || p < priority {
            priority = p;
        }
    }

    priority
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ante::{ErrorKind, ExecMode},
        coin::DecCoins,
        params::{ChainConfig, FeeMarketParams},
        transaction::{ExtensionOption, Fee},
    };
    use std::str::FromStr;

    struct MockFeeMarket {
        base_fee: Option<Dec>,
    }

    impl FeeMarketKeeper<String> for MockFeeMarket {
        fn get_fee_market_params(&self) -> Result<FeeMarketParams, String> {
            Ok(FeeMarketParams::default())
        }

        fn get_base_fee(&self) -> Result<Option<Dec>, String> {
            Ok(self.base_fee)
        }

        fn get_base_fee_enabled(&self) -> Result<bool, String> {
            Ok(true)
        }

        fn get_transient_gas_wanted(&self) -> Result<u64, String> {
            Ok(0)
        }

        fn add_transient_gas_wanted(&mut self, _: u64) -> Result<u64, String> {
            Ok(0)
        }
    }

    fn keeper(base_fee: Option<u64>) -> MockFeeMarket {
        MockFeeMarket {
            base_fee: base_fee.map(Dec::from_u64),
        }
    }

    fn london(enabled: bool) -> ChainConfig {
        ChainConfig {
            london_block: Some(if enabled { 0 } else { 10_000 }),
            ..Default::default()
        }
    }

    fn check_ctx() -> AnteContext {
        AnteContext::new(1, 0, ExecMode::Check)
            .with_chain_config(london(false))
            .with_min_gas_prices(DecCoins::from_str("10azena").unwrap())
    }

    fn deliver_ctx(london_enabled: bool) -> AnteContext {
        AnteContext::new(1, 0, ExecMode::Deliver).with_chain_config(london(london_enabled))
    }

    fn tx(gas: u64, fee: u64) -> Transaction {
        Transaction::new(
            Vec::new(),
            Fee {
                amount: Coins::from(Coin::new("azena", fee)),
                gas_limit: gas,
                payer: None,
            },
        )
    }

    fn with_tip(tx: Transaction, tip: Option<Dec>) -> Transaction {
        tx.with_extension_option(ExtensionOption::DynamicFeeTx {
            max_priority_price: tip,
        })
    }

    fn reduction() -> u64 {
        DEFAULT_PRIORITY_REDUCTION
    }

    fn check(
        ctx: &AnteContext,
        keeper: &MockFeeMarket,
        tx: &Transaction,
    ) -> Result<(Coins, i64), AnteError<String>> {
        new_dynamic_fee_checker::<MockFeeMarket, String>()(ctx, keeper, tx)
    }

    #[test]
    fn test_genesis_tx() {
        let ctx = AnteContext::new(0, 0, ExecMode::Deliver);
        let (fees, priority) = check(&ctx, &keeper(None), &Transaction::default()).unwrap();
        assert_eq!(fees.to_string(), "");
        assert_eq!(priority, 0);
    }

    #[test]
    fn test_min_gas_prices() {
        let err = check(&check_ctx(), &keeper(None), &Transaction::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);

        let (fees, priority) = check(&check_ctx(), &keeper(None), &tx(1, 10)).unwrap();
        assert_eq!(fees.to_string(), "10azena");
        assert_eq!(priority, 0);

        // Delivery accepts any fee
        let (fees, _) = check(&deliver_ctx(false), &keeper(None), &Transaction::default()).unwrap();
        assert!(fees.is_empty());
    }

    #[test]
    fn test_dynamic_fee_too_low() {
        let err = check(&deliver_ctx(true), &keeper(Some(1)), &tx(1, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
        assert!(err.to_string().starts_with("gas prices too low, got: 0azena required: 1azena"));
    }

    #[test]
    fn test_dynamic_fee() {
        let (fees, priority) = check(&deliver_ctx(true), &keeper(Some(10)), &tx(1, 10)).unwrap();
        assert_eq!(fees.to_string(), "10azena");
        assert_eq!(priority, 0);
    }

    #[test]
    fn test_dynamic_fee_priority() {
        let fee = 10 * reduction() + 10;
        let (fees, priority) = check(&deliver_ctx(true), &keeper(Some(10)), &tx(1, fee)).unwrap();
        assert_eq!(fees.to_string(), "10000010azena");
        assert_eq!(priority, 10);
    }

    #[test]
    fn test_dynamic_fee_empty_tip() {
        let tx = with_tip(tx(1, 10 * reduction()), None);
        let (fees, priority) = check(&deliver_ctx(true), &keeper(Some(10)), &tx).unwrap();
        assert_eq!(fees.to_string(), "10azena");
        assert_eq!(priority, 0);
    }

    #[test]
    fn test_dynamic_fee_tip() {
        let tip = Dec::from_u64(5 * reduction());
        let tx = with_tip(tx(1, 10 * reduction() + 10), Some(tip));
        let (fees, priority) = check(&deliver_ctx(true), &keeper(Some(10)), &tx).unwrap();
        assert_eq!(fees.to_string(), "5000010azena");
        assert_eq!(priority, 5);
    }

    #[test]
    fn test_negative_tip() {
        let tip = Dec::from_int(-5 * reduction() as i64);
        let tx = with_tip(tx(1, 10 * reduction() + 10), Some(tip));
        let err = check(&deliver_ctx(true), &keeper(Some(10)), &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
    }

    #[test]
    fn test_no_base_fee_falls_back() {
        // London but the base fee is disabled
        let (fees, priority) = check(&deliver_ctx(true), &keeper(None), &tx(1, 3 * reduction())).unwrap();
        assert_eq!(fees.to_string(), "3000000azena");
        assert_eq!(priority, 3);
    }

    #[test]
    fn test_dynamic_fee_coins() {
        let mut two = tx(1, 100);
        two.fee.amount = Coins::new(vec![Coin::new("azena", 100u64), Coin::new("stake", 1u64)]).unwrap();
        let err = check(&deliver_ctx(true), &keeper(Some(10)), &two).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCoins);

        let mut other = tx(1, 100);
        other.fee.amount = Coins::from(Coin::new("stake", 100u64));
        let err = check(&deliver_ctx(true), &keeper(Some(10)), &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCoins);
        assert!(err.to_string().starts_with("expected only native token azena for fee"));

        let err = check(&deliver_ctx(true), &keeper(Some(10)), &tx(0, 100)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_pricing_is_pure() {
        let tx = with_tip(tx(7, 70 * reduction()), Some(Dec::from_u64(2 * reduction())));
        let keeper = keeper(Some(10));
        let first = check(&deliver_ctx(true), &keeper, &tx).unwrap();
        let second = check(&deliver_ctx(true), &keeper, &tx).unwrap();
        assert_eq!(first, second);
    }
}

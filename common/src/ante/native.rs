use std::fmt::Display;

use log::{debug, trace};
use primitive_types::U256;

use super::{
    account::deduct_fees,
    evm::{ATTRIBUTE_KEY_FEE, ATTRIBUTE_KEY_FEE_PAYER, EVENT_TYPE_TX},
    new_dynamic_fee_checker, AccountKeeper, AnteChain, AnteContext, AnteDecorator, AnteError,
    AnteState, AuthzLimiterDecorator, BankKeeper, Event, FeeMarketKeeper, GasWantedDecorator,
    TxFeeChecker,
};
use crate::{
    coin::{Coin, Coins},
    config::MSG_ETHEREUM_TX_TYPE_URL,
    crypto::Address,
    transaction::{ExtensionOption, Msg, Transaction},
};

/// Rejects EVM messages smuggled into a native transaction
pub struct RejectMessagesDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for RejectMessagesDecorator {
    fn name(&self) -> &'static str {
        "reject_messages"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        if tx.msgs.iter().any(|msg| matches!(msg, Msg::EthereumTx(_))) {
            return Err(AnteError::InvalidTransactionType(format!(
                "{} needs to be contained within a tx with 'ExtensionOptionsEthereumTx' option",
                MSG_ETHEREUM_TX_TYPE_URL
            )));
        }

        Ok(ctx)
    }
}

/// Typed data signed through EIP-712 must target the EVM chain id
pub struct Web3TxChainIdDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for Web3TxChainIdDecorator {
    fn name(&self) -> &'static str {
        "web3_tx_chain_id"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        if let Some(ExtensionOption::Web3Tx {
            typed_data_chain_id,
            ..
        }) = tx.extension_options.first()
        {
            let expected = ctx.chain_config.chain_id;
            if *typed_data_chain_id != expected {
                return Err(AnteError::InvalidChainId(format!(
                    "invalid chain-id; expected {}, got {}",
                    expected, typed_data_chain_id
                )));
            }
        }

        Ok(ctx)
    }
}

/// Chain wide gas price floor of the fee market, in the integer denom
pub struct MinGasPriceDecorator;

impl<S, E> AnteDecorator<S, E> for MinGasPriceDecorator
where
    S: FeeMarketKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "min_gas_price"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        if simulate {
            return Ok(ctx);
        }

        let denom = ctx.coin_info.denom.as_str();
        let fee_coins = &tx.fee.amount;
        let valid_denom = match fee_coins.as_slice() {
            [] => true,
            [coin] => coin.denom == denom,
            _ => false,
        };

        if !valid_denom {
            return Err(AnteError::InvalidCoins(format!(
                "expected only native token {} for fee, but got {}",
                denom, fee_coins
            )));
        }

        let min_gas_price = state.get_min_gas_price().map_err(AnteError::State)?;
        if min_gas_price.is_zero() {
            return Ok(ctx);
        }

        let required = min_gas_price
            .checked_mul_int(U256::from(tx.gas()))
            .and_then(|fee| fee.ceil_u256())
            .map_err(crate::error::CoinError::from)?;
        let required_fees = Coins::from(Coin::new(denom, required));

        if !required_fees.is_empty() && !fee_coins.is_any_gte(&required_fees) {
            return Err(AnteError::InsufficientFee(format!(
                "provided fee < minimum global fee ({} < {}). Please increase the gas price.",
                fee_coins, required_fees
            )));
        }

        Ok(ctx)
    }
}

/// Runs the fee checker and moves the fee from the payer to the fee collector
pub struct DeductFeeDecorator<S: ?Sized, E> {
    fee_checker: TxFeeChecker<S, E>,
}

impl<S: ?Sized, E> DeductFeeDecorator<S, E> {
    pub fn new(fee_checker: TxFeeChecker<S, E>) -> Self {
        Self { fee_checker }
    }
}

// Payer of a native transaction, an EIP-712 fee payer comes first
fn fee_payer(tx: &Transaction) -> Option<Address> {
    let web3_payer = tx.extension_options.iter().find_map(|option| match option {
        ExtensionOption::Web3Tx { fee_payer, .. } => *fee_payer,
        _ => None,
    });

    web3_payer.or_else(|| tx.fee_payer())
}

impl<S, E> AnteDecorator<S, E> for DeductFeeDecorator<S, E>
where
    S: AccountKeeper<E> + BankKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "deduct_fee"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        if !simulate && ctx.height > 0 && tx.gas() == 0 {
            return Err(AnteError::InvalidRequest(
                "must provide positive gas".to_string(),
            ));
        }

        let (fee, priority) = if simulate {
            (tx.fee.amount.clone(), 0)
        } else {
            (self.fee_checker)(&ctx, &*state, tx)?
        };

        let payer = fee_payer(tx).ok_or_else(|| {
            AnteError::InvalidRequest("transaction has no fee payer".to_string())
        })?;

        if state.get_account(&payer).map_err(AnteError::State)?.is_none() {
            return Err(AnteError::UnknownAddress(format!(
                "fee payer address: {} does not exist",
                payer
            )));
        }

        deduct_fees(state, &payer, &fee)?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("deducted fee {} from {} with priority {}", fee, payer, priority);
        }

        ctx.emit(
            Event::new(EVENT_TYPE_TX)
                .with_attribute(ATTRIBUTE_KEY_FEE, fee.to_string())
                .with_attribute(ATTRIBUTE_KEY_FEE_PAYER, payer.to_string()),
        );
        ctx.priority = priority;
        Ok(ctx)
    }
}

/// Decorators of a native transaction, in order, pricing fees with the
/// dynamic fee checker
pub fn new_native_ante_chain<S, E>() -> AnteChain<S, E>
where
    S: AnteState<E> + ?Sized + 'static,
    E: Display + 'static,
{
    new_native_ante_chain_with_fee_checker(new_dynamic_fee_checker::<S, E>())
}

pub fn new_native_ante_chain_with_fee_checker<S, E>(
    fee_checker: TxFeeChecker<S, E>,
) -> AnteChain<S, E>
where
    S: AnteState<E> + ?Sized + 'static,
    E: Display + 'static,
{
    trace!("building native admission chain");
    AnteChain::new()
        .with(RejectMessagesDecorator)
        .with(AuthzLimiterDecorator::default())
        .with(Web3TxChainIdDecorator)
        .with(MinGasPriceDecorator)
        .with(DeductFeeDecorator::new(fee_checker))
        .with(GasWantedDecorator)
}

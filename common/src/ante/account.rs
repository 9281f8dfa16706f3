use log::debug;
use primitive_types::U256;

use super::{
    evm::{evm_msg, evm_sender, evm_utils},
    AccountKeeper, AnteContext, AnteDecorator, AnteError, BankKeeper, EvmKeeper,
};
use crate::{
    account::EvmAccount,
    coin::Coins,
    config::FEE_COLLECTOR_NAME,
    crypto::Address,
    transaction::{EvmTxData, Transaction},
};

/// The sender can pay for the whole transaction: `balance >= gas price * gas + value`
pub fn check_sender_balance<E>(balance: U256, data: &EvmTxData) -> Result<(), AnteError<E>> {
    let cost = data
        .cost()
        .ok_or_else(|| AnteError::InvalidCoins("tx cost overflows 256 bits".to_string()))?;

    if balance < cost {
        return Err(AnteError::InsufficientFunds(format!(
            "failed to check sender balance: sender balance < tx cost ({} < {})",
            balance, cost
        )));
    }

    Ok(())
}

/// The sender must be an externally owned account able to pay the cost of
/// the transaction.
///
/// A sender without account is created with a zero balance, the host
/// discards it together with the rest of the branch if the transaction is
/// rejected later on.
pub fn verify_account_balance<S, E>(
    state: &mut S,
    account: Option<&EvmAccount>,
    from: &Address,
    data: &EvmTxData,
) -> Result<(), AnteError<E>>
where
    S: AccountKeeper<E> + ?Sized,
{
    let balance = match account {
        Some(account) => {
            if account.is_contract() {
                return Err(AnteError::InvalidType(format!(
                    "the sender is not EOA: address {}",
                    from
                )));
            }
            account.balance
        }
        None => {
            debug!("creating account for new sender {}", from);
            let account = state
                .new_account_with_address(from)
                .map_err(AnteError::State)?;
            state.set_account(account).map_err(AnteError::State)?;
            U256::zero()
        }
    };

    check_sender_balance(balance, data)
}

/// Rules of the EVM block context: under london the fee cap covers the
/// base fee, and the sender holds the value it transfers
pub fn can_transfer<E>(
    account: Option<&EvmAccount>,
    from: &Address,
    data: &EvmTxData,
    base_fee: Option<U256>,
    is_london: bool,
) -> Result<(), AnteError<E>> {
    if is_london {
        let base_fee = base_fee.unwrap_or_default();
        if data.gas_fee_cap() < base_fee {
            return Err(AnteError::InsufficientFee(format!(
                "max fee per gas less than block base fee ({} < {})",
                data.gas_fee_cap(),
                base_fee
            )));
        }
    }

    let value = data.value();
    let balance = account.map(|account| account.balance).unwrap_or_default();
    if !value.is_zero() && balance < value {
        return Err(AnteError::InsufficientFunds(format!(
            "failed to transfer {} from address {} using the EVM block context transfer function",
            value, from
        )));
    }

    Ok(())
}

/// Move `fees` from `payer` to the fee collector, through the ledger
pub fn deduct_fees<S, E>(state: &mut S, payer: &Address, fees: &Coins) -> Result<(), AnteError<E>>
where
    S: BankKeeper<E> + ?Sized,
{
    if fees.is_zero() {
        return Ok(());
    }

    fees.validate()
        .map_err(|e| AnteError::InsufficientFee(format!("invalid fee amount: {}", e)))?;

    for fee in fees.iter() {
        let balance = state
            .get_balance(payer, &fee.denom)
            .map_err(AnteError::State)?;
        if balance < fee.amount {
            return Err(AnteError::InsufficientFunds(format!(
                "failed to deduct fees from {}: spendable balance {}{} is smaller than {}",
                payer, balance, fee.denom, fee
            )));
        }
    }

    state
        .send_coins_from_account_to_module(payer, FEE_COLLECTOR_NAME, fees)
        .map_err(AnteError::State)
}

/// Checks the sender is an EOA with enough balance for the cost
pub struct EthAccountVerificationDecorator;

impl<S, E> AnteDecorator<S, E> for EthAccountVerificationDecorator
where
    S: AccountKeeper<E> + EvmKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "eth_account_verification"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let from = evm_sender(evm_utils(&ctx)?)?;

        let account = state.get_evm_account(&from).map_err(AnteError::State)?;
        verify_account_balance(state, account.as_ref(), &from, &msg.data)?;
        Ok(ctx)
    }
}

pub struct CanTransferDecorator;

impl<S, E> AnteDecorator<S, E> for CanTransferDecorator
where
    S: EvmKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "can_transfer"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let utils = evm_utils(&ctx)?;
        let from = evm_sender(utils)?;

        let account = state.get_evm_account(&from).map_err(AnteError::State)?;
        can_transfer(
            account.as_ref(),
            &from,
            &msg.data,
            utils.base_fee,
            utils.rules.is_london,
        )?;
        Ok(ctx)
    }
}

use log::trace;

use super::{AnteContext, AnteDecorator, AnteError, FeeMarketKeeper};
use crate::transaction::Transaction;

/// Accumulates the gas wanted of the current block.
///
/// Nothing happens before london or while the base fee is disabled.
/// Otherwise the transaction is rejected with `OutOfGas` when the block
/// total would exceed the block gas limit, and nothing is recorded.
pub fn check_gas_wanted<S, E>(
    ctx: &AnteContext,
    keeper: &mut S,
    tx: &Transaction,
    is_london: bool,
) -> Result<(), AnteError<E>>
where
    S: FeeMarketKeeper<E> + ?Sized,
{
    if !is_london {
        return Ok(());
    }

    if !keeper.get_base_fee_enabled().map_err(AnteError::State)? {
        return Ok(());
    }

    let gas_wanted = tx.gas();
    let current = keeper.get_transient_gas_wanted().map_err(AnteError::State)?;
    let exceeds = match current.checked_add(gas_wanted) {
        Some(total) => total > ctx.block_gas_limit,
        None => true,
    };

    if exceeds {
        return Err(AnteError::OutOfGas(format!(
            "tx gas ({}) exceeds block gas limit ({}), block gas wanted so far {}",
            gas_wanted, ctx.block_gas_limit, current
        )));
    }

    let total = keeper
        .add_transient_gas_wanted(gas_wanted)
        .map_err(AnteError::State)?;
    trace!("block gas wanted is now {}", total);

    Ok(())
}

pub struct GasWantedDecorator;

impl<S, E> AnteDecorator<S, E> for GasWantedDecorator
where
    S: FeeMarketKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "gas_wanted"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let is_london = ctx.is_london();
        check_gas_wanted(&ctx, state, tx, is_london)?;
        Ok(ctx)
    }
}

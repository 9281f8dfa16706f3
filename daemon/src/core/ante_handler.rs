use log::{debug, trace};
use serde::{Deserialize, Serialize};
use zena_common::{
    ante::{
        new_evm_ante_chain, new_native_ante_chain, AnteChain, AnteContext, AnteError, ExecMode,
    },
    config::DEFAULT_BLOCK_GAS_LIMIT,
    transaction::{ExtensionOption, Transaction},
};

use super::{
    error::BlockchainError,
    state::ChainState,
    storage::Storage,
};

/// Options of the admission pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerOptions {
    // Upper bound of the gas wanted a single EVM tx may declare in check mode
    pub max_tx_gas_wanted: u64,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            max_tx_gas_wanted: DEFAULT_BLOCK_GAS_LIMIT,
        }
    }
}

/// Which chain admits a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Evm,
    Native,
}

/// Entry point of the admission pipeline.
///
/// Picks the decorator chain from the first extension option of the
/// transaction and runs it on a cache branch of the store. The branch is
/// committed only when the transaction is accepted in deliver mode outside
/// simulation; check and recheck runs leave the store untouched.
pub struct AnteHandler<S: Storage> {
    evm: AnteChain<ChainState<S>, BlockchainError>,
    native: AnteChain<ChainState<S>, BlockchainError>,
}

impl<S: Storage> AnteHandler<S> {
    pub fn new(options: &HandlerOptions) -> Self {
        Self {
            evm: new_evm_ante_chain(options.max_tx_gas_wanted),
            native: new_native_ante_chain(),
        }
    }

    pub fn route(tx: &Transaction) -> Result<Route, AnteError<BlockchainError>> {
        match tx.extension_options.first() {
            Some(ExtensionOption::EthereumTx) => Ok(Route::Evm),
            // EIP-712 txs are native txs, their chain id is checked by the native chain
            Some(ExtensionOption::DynamicFeeTx { .. })
            | Some(ExtensionOption::Web3Tx { .. })
            | None => Ok(Route::Native),
            Some(option) => Err(AnteError::UnknownExtensionOptions(format!(
                "rejecting tx with unsupported extension option: {}",
                option.type_url()
            ))),
        }
    }

    pub fn chain(&self, route: Route) -> &AnteChain<ChainState<S>, BlockchainError> {
        match route {
            Route::Evm => &self.evm,
            Route::Native => &self.native,
        }
    }

    pub fn ante_handle(
        &self,
        state: &mut ChainState<S>,
        ctx: AnteContext,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<BlockchainError>> {
        let route = Self::route(tx)?;
        trace!("admitting tx through the {:?} chain", route);

        state
            .storage_mut()
            .start_snapshot()
            .map_err(AnteError::State)?;

        let mode = ctx.mode;
        let result = self.chain(route).run(ctx, state, tx, simulate);
        let apply = result.is_ok() && !simulate && mode == ExecMode::Deliver;
        state
            .storage_mut()
            .end_snapshot(apply)
            .map_err(AnteError::State)?;

        if log::log_enabled!(log::Level::Debug) {
            match &result {
                Ok(ctx) => debug!(
                    "tx admitted with priority {} and gas wanted {}, committed: {}",
                    ctx.priority, ctx.gas_wanted, apply
                ),
                Err(e) => debug!("tx rejected ({}): {}", e.code(), e),
            }
        }

        result
    }
}

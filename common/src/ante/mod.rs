mod account;
mod authz;
mod error;
mod evm;
mod fee_checker;
mod gas_wanted;
#[cfg(test)]
mod mock;
mod native;
mod state;
mod utils;

use log::{debug, trace};

use crate::{
    coin::{ChainCoinInfo, DecCoins},
    params::ChainConfig,
    transaction::Transaction,
};

pub use account::*;
pub use authz::*;
pub use error::*;
pub use evm::*;
pub use fee_checker::*;
pub use gas_wanted::*;
pub use native::*;
pub use state::*;
pub use utils::*;

/// Mode the host runs the admission pipeline in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    // Mempool admission of a new transaction
    Check,
    // Mempool re-validation after a block was committed
    ReCheck,
    // Block execution
    Deliver,
}

impl ExecMode {
    pub fn is_check_tx(&self) -> bool {
        matches!(self, ExecMode::Check | ExecMode::ReCheck)
    }

    pub fn is_recheck_tx(&self) -> bool {
        matches!(self, ExecMode::ReCheck)
    }
}

/// Event emitted by a decorator, surfaced with the transaction result
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Execution context threaded through every decorator.
///
/// The block fields are set by the host before the run, `priority`,
/// `gas_wanted` and `events` are filled by the decorators. `evm` holds the
/// values extracted once by the setup decorator of the EVM chain.
#[derive(Clone, Debug)]
pub struct AnteContext {
    pub height: u64,
    // Block time in seconds
    pub time: u64,
    pub mode: ExecMode,
    // u64::MAX when the block has no gas limit
    pub block_gas_limit: u64,
    // Node local minimum gas prices, only enforced in check mode
    pub min_gas_prices: DecCoins,
    pub chain_config: ChainConfig,
    pub coin_info: ChainCoinInfo,
    pub priority: i64,
    pub gas_wanted: u64,
    pub events: Vec<Event>,
    pub evm: Option<DecoratorUtils>,
}

impl AnteContext {
    pub fn new(height: u64, time: u64, mode: ExecMode) -> Self {
        Self {
            height,
            time,
            mode,
            block_gas_limit: u64::MAX,
            min_gas_prices: DecCoins::empty(),
            chain_config: ChainConfig::default(),
            coin_info: ChainCoinInfo::default(),
            priority: 0,
            gas_wanted: 0,
            events: Vec::new(),
            evm: None,
        }
    }

    pub fn with_block_gas_limit(mut self, limit: u64) -> Self {
        self.block_gas_limit = limit;
        self
    }

    pub fn with_min_gas_prices(mut self, prices: DecCoins) -> Self {
        self.min_gas_prices = prices;
        self
    }

    pub fn with_chain_config(mut self, config: ChainConfig) -> Self {
        self.chain_config = config;
        self
    }

    pub fn with_coin_info(mut self, info: ChainCoinInfo) -> Self {
        self.coin_info = info;
        self
    }

    pub fn is_check_tx(&self) -> bool {
        self.mode.is_check_tx()
    }

    pub fn is_london(&self) -> bool {
        self.chain_config.is_london(self.height)
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// One validation step of the admission pipeline.
///
/// A decorator either returns the (possibly updated) context, letting the
/// next decorator run, or rejects the transaction. State writes go through
/// `state`, which the host runs on a cache branch.
pub trait AnteDecorator<S: ?Sized, E> {
    fn name(&self) -> &'static str;

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<E>>;
}

/// Ordered list of decorators applied one after the other.
/// The first rejection stops the chain.
pub struct AnteChain<S: ?Sized, E> {
    decorators: Vec<Box<dyn AnteDecorator<S, E> + Send + Sync>>,
}

impl<S: ?Sized, E> Default for AnteChain<S, E> {
    fn default() -> Self {
        Self {
            decorators: Vec::new(),
        }
    }
}

impl<S: ?Sized, E: std::fmt::Display> AnteChain<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<D>(mut self, decorator: D) -> Self
    where
        D: AnteDecorator<S, E> + Send + Sync + 'static,
    {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    pub fn run(
        &self,
        mut ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        for decorator in self.decorators.iter() {
            trace!("running decorator {}", decorator.name());
            ctx = match decorator.ante_handle(ctx, state, tx, simulate) {
                Ok(ctx) => ctx,
                Err(e) => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("transaction rejected by {}: {}", decorator.name(), e);
                    }
                    return Err(e);
                }
            };
        }

        Ok(ctx)
    }
}

use log::{debug, trace};
use primitive_types::U256;
use zena_common::{
    account::{BaseAccount, EvmAccount},
    ante::{AccountKeeper, AnteContext, BankKeeper, EvmKeeper, ExecMode, FeeMarketKeeper},
    coin::{Coins, Dec, DecCoins},
    crypto::Address,
    params::{ChainConfig, EvmParams, FeeMarketParams},
};

use super::{
    error::BlockchainError,
    feemarket,
    genesis::{self, GenesisState},
    precisebank::PreciseBank,
    storage::{Column, Storage},
};

/// State of the chain as seen while admitting transactions.
///
/// Owns the store and the block being built, and exposes every keeper
/// the admission pipeline consumes. Balances go through the fractional
/// ledger so the extended denom is always visible with its sub units.
pub struct ChainState<S: Storage> {
    storage: S,
    precisebank: PreciseBank,
    chain_config: ChainConfig,
    height: u64,
    // Block time in seconds
    time: u64,
    tx_index: u64,
    // u64::MAX when unlimited
    block_gas_limit: u64,
}

impl<S: Storage> ChainState<S> {
    pub fn new(storage: S, precisebank: PreciseBank, chain_config: ChainConfig) -> Self {
        Self {
            storage,
            precisebank,
            chain_config,
            height: 0,
            time: 0,
            tx_index: 0,
            block_gas_limit: u64::MAX,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn precisebank(&self) -> &PreciseBank {
        &self.precisebank
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn block_gas_limit(&self) -> u64 {
        self.block_gas_limit
    }

    /// Load the genesis state into the store
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<(), BlockchainError> {
        genesis::init_genesis(&mut self.storage, &self.precisebank, genesis)
    }

    pub fn export_genesis(&self) -> Result<GenesisState, BlockchainError> {
        genesis::export_genesis(&self.storage, &self.precisebank)
    }

    /// Start a new block: resets the per block state and moves the base fee
    pub fn begin_block(&mut self, height: u64, time: u64, block_gas_limit: u64) -> Result<(), BlockchainError> {
        debug!("begin block {} at {}", height, time);
        self.height = height;
        self.time = time;
        self.tx_index = 0;
        self.block_gas_limit = block_gas_limit;

        self.storage.clear_column(Column::Transient)?;
        feemarket::begin_block(&mut self.storage, height, block_gas_limit)
    }

    /// End the current block, returns the gas wanted kept for the next base fee
    pub fn end_block(&mut self, gas_used: u64) -> Result<u64, BlockchainError> {
        let gas_wanted = feemarket::end_block(&mut self.storage, gas_used)?;
        debug!(
            "end block {}: gas used {}, gas wanted {}",
            self.height, gas_used, gas_wanted
        );
        Ok(gas_wanted)
    }

    pub fn increment_tx_index(&mut self) {
        self.tx_index += 1;
    }

    /// Admission context for a transaction of the current block
    pub fn context(&self, mode: ExecMode, min_gas_prices: DecCoins) -> AnteContext {
        AnteContext::new(self.height, self.time, mode)
            .with_block_gas_limit(self.block_gas_limit)
            .with_min_gas_prices(min_gas_prices)
            .with_chain_config(self.chain_config.clone())
            .with_coin_info(self.precisebank.coin_info().clone())
    }
}

impl<S: Storage> AccountKeeper<BlockchainError> for ChainState<S> {
    fn get_account(&self, address: &Address) -> Result<Option<BaseAccount>, BlockchainError> {
        self.storage.get_account(address)
    }

    fn new_account_with_address(&mut self, address: &Address) -> Result<BaseAccount, BlockchainError> {
        let number = self.storage.next_account_number()?;
        trace!("new account {} with number {}", address, number);
        Ok(BaseAccount::new(*address, number))
    }

    fn set_account(&mut self, account: BaseAccount) -> Result<(), BlockchainError> {
        self.storage.set_account(&account)
    }
}

impl<S: Storage> EvmKeeper<BlockchainError> for ChainState<S> {
    fn get_evm_params(&self) -> Result<EvmParams, BlockchainError> {
        self.storage.get_evm_params_or_default()
    }

    fn get_evm_base_fee(&self) -> Result<Option<U256>, BlockchainError> {
        if !self.chain_config.is_london(self.height) {
            return Ok(None);
        }

        // A disabled fee market still prices london txs, at zero
        let Some(base_fee) = feemarket::get_base_fee(&self.storage)? else {
            return Ok(Some(U256::zero()));
        };

        let scaled = self
            .precisebank
            .conversion_factor()
            .scale_price_to_int(&base_fee)?;
        Ok(Some(scaled))
    }

    fn get_evm_min_gas_price(&self) -> Result<Dec, BlockchainError> {
        let min_gas_price = self.storage.get_fee_market_params_or_default()?.min_gas_price;
        Ok(self
            .precisebank
            .conversion_factor()
            .scale_price(&min_gas_price)?)
    }

    fn get_tx_index_transient(&self) -> Result<u64, BlockchainError> {
        Ok(self.tx_index)
    }

    fn get_evm_account(&self, address: &Address) -> Result<Option<EvmAccount>, BlockchainError> {
        let Some(account) = self.storage.get_account(address)? else {
            return Ok(None);
        };

        let balance = self.precisebank.get_balance(
            &self.storage,
            address,
            &self.precisebank.coin_info().extended_denom,
        )?;
        let mut evm_account = EvmAccount::new(account.sequence, balance);
        if let Some(code_hash) = self.storage.get_code_hash(address)? {
            evm_account.code_hash = code_hash;
        }

        Ok(Some(evm_account))
    }
}

impl<S: Storage> FeeMarketKeeper<BlockchainError> for ChainState<S> {
    fn get_fee_market_params(&self) -> Result<FeeMarketParams, BlockchainError> {
        self.storage.get_fee_market_params_or_default()
    }

    fn get_base_fee(&self) -> Result<Option<Dec>, BlockchainError> {
        feemarket::get_base_fee(&self.storage)
    }

    fn get_base_fee_enabled(&self) -> Result<bool, BlockchainError> {
        Ok(self
            .storage
            .get_fee_market_params_or_default()?
            .is_base_fee_enabled(self.height))
    }

    fn get_transient_gas_wanted(&self) -> Result<u64, BlockchainError> {
        self.storage.get_transient_gas_wanted()
    }

    fn add_transient_gas_wanted(&mut self, gas: u64) -> Result<u64, BlockchainError> {
        self.storage.add_transient_gas_wanted(gas)
    }
}

impl<S: Storage> BankKeeper<BlockchainError> for ChainState<S> {
    fn get_balance(&self, address: &Address, denom: &str) -> Result<U256, BlockchainError> {
        self.precisebank.get_balance(&self.storage, address, denom)
    }

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        coins: &Coins,
    ) -> Result<(), BlockchainError> {
        self.precisebank
            .send_coins_from_account_to_module(&mut self.storage, from, module, coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        bank::Bank,
        storage::{FeeMarketProvider, MemoryStorage},
    };
    use zena_common::{coin::ChainCoinInfo, config::FEE_COLLECTOR_NAME};

    fn coin_info() -> ChainCoinInfo {
        ChainCoinInfo {
            denom: "uzena".to_string(),
            extended_denom: "azena".to_string(),
            display_denom: "zena".to_string(),
            decimals: 6,
        }
    }

    fn state(london_block: Option<u64>) -> ChainState<MemoryStorage> {
        let config = ChainConfig {
            london_block,
            ..Default::default()
        };
        ChainState::new(
            MemoryStorage::new(),
            PreciseBank::new(Bank::default(), coin_info()),
            config,
        )
    }

    fn params(base_fee: u64, no_base_fee: bool) -> FeeMarketParams {
        FeeMarketParams {
            no_base_fee,
            base_fee: Dec::from_u64(base_fee),
            min_gas_price: Dec::from_raw(500_000_000_000_000_000),
            enable_height: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_evm_base_fee() {
        let mut state = state(Some(10));
        state
            .storage_mut()
            .set_fee_market_params(&params(7, false))
            .unwrap();

        state.height = 9;
        assert_eq!(state.get_evm_base_fee().unwrap(), None);

        state.height = 10;
        assert_eq!(
            state.get_evm_base_fee().unwrap(),
            Some(U256::from(7_000_000_000_000u64))
        );

        state
            .storage_mut()
            .set_fee_market_params(&params(7, true))
            .unwrap();
        assert_eq!(state.get_evm_base_fee().unwrap(), Some(U256::zero()));
        assert_eq!(state.get_base_fee().unwrap(), None);
    }

    #[test]
    fn test_evm_min_gas_price_is_scaled() {
        let mut state = state(Some(0));
        state
            .storage_mut()
            .set_fee_market_params(&params(1, false))
            .unwrap();

        // 0.5 uzena per gas is 0.5 * 10^12 azena per gas
        assert_eq!(
            state.get_evm_min_gas_price().unwrap(),
            Dec::from_u64(500_000_000_000)
        );
        assert_eq!(
            state.get_min_gas_price().unwrap(),
            Dec::from_raw(500_000_000_000_000_000)
        );
    }

    #[test]
    fn test_base_fee_enabled_follows_height() {
        let mut state = state(Some(0));
        let mut params = params(1, false);
        params.enable_height = 5;
        state.storage_mut().set_fee_market_params(&params).unwrap();

        state.height = 4;
        assert!(!state.get_base_fee_enabled().unwrap());
        state.height = 5;
        assert!(state.get_base_fee_enabled().unwrap());
    }

    #[test]
    fn test_evm_account() {
        let mut state = state(Some(0));
        let user = Address::new([1; 20]);
        assert_eq!(state.get_evm_account(&user).unwrap(), None);

        let mut account = state.new_account_with_address(&user).unwrap();
        account.sequence = 3;
        state.set_account(account).unwrap();
        state
            .precisebank
            .bank()
            .init_balance(
                &mut state.storage,
                &user,
                &Coins::from(zena_common::coin::Coin::new("uzena", 2u64)),
            )
            .unwrap();

        let evm_account = state.get_evm_account(&user).unwrap().unwrap();
        assert_eq!(evm_account.nonce, 3);
        assert_eq!(evm_account.balance, U256::from(2_000_000_000_000u64));
        assert!(!evm_account.is_contract());
        assert_eq!(state.get_sequence(&user).unwrap(), 3);
    }

    #[test]
    fn test_fee_goes_through_fractional_ledger() {
        let mut state = state(Some(0));
        let user = Address::new([1; 20]);
        state
            .precisebank
            .bank()
            .init_balance(
                &mut state.storage,
                &user,
                &Coins::from(zena_common::coin::Coin::new("uzena", 1u64)),
            )
            .unwrap();

        state
            .send_coins_from_account_to_module(
                &user,
                FEE_COLLECTOR_NAME,
                &Coins::from(zena_common::coin::Coin::new("azena", 250u64)),
            )
            .unwrap();

        let collector = Address::for_module(FEE_COLLECTOR_NAME);
        assert_eq!(state.get_balance(&collector, "azena").unwrap(), 250.into());
        assert_eq!(
            state.get_balance(&user, "azena").unwrap(),
            U256::from(1_000_000_000_000u64 - 250)
        );
        state.precisebank().check_reserve_backing(state.storage()).unwrap();
    }

    #[test]
    fn test_block_lifecycle() {
        let mut state = state(Some(0));
        state
            .storage_mut()
            .set_fee_market_params(&params(1, false))
            .unwrap();

        state.begin_block(1, 100, 1_000_000).unwrap();
        assert_eq!(state.add_transient_gas_wanted(40_000).unwrap(), 40_000);
        state.increment_tx_index();
        assert_eq!(state.get_tx_index_transient().unwrap(), 1);

        let ctx = state.context(ExecMode::Deliver, DecCoins::empty());
        assert_eq!(ctx.height, 1);
        assert_eq!(ctx.block_gas_limit, 1_000_000);
        assert_eq!(ctx.coin_info, coin_info());

        // min_gas_multiplier of 0.5 halves the gas wanted
        assert_eq!(state.end_block(10_000).unwrap(), 20_000);

        state.begin_block(2, 106, 1_000_000).unwrap();
        assert_eq!(state.get_transient_gas_wanted().unwrap(), 0);
        assert_eq!(state.get_tx_index_transient().unwrap(), 0);
    }
}

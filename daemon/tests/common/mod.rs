// Common test utilities for the admission pipeline tests
//
// Builds an in-memory chain with a 6 decimals native denom, so that the
// extended denom carries a 10^12 conversion factor.

#![allow(dead_code)]

use primitive_types::U256;
use zena_common::{
    coin::{ChainCoinInfo, Coin, Coins, Dec},
    crypto::{Address, SecretKey},
    params::{ChainConfig, FeeMarketParams},
    transaction::{EvmTxData, Fee, Msg, MsgSend, Signer, Transaction},
};
use zena_daemon::core::{
    bank::Bank,
    feemarket::FeeMarketGenesis,
    genesis::{GenesisAccount, GenesisState},
    precisebank::PreciseBank,
    state::ChainState,
    storage::MemoryStorage,
};

pub const DENOM: &str = "uzena";
pub const EXTENDED_DENOM: &str = "azena";
pub const BLOCK_GAS_LIMIT: u64 = 10_000_000;

pub fn coin_info() -> ChainCoinInfo {
    ChainCoinInfo {
        denom: DENOM.to_string(),
        extended_denom: EXTENDED_DENOM.to_string(),
        display_denom: "zena".to_string(),
        decimals: 6,
    }
}

pub fn precisebank() -> PreciseBank {
    PreciseBank::new(Bank::default(), coin_info())
}

pub fn conversion_factor() -> U256 {
    coin_info().conversion_factor().get()
}

pub fn alice() -> Address {
    Address::new([1; 20])
}

pub fn bob() -> Address {
    Address::new([2; 20])
}

/// Fee market enabled from block 1 with the given base fee
pub fn fee_market_params(base_fee: u64) -> FeeMarketParams {
    FeeMarketParams {
        base_fee: Dec::from_u64(base_fee),
        enable_height: 1,
        ..Default::default()
    }
}

pub fn integer(amount: u64) -> Coins {
    Coins::from(Coin::new(DENOM, amount))
}

pub fn extended(amount: U256) -> Coins {
    Coins::from(Coin::new(EXTENDED_DENOM, amount))
}

/// Chain at block 1 with funded integer accounts
pub fn chain_state(
    accounts: &[(Address, u64)],
    params: FeeMarketParams,
) -> ChainState<MemoryStorage> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut state = ChainState::new(MemoryStorage::new(), precisebank(), ChainConfig::default());
    let genesis = GenesisState {
        accounts: accounts
            .iter()
            .map(|(address, amount)| GenesisAccount {
                address: *address,
                coins: integer(*amount),
            })
            .collect(),
        fee_market: FeeMarketGenesis {
            params,
            block_gas: 0,
        },
        ..Default::default()
    };

    state.init_genesis(&genesis).unwrap();
    state.begin_block(1, 6, BLOCK_GAS_LIMIT).unwrap();
    state
}

/// Native transfer of one integer unit from alice
pub fn send_tx(fee: Coins, gas_limit: u64) -> Transaction {
    Transaction::new(
        vec![Msg::Send(MsgSend {
            from_address: alice(),
            to_address: bob(),
            amount: integer(1),
        })],
        Fee {
            amount: fee,
            gas_limit,
            payer: None,
        },
    )
}

pub fn evm_key() -> SecretKey {
    SecretKey::from_slice(&[7; 32]).unwrap()
}

/// Sign with the rules of block 1 and wrap the message in its transaction
pub fn evm_tx(data: EvmTxData) -> Transaction {
    let rules = ChainConfig::default().rules(1, 6);
    let msg = Signer::new(&rules).sign(data, &evm_key()).unwrap();
    Transaction::from_evm_msg(msg, EXTENDED_DENOM).unwrap()
}

mod account;
mod balance;
mod evm;
mod feemarket;
mod fractional;
mod snapshot;

pub use account::AccountProvider;
pub use balance::BalanceProvider;
pub use evm::EvmStateProvider;
pub use feemarket::FeeMarketProvider;
pub use fractional::FractionalBalanceProvider;
pub use snapshot::SnapshotProvider;

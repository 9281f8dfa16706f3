mod evm;
mod feemarket;

pub use evm::*;
pub use feemarket::*;

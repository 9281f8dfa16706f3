use zena_common::{
    crypto::{Address, Hash},
    params::EvmParams,
};

use crate::core::{
    error::BlockchainError,
    storage::{constants::EVM_PARAMS, Column, KvStore},
};

/// State of the EVM module the admission pipeline reads: its parameters
/// and the code hash of contract accounts.
pub trait EvmStateProvider {
    fn get_evm_params_or_default(&self) -> Result<EvmParams, BlockchainError>;

    fn set_evm_params(&mut self, params: &EvmParams) -> Result<(), BlockchainError>;

    // None for externally owned accounts
    fn get_code_hash(&self, address: &Address) -> Result<Option<Hash>, BlockchainError>;

    fn set_code_hash(&mut self, address: &Address, code_hash: &Hash)
        -> Result<(), BlockchainError>;
}

impl<T: KvStore + ?Sized> EvmStateProvider for T {
    fn get_evm_params_or_default(&self) -> Result<EvmParams, BlockchainError> {
        Ok(self
            .load_optional(Column::EvmParams, EVM_PARAMS)?
            .unwrap_or_default())
    }

    fn set_evm_params(&mut self, params: &EvmParams) -> Result<(), BlockchainError> {
        self.store(Column::EvmParams, EVM_PARAMS, params)
    }

    fn get_code_hash(&self, address: &Address) -> Result<Option<Hash>, BlockchainError> {
        self.load_optional(Column::EvmCode, address.as_bytes())
    }

    fn set_code_hash(
        &mut self,
        address: &Address,
        code_hash: &Hash,
    ) -> Result<(), BlockchainError> {
        self.store(Column::EvmCode, address.as_bytes(), code_hash)
    }
}

use log::trace;
use zena_common::{account::BaseAccount, crypto::Address};

use crate::core::{
    error::BlockchainError,
    storage::{constants::NEXT_ACCOUNT_NUMBER, Column, KvStore},
};

pub trait AccountProvider {
    fn get_account(&self, address: &Address) -> Result<Option<BaseAccount>, BlockchainError>;

    fn set_account(&mut self, account: &BaseAccount) -> Result<(), BlockchainError>;

    fn has_account(&self, address: &Address) -> Result<bool, BlockchainError>;

    // Return the next free account number and increment the counter
    fn next_account_number(&mut self) -> Result<u64, BlockchainError>;

    fn get_all_accounts(&self) -> Result<Vec<BaseAccount>, BlockchainError>;
}

impl<T: KvStore + ?Sized> AccountProvider for T {
    fn get_account(&self, address: &Address) -> Result<Option<BaseAccount>, BlockchainError> {
        trace!("get account {}", address);
        self.load_optional(Column::Account, address.as_bytes())
    }

    fn set_account(&mut self, account: &BaseAccount) -> Result<(), BlockchainError> {
        trace!(
            "set account {} sequence {}",
            account.address,
            account.sequence
        );
        self.store(Column::Account, account.address.as_bytes(), account)
    }

    fn has_account(&self, address: &Address) -> Result<bool, BlockchainError> {
        self.contains(Column::Account, address.as_bytes())
    }

    fn next_account_number(&mut self) -> Result<u64, BlockchainError> {
        let number = self
            .load_u64(Column::Common, NEXT_ACCOUNT_NUMBER)?
            .unwrap_or(0);
        self.store_u64(Column::Common, NEXT_ACCOUNT_NUMBER, number + 1)?;
        Ok(number)
    }

    fn get_all_accounts(&self) -> Result<Vec<BaseAccount>, BlockchainError> {
        self.iter_prefix(Column::Account, &[])?
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value)
                    .map_err(|e| BlockchainError::corrupted(Column::Account, key, e))
            })
            .collect()
    }
}

use primitive_types::U256;
use zena_common::{
    coin::{Coin, Coins},
    crypto::{Address, ADDRESS_SIZE},
};

use crate::core::{
    error::BlockchainError,
    storage::{Column, KvStore},
};

// {address}{denom}
fn balance_key(address: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ADDRESS_SIZE + denom.len());
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(denom.as_bytes());
    key
}

/// Integer balances and total supply of the bank.
/// Zero balances are never stored.
pub trait BalanceProvider {
    fn get_balance_of(&self, address: &Address, denom: &str) -> Result<U256, BlockchainError>;

    fn set_balance_of(
        &mut self,
        address: &Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), BlockchainError>;

    // Every non zero balance of an account, sorted by denom
    fn get_all_balances(&self, address: &Address) -> Result<Coins, BlockchainError>;

    // Every account holding a balance, with its coins
    fn get_accounts_balances(&self) -> Result<Vec<(Address, Coins)>, BlockchainError>;

    fn get_supply(&self, denom: &str) -> Result<U256, BlockchainError>;

    fn set_supply(&mut self, denom: &str, amount: U256) -> Result<(), BlockchainError>;
}

impl<T: KvStore + ?Sized> BalanceProvider for T {
    fn get_balance_of(&self, address: &Address, denom: &str) -> Result<U256, BlockchainError> {
        Ok(self
            .load_u256(Column::Balances, &balance_key(address, denom))?
            .unwrap_or_default())
    }

    fn set_balance_of(
        &mut self,
        address: &Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), BlockchainError> {
        let key = balance_key(address, denom);
        if amount.is_zero() {
            self.delete_raw(Column::Balances, &key)
        } else {
            self.store_u256(Column::Balances, &key, &amount)
        }
    }

    fn get_all_balances(&self, address: &Address) -> Result<Coins, BlockchainError> {
        let coins = self
            .iter_prefix(Column::Balances, address.as_bytes())?
            .into_iter()
            .map(|(key, value)| decode_balance(&key, &value).map(|(_, coin)| coin))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Coins::new(coins)?)
    }

    fn get_accounts_balances(&self) -> Result<Vec<(Address, Coins)>, BlockchainError> {
        let mut accounts: Vec<(Address, Vec<Coin>)> = Vec::new();
        for (key, value) in self.iter_prefix(Column::Balances, &[])? {
            let (address, coin) = decode_balance(&key, &value)?;
            match accounts.last_mut() {
                Some((last, coins)) if *last == address => coins.push(coin),
                _ => accounts.push((address, vec![coin])),
            }
        }

        accounts
            .into_iter()
            .map(|(address, coins)| Ok((address, Coins::new(coins)?)))
            .collect()
    }

    fn get_supply(&self, denom: &str) -> Result<U256, BlockchainError> {
        Ok(self
            .load_u256(Column::Supply, denom.as_bytes())?
            .unwrap_or_default())
    }

    fn set_supply(&mut self, denom: &str, amount: U256) -> Result<(), BlockchainError> {
        if amount.is_zero() {
            self.delete_raw(Column::Supply, denom.as_bytes())
        } else {
            self.store_u256(Column::Supply, denom.as_bytes(), &amount)
        }
    }
}

fn decode_balance(key: &[u8], value: &[u8]) -> Result<(Address, Coin), BlockchainError> {
    if key.len() <= ADDRESS_SIZE || value.len() != 32 {
        return Err(BlockchainError::corrupted(
            Column::Balances,
            key,
            "invalid balance entry",
        ));
    }

    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes.copy_from_slice(&key[..ADDRESS_SIZE]);
    let denom = std::str::from_utf8(&key[ADDRESS_SIZE..])
        .map_err(|e| BlockchainError::corrupted(Column::Balances, key, e))?;

    Ok((
        Address::new(bytes),
        Coin::new(denom, U256::from_big_endian(value)),
    ))
}

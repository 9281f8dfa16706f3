mod dec;
mod dec_coin;
mod fractional;

use std::fmt::{Display, Error, Formatter};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::CoinError;

pub use dec::*;
pub use dec_coin::*;
pub use fractional::*;

// Fixed width big endian encoding of an amount
pub fn u256_to_be_bytes(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = value.byte(31 - i);
    }
    out
}

// Denoms are 3 to 128 chars, starting with a letter
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let bytes = denom.as_bytes();
    let valid = (3..=128).contains(&bytes.len())
        && bytes[0].is_ascii_alphabetic()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'));

    if !valid {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new<D: Into<String>, A: Into<U256>>(denom: D, amount: A) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn zero<D: Into<String>>(denom: D) -> Self {
        Self::new(denom, U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Sorted set of coins with at most one entry per denom.
///
/// A `Coins` built through [`Coins::new`] never holds a zero amount, so
/// an empty set and a zero fee are the same value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new(coins: Vec<Coin>) -> Result<Self, CoinError> {
        let mut coins: Vec<Coin> = coins.into_iter().filter(|c| !c.is_zero()).collect();
        for coin in coins.iter() {
            coin.validate()?;
        }

        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for pair in coins.windows(2) {
            if pair[0].denom == pair[1].denom {
                return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
            }
        }

        Ok(Self(coins))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_coin(coin: Coin) -> Result<Self, CoinError> {
        Self::new(vec![coin])
    }

    /// Wrap coins without sanitizing them, used for inputs that must be
    /// validated later with [`Coins::validate`]
    pub fn from_unchecked(coins: Vec<Coin>) -> Self {
        Self(coins)
    }

    /// Checks the coins are sorted, unique and strictly positive
    pub fn validate(&self) -> Result<(), CoinError> {
        for coin in self.0.iter() {
            coin.validate()?;
            if coin.is_zero() {
                return Err(CoinError::NotPositive(coin.to_string()));
            }
        }

        for pair in self.0.windows(2) {
            if pair[0].denom == pair[1].denom {
                return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
            }
            if pair[0].denom > pair[1].denom {
                return Err(CoinError::Unsorted(self.to_string()));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Coin::is_zero)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Coin> {
        self.0
    }

    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or_default()
    }

    // True if at least one coin of `other` is covered by a non zero amount of `self`
    pub fn is_any_gte(&self, other: &Coins) -> bool {
        other.iter().any(|coin| {
            let amount = self.amount_of(&coin.denom);
            !amount.is_zero() && amount >= coin.amount
        })
    }

    // True if every coin of `other` is covered by `self`
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .iter()
            .all(|coin| self.amount_of(&coin.denom) >= coin.amount)
    }

    pub fn checked_add(&self, other: &Coins) -> Result<Coins, CoinError> {
        let mut result = self.0.clone();
        for coin in other.iter() {
            match result.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => {
                    existing.amount = existing
                        .amount
                        .checked_add(coin.amount)
                        .ok_or(CoinError::Overflow)?;
                }
                None => result.push(coin.clone()),
            }
        }

        Coins::new(result)
    }

    pub fn checked_sub(&self, other: &Coins) -> Result<Coins, CoinError> {
        let mut result = self.0.clone();
        for coin in other.iter() {
            let have = self.amount_of(&coin.denom);
            let left = have
                .checked_sub(coin.amount)
                .ok_or_else(|| CoinError::Insufficient {
                    need: coin.to_string(),
                    have: Coin::new(coin.denom.clone(), have).to_string(),
                })?;

            if let Some(existing) = result.iter_mut().find(|c| c.denom == coin.denom) {
                existing.amount = left;
            }
        }

        Coins::new(result)
    }
}

impl Display for Coins {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        if coin.is_zero() {
            Coins::empty()
        } else {
            Coins(vec![coin])
        }
    }
}

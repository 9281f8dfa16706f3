use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::{validate_denom, Coin, Coins, Dec};
use crate::error::CoinError;

/// A decimal amount of a denom, used for gas prices
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new<D: Into<String>>(denom: D, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl Display for DecCoin {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for DecCoin {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| CoinError::Parse(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        validate_denom(denom)?;

        let amount = Dec::from_str(amount)?;
        if amount.is_negative() {
            return Err(CoinError::Parse(s.to_string()));
        }

        Ok(DecCoin::new(denom, amount))
    }
}

/// Node-local minimum gas prices, one price per accepted fee denom
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    pub fn new(mut coins: Vec<DecCoin>) -> Result<Self, CoinError> {
        coins.retain(|c| !c.amount.is_zero());
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

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.amount.is_zero())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecCoin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> Dec {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or_default()
    }

    /// Fee required for `gas` units at these prices, rounded up per denom.
    /// Zero amounts are kept so every accepted denom stays listed.
    pub fn required_fees(&self, gas: u64) -> Result<Coins, CoinError> {
        let gas = Dec::from_u64(gas);
        let mut fees = Vec::with_capacity(self.0.len());
        for price in self.0.iter() {
            let fee = price.amount.checked_mul(&gas)?;
            fees.push(Coin::new(price.denom.clone(), fee.ceil_u256()?));
        }
        Ok(Coins::from_unchecked(fees))
    }
}

impl FromStr for DecCoins {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(DecCoins::empty());
        }

        let coins = s
            .split(',')
            .map(DecCoin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        DecCoins::new(coins)
    }
}

impl Display for DecCoins {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let parts: Vec<String> = self.0.iter().map(DecCoin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[test]
    fn test_parse_min_gas_prices() {
        let prices = DecCoins::from_str("0.0025azena,1uatom").unwrap();
        assert_eq!(prices.amount_of("azena"), Dec::from_str("0.0025").unwrap());
        assert_eq!(prices.amount_of("uatom"), Dec::one());
        assert!(DecCoins::from_str("").unwrap().is_zero());
        assert!(DecCoins::from_str("-1azena").is_err());
    }

    #[test]
    fn test_required_fees_round_up() {
        let prices = DecCoins::from_str("0.5aatom").unwrap();
        let fees = prices.required_fees(3).unwrap();
        assert_eq!(fees.amount_of("aatom"), U256::from(2));
    }
}

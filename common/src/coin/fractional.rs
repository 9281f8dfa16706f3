use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::Dec;
use crate::{
    config::{
        DEFAULT_DECIMALS, DEFAULT_DENOM, DEFAULT_DISPLAY_DENOM, DEFAULT_EXTENDED_DENOM,
        EVM_DECIMALS,
    },
    error::CoinError,
};

/// Denominations of the chain's fee coin.
///
/// `denom` is the integer unit tracked by the bank, `extended_denom` is
/// its 18-decimal view used by the EVM. Both are the same when the chain
/// already uses 18 decimals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCoinInfo {
    pub denom: String,
    pub extended_denom: String,
    pub display_denom: String,
    pub decimals: u8,
}

impl Default for ChainCoinInfo {
    fn default() -> Self {
        Self {
            denom: DEFAULT_DENOM.to_string(),
            extended_denom: DEFAULT_EXTENDED_DENOM.to_string(),
            display_denom: DEFAULT_DISPLAY_DENOM.to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl ChainCoinInfo {
    pub fn validate(&self) -> Result<(), CoinError> {
        super::validate_denom(&self.denom)?;
        super::validate_denom(&self.extended_denom)?;

        if self.decimals == 0 || self.decimals > EVM_DECIMALS {
            return Err(CoinError::Parse(format!(
                "decimals must be in [1, {}], got {}",
                EVM_DECIMALS, self.decimals
            )));
        }

        // An 18 decimals chain has no fractional part to track
        if (self.decimals == EVM_DECIMALS) != (self.denom == self.extended_denom) {
            return Err(CoinError::InvalidDenom(self.extended_denom.clone()));
        }

        Ok(())
    }

    pub fn conversion_factor(&self) -> ConversionFactor {
        ConversionFactor::from_decimals(self.decimals)
    }
}

/// `10^(18 - decimals)`, the number of extended units in one integer unit.
///
/// This is the only place where amounts move between the integer and the
/// extended domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionFactor(U256);

impl ConversionFactor {
    pub fn from_decimals(decimals: u8) -> Self {
        let exponent = EVM_DECIMALS.saturating_sub(decimals);
        Self(U256::from(10u64).pow(U256::from(exponent)))
    }

    pub fn get(&self) -> U256 {
        self.0
    }

    pub fn is_one(&self) -> bool {
        self.0 == U256::one()
    }

    /// Split an extended amount into its integer and fractional parts
    pub fn split(&self, extended: U256) -> (U256, U256) {
        (extended / self.0, extended % self.0)
    }

    /// Extended amount of `integer` units plus `fractional` sub units
    pub fn to_extended(&self, integer: U256, fractional: U256) -> Result<U256, CoinError> {
        integer
            .checked_mul(self.0)
            .and_then(|v| v.checked_add(fractional))
            .ok_or(CoinError::Overflow)
    }

    /// Scale a per gas price of the integer denom to the 18 decimals domain
    pub fn scale_price(&self, price: &Dec) -> Result<Dec, CoinError> {
        Ok(price.checked_mul_int(self.0)?)
    }

    /// Same as [`ConversionFactor::scale_price`], truncated to an integer amount
    pub fn scale_price_to_int(&self, price: &Dec) -> Result<U256, CoinError> {
        Ok(self.scale_price(price)?.truncate_u256()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_conversion_factor() {
        assert!(ConversionFactor::from_decimals(18).is_one());
        let cf = ConversionFactor::from_decimals(6);
        assert_eq!(cf.get(), U256::from(1_000_000_000_000u64));

        let (integer, fractional) = cf.split(U256::from(2_000_000_000_005u64));
        assert_eq!(integer, U256::from(2));
        assert_eq!(fractional, U256::from(5));
        assert_eq!(
            cf.to_extended(integer, fractional).unwrap(),
            U256::from(2_000_000_000_005u64)
        );
    }

    #[test]
    fn test_scale_price() {
        let cf = ConversionFactor::from_decimals(6);
        let price = Dec::from_str("0.5").unwrap();
        assert_eq!(
            cf.scale_price_to_int(&price).unwrap(),
            U256::from(500_000_000_000u64)
        );
    }

    #[test]
    fn test_coin_info_validation() {
        assert!(ChainCoinInfo::default().validate().is_ok());

        let six = ChainCoinInfo {
            denom: "utest".to_string(),
            extended_denom: "atest".to_string(),
            display_denom: "test".to_string(),
            decimals: 6,
        };
        assert!(six.validate().is_ok());

        let broken = ChainCoinInfo {
            extended_denom: "utest".to_string(),
            ..six
        };
        assert!(broken.validate().is_err());
    }
}

use std::{fs, path::Path, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zena_common::{
    coin::{ChainCoinInfo, DecCoins},
    config::DEFAULT_BLOCK_GAS_LIMIT,
    error::CoinError,
    params::{ChainConfig, ParamsError},
};

use crate::core::ante_handler::HandlerOptions;

// Mempool minimum gas prices, none by default
pub const DEFAULT_MIN_GAS_PRICES: &str = "";

// Gas wanted a single tx may declare in check mode
pub const DEFAULT_MAX_TX_GAS_WANTED: u64 = DEFAULT_BLOCK_GAS_LIMIT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid minimum gas prices '{value}': {source}")]
    MinGasPrices { value: String, source: CoinError },
    #[error("Invalid coin info: {0}")]
    CoinInfo(#[from] CoinError),
    #[error("Invalid chain config: {0}")]
    Chain(#[from] ParamsError),
    #[error("Max tx gas wanted {max_tx_gas_wanted} exceeds the block gas limit {block_gas_limit}")]
    MaxTxGasWanted {
        max_tx_gas_wanted: u64,
        block_gas_limit: u64,
    },
}

fn default_min_gas_prices() -> String {
    DEFAULT_MIN_GAS_PRICES.to_string()
}

fn default_max_tx_gas_wanted() -> u64 {
    DEFAULT_MAX_TX_GAS_WANTED
}

fn default_block_gas_limit() -> u64 {
    DEFAULT_BLOCK_GAS_LIMIT
}

/// Node configuration of the admission pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    // Decimal coins such as "0.0025uzena", only enforced in check mode
    #[serde(default = "default_min_gas_prices")]
    pub min_gas_prices: String,
    #[serde(default = "default_max_tx_gas_wanted")]
    pub max_tx_gas_wanted: u64,
    // 0 means no block gas limit
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub coin_info: ChainCoinInfo,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            min_gas_prices: default_min_gas_prices(),
            max_tx_gas_wanted: default_max_tx_gas_wanted(),
            block_gas_limit: default_block_gas_limit(),
            chain: ChainConfig::default(),
            coin_info: ChainCoinInfo::default(),
        }
    }
}

impl NodeConfig {
    /// Load a JSON configuration file, missing fields take their default
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: NodeConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_min_gas_prices()?;
        self.coin_info.validate()?;
        self.chain.validate()?;

        let block_gas_limit = self.block_gas_limit();
        if self.max_tx_gas_wanted > block_gas_limit {
            return Err(ConfigError::MaxTxGasWanted {
                max_tx_gas_wanted: self.max_tx_gas_wanted,
                block_gas_limit,
            });
        }

        Ok(())
    }

    pub fn parse_min_gas_prices(&self) -> Result<DecCoins, ConfigError> {
        DecCoins::from_str(&self.min_gas_prices).map_err(|source| ConfigError::MinGasPrices {
            value: self.min_gas_prices.clone(),
            source,
        })
    }

    /// Block gas limit as seen by the pipeline, `u64::MAX` when unlimited
    pub fn block_gas_limit(&self) -> u64 {
        if self.block_gas_limit == 0 {
            u64::MAX
        } else {
            self.block_gas_limit
        }
    }

    pub fn handler_options(&self) -> HandlerOptions {
        HandlerOptions {
            max_tx_gas_wanted: self.max_tx_gas_wanted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zena_common::coin::Dec;

    #[test]
    fn test_defaults() {
        let config: NodeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert!(config.validate().is_ok());
        assert!(config.parse_min_gas_prices().unwrap().is_zero());
    }

    #[test]
    fn test_min_gas_prices() {
        let config = NodeConfig {
            min_gas_prices: "0.0025azena".to_string(),
            ..Default::default()
        };
        let prices = config.parse_min_gas_prices().unwrap();
        assert_eq!(prices.amount_of("azena"), Dec::from_str("0.0025").unwrap());

        let invalid = NodeConfig {
            min_gas_prices: "abc".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            invalid.validate(),
            Err(ConfigError::MinGasPrices { .. })
        ));
    }

    #[test]
    fn test_block_gas_limit() {
        let config = NodeConfig {
            block_gas_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.block_gas_limit(), u64::MAX);

        let config = NodeConfig {
            block_gas_limit: 1_000,
            max_tx_gas_wanted: 2_000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxTxGasWanted { .. })
        ));
    }

    #[test]
    fn test_load() {
        let dir = std::env::temp_dir().join(format!("zena-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{"min_gas_prices": "1azena", "block_gas_limit": 30000000, "max_tx_gas_wanted": 1000000}"#,
        )
        .unwrap();

        let config = NodeConfig::load(&path).unwrap();
        assert_eq!(config.block_gas_limit(), 30_000_000);
        assert_eq!(config.handler_options().max_tx_gas_wanted, 1_000_000);
        assert_eq!(config.chain, ChainConfig::default());

        assert!(NodeConfig::load(dir.join("missing.json")).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}

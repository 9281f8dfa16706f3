use serde::{Deserialize, Serialize};

use super::ParamsError;

// Chain id of the reference network
pub const DEFAULT_EVM_CHAIN_ID: u64 = 262144;

/// Fork schedule of the embedded EVM
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub homestead_block: u64,
    pub istanbul_block: u64,
    pub berlin_block: u64,
    // None keeps the chain on pre-London rules forever
    pub london_block: Option<u64>,
    pub shanghai_time: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_EVM_CHAIN_ID,
            homestead_block: 0,
            istanbul_block: 0,
            berlin_block: 0,
            london_block: Some(0),
            shanghai_time: Some(0),
        }
    }
}

/// Rules active at a given block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    pub chain_id: u64,
    pub is_homestead: bool,
    pub is_istanbul: bool,
    pub is_berlin: bool,
    pub is_london: bool,
    pub is_shanghai: bool,
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.chain_id == 0 {
            return Err(ParamsError::ChainConfig("chain id cannot be 0".to_string()));
        }

        if self.istanbul_block < self.homestead_block || self.berlin_block < self.istanbul_block {
            return Err(ParamsError::ChainConfig(
                "forks must be scheduled in order".to_string(),
            ));
        }

        if let Some(london) = self.london_block {
            if london < self.berlin_block {
                return Err(ParamsError::ChainConfig(
                    "london must be scheduled after berlin".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn is_london(&self, height: u64) -> bool {
        self.london_block.map_or(false, |london| height >= london)
    }

    pub fn rules(&self, height: u64, time: u64) -> Rules {
        let is_london = self.is_london(height);
        Rules {
            chain_id: self.chain_id,
            is_homestead: height >= self.homestead_block,
            is_istanbul: height >= self.istanbul_block,
            is_berlin: height >= self.berlin_block,
            is_london,
            is_shanghai: is_london && self.shanghai_time.map_or(false, |t| time >= t),
        }
    }
}

/// EVM module parameters consumed by the admission pipeline.
/// The fork schedule is chain wide and lives in [`ChainConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmParams {
    // Accept legacy transactions signed without a chain id
    pub allow_unprotected_txs: bool,
    pub enable_create: bool,
    pub enable_call: bool,
}

impl Default for EvmParams {
    fn default() -> Self {
        Self {
            allow_unprotected_txs: false,
            enable_create: true,
            enable_call: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules() {
        let config = ChainConfig {
            london_block: Some(5),
            ..Default::default()
        };
        assert!(!config.rules(4, 0).is_london);
        assert!(config.rules(5, 0).is_london);
        assert!(config.rules(5, 0).is_shanghai);

        let never = ChainConfig {
            london_block: None,
            ..Default::default()
        };
        assert!(!never.is_london(u64::MAX));
        assert!(!never.rules(10, 10).is_shanghai);
    }

    #[test]
    fn test_validate() {
        assert!(ChainConfig::default().validate().is_ok());
        let config = ChainConfig {
            chain_id: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

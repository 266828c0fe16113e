use serde::{Deserialize, Serialize};

use crate::gas::GasSchedule;

/// Default chain id.
const DEFAULT_CHAIN_ID: u64 = 1666;

/// Default limit on deployed code size, in bytes.
const DEFAULT_MAX_CODE_SIZE: usize = 24_576;

/// Chain configuration the block executor runs under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Largest code payload a code deploy may install.
    #[serde(default = "default_max_code_size")]
    pub max_code_size: usize,

    #[serde(default)]
    pub gas: GasSchedule,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_max_code_size() -> usize {
    DEFAULT_MAX_CODE_SIZE
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            max_code_size: DEFAULT_MAX_CODE_SIZE,
            gas: GasSchedule::default(),
        }
    }
}

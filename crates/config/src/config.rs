use std::{
    fs,
    path::{Path, PathBuf},
};

use parexec_params::ChainConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default value for `serial_threshold` in [`ExecutorConfig`].
const DEFAULT_SERIAL_THRESHOLD: usize = 4;

/// Default maximum transactions per block.
const DEFAULT_MAX_TXS_PER_BLOCK: usize = 4096;

/// How blocks are executed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// One transaction at a time.
    Serial,

    /// Leveled, with small blocks routed to the serial path.
    #[default]
    Parallel,

    /// Both paths on every block, failing on any divergence.
    Shadow,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub mode: ExecMode,

    /// Blocks with fewer transactions than this skip leveling.
    #[serde(default = "default_serial_threshold")]
    pub serial_threshold: usize,

    /// Upper bound on block size, keeping leveling's quadratic cost in check.
    #[serde(default = "default_max_txs_per_block")]
    pub max_txs_per_block: usize,

    /// Size of the worker pool, 0 picks the available parallelism.
    #[serde(default)]
    pub worker_threads: usize,
}

fn default_serial_threshold() -> usize {
    DEFAULT_SERIAL_THRESHOLD
}

fn default_max_txs_per_block() -> usize {
    DEFAULT_MAX_TXS_PER_BLOCK
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ExecMode::default(),
            serial_threshold: DEFAULT_SERIAL_THRESHOLD,
            max_txs_per_block: DEFAULT_MAX_TXS_PER_BLOCK,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.max_txs_per_block == 0 {
            return Err(ConfigError::Invalid("executor.max_txs_per_block must be nonzero"));
        }
        if self.chain.gas.refund_quotient == 0 {
            return Err(ConfigError::Invalid("chain.gas.refund_quotient must be nonzero"));
        }
        Ok(())
    }
}

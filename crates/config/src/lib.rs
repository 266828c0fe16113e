//! TOML configuration of the executor and the tools around it.

mod config;
mod error;

pub use config::{Config, ExecMode, ExecutorConfig, LoggingConfig};
pub use error::ConfigError;

//! Chain-wide parameters consumed by the state transition.

mod chain;
mod gas;

pub use chain::ChainConfig;
pub use gas::{GasError, GasSchedule, intrinsic_gas, ttl_gas};

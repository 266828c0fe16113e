//! Gas schedule and the intrinsic gas rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum GasError {
    #[error("gas computation overflowed")]
    Overflow,

    #[error("ttl must be nonzero")]
    ZeroTtl,
}

/// Gas costs.  Field defaults match the values every test in the workspace
/// assumes, so partial configs only override what they name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Base cost of every message.
    pub tx_gas: u64,

    /// Base cost of a code deploy, replacing `tx_gas`.
    pub tx_gas_code_deploy: u64,

    pub data_zero_gas: u64,
    pub data_nonzero_gas: u64,

    /// Flat execution cost of a system action.
    pub sys_action_gas: u64,

    /// Retention cost per block of TTL for a code deploy.
    pub code_ttl_block_gas: u64,

    /// Retention cost per block of TTL for a KV record.
    pub kv_ttl_block_gas: u64,

    /// Refund granted when a KV put overwrites a record that existed before
    /// the transaction started.  Capped at `gas_used / refund_quotient`.
    pub kv_overwrite_refund: u64,

    pub refund_quotient: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            tx_gas: 21_000,
            tx_gas_code_deploy: 53_000,
            data_zero_gas: 4,
            data_nonzero_gas: 16,
            sys_action_gas: 100_000,
            code_ttl_block_gas: 2,
            kv_ttl_block_gas: 1,
            kv_overwrite_refund: 4_800,
            refund_quotient: 5,
        }
    }
}

/// Computes the gas a message costs before any kind-specific work runs.
pub fn intrinsic_gas(
    schedule: &GasSchedule,
    payload: &[u8],
    is_code_deploy: bool,
) -> Result<u64, GasError> {
    let base = if is_code_deploy {
        schedule.tx_gas_code_deploy
    } else {
        schedule.tx_gas
    };

    let nonzero = payload.iter().filter(|b| **b != 0).count() as u64;
    let zero = payload.len() as u64 - nonzero;

    let nonzero_gas = nonzero
        .checked_mul(schedule.data_nonzero_gas)
        .ok_or(GasError::Overflow)?;
    let zero_gas = zero
        .checked_mul(schedule.data_zero_gas)
        .ok_or(GasError::Overflow)?;

    base.checked_add(nonzero_gas)
        .and_then(|g| g.checked_add(zero_gas))
        .ok_or(GasError::Overflow)
}

/// Retention gas for keeping an entry alive for `ttl` blocks.
pub fn ttl_gas(ttl: u64, per_block: u64) -> Result<u64, GasError> {
    if ttl == 0 {
        return Err(GasError::ZeroTtl);
    }
    ttl.checked_mul(per_block).ok_or(GasError::Overflow)
}

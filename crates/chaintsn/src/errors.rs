use parexec_chain_types::PayloadError;
use parexec_params::GasError;
use parexec_primitives::prelude::*;
use thiserror::Error;

/// Reasons a message is rejected before it executes.  A rejected message
/// consumes no gas and leaves state untouched.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TsnError {
    #[error("nonce mismatch (expected {expected}, got {got})")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("sender nonce is exhausted")]
    NonceExhausted,

    #[error("insufficient funds (have {have}, want {want})")]
    InsufficientFunds { have: U256, want: U256 },

    #[error("upfront cost overflows")]
    CostOverflow,

    #[error("intrinsic gas too low (limit {limit}, want {want})")]
    IntrinsicGasTooLow { limit: u64, want: u64 },

    #[error("intrinsic gas: {0}")]
    IntrinsicGas(#[from] GasError),
}

/// Reasons a message fails after gas was bought.  The gas charged so far
/// stays charged, but none of the kind-specific writes happen.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TxFailure {
    #[error("out of gas")]
    OutOfGas,

    #[error("gas computation overflowed")]
    GasOverflow,

    #[error("contract not supported")]
    ContractNotSupported,

    #[error("value must be zero")]
    NonZeroValue,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("code size {size} exceeds limit {max}")]
    CodeTooLarge { size: usize, max: usize },

    #[error("code already deployed at {0}")]
    CodeExists(Address),

    #[error("expiry height overflows")]
    TtlOverflow,

    #[error("unknown system action {0:?}")]
    UnknownAction(String),

    #[error("commission {0} bps above maximum")]
    CommissionTooHigh(u16),

    #[error("stake amount must be positive")]
    ZeroStake,

    #[error("no stake to withdraw")]
    NoStake,
}

impl From<GasError> for TxFailure {
    fn from(value: GasError) -> Self {
        match value {
            GasError::Overflow => Self::GasOverflow,
            GasError::ZeroTtl => Self::InvalidPayload(PayloadError::ZeroTtl),
        }
    }
}

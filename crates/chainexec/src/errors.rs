use parexec_chaintsn::GasPoolError;
use thiserror::Error;

use crate::{output::BlockExecutionOutput, verify::ParityReport};

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The block is larger than the leveling bound.  Nothing ran.
    #[error("block has {count} transactions, limit is {max}")]
    TooManyTransactions { count: usize, max: usize },

    /// The block gas pool could not admit transaction `tx_idx`.  Everything
    /// before it is applied, it and everything after it are not.
    #[error("block gas limit reached at transaction {tx_idx}")]
    GasLimitReached {
        tx_idx: usize,
        partial: Box<BlockExecutionOutput>,
    },

    /// Gas accounting disagreed with itself.  Nothing was committed.
    #[error("gas pool inconsistent: {0}")]
    GasPoolInconsistent(#[from] GasPoolError),

    /// Shadow run diverged from the serial run.  Nothing was committed.
    #[error("parallel execution diverged from serial: {0}")]
    ShadowMismatch(Box<ParityReport>),

    /// A worker never reported back, most likely it panicked.  Nothing was
    /// committed.
    #[error("level {level} returned {received} of {expected} results")]
    WorkerFailed {
        level: usize,
        expected: usize,
        received: usize,
    },
}

impl ExecError {
    /// Returns if this error left no trace in state.  Everything except
    /// [`ExecError::GasLimitReached`] does.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::GasLimitReached { .. })
    }
}

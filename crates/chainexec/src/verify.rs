//! Comparison of the leveled path against the serial one.

use std::fmt;

use parexec_chain_types::{BlockContext, Message};
use parexec_chaintsn::GasPool;
use parexec_params::ChainConfig;
use parexec_primitives::prelude::*;
use parexec_state::CanonicalState;

use crate::{
    errors::ExecResult,
    executor::BlockExecutor,
    output::{BlockRun, ExecPath},
    serial::run_serial,
};

/// Where a serial and a leveled run of the same block agree and where they
/// do not.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParityReport {
    pub serial_root: B256,
    pub parallel_root: B256,
    pub serial_gas_used: u64,
    pub parallel_gas_used: u64,
    pub serial_halted_at: Option<usize>,
    pub parallel_halted_at: Option<usize>,

    /// Receipt positions that differ, including ones only one side has.
    pub receipt_mismatches: Vec<usize>,

    pub logs_match: bool,

    /// Number of levels the leveled run used.
    pub levels: usize,
}

impl ParityReport {
    pub(crate) fn compare(serial: &BlockRun, parallel: &BlockRun) -> Self {
        let (s, p) = (&serial.output, &parallel.output);
        let n = s.receipts().len().max(p.receipts().len());
        let receipt_mismatches = (0..n)
            .filter(|&i| s.receipts().get(i) != p.receipts().get(i))
            .collect();
        let levels = match p.path() {
            ExecPath::Parallel { levels } => levels,
            ExecPath::Serial => p.receipts().len(),
        };

        Self {
            serial_root: *s.state_root(),
            parallel_root: *p.state_root(),
            serial_gas_used: s.gas_used(),
            parallel_gas_used: p.gas_used(),
            serial_halted_at: serial.halted_at,
            parallel_halted_at: parallel.halted_at,
            receipt_mismatches,
            logs_match: s.logs() == p.logs(),
            levels,
        }
    }

    pub fn is_match(&self) -> bool {
        self.serial_root == self.parallel_root
            && self.serial_gas_used == self.parallel_gas_used
            && self.serial_halted_at == self.parallel_halted_at
            && self.receipt_mismatches.is_empty()
            && self.logs_match
    }
}

impl fmt::Display for ParityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return write!(
                f,
                "match (root {}, gas {}, {} levels)",
                self.serial_root, self.serial_gas_used, self.levels
            );
        }
        write!(
            f,
            "mismatch (roots {} vs {}, gas {} vs {}, halted {:?} vs {:?}, {} receipts differ, logs match: {})",
            self.serial_root,
            self.parallel_root,
            self.serial_gas_used,
            self.parallel_gas_used,
            self.serial_halted_at,
            self.parallel_halted_at,
            self.receipt_mismatches.len(),
            self.logs_match,
        )
    }
}

/// Runs `txs` on top of `state` both serially and through the leveled path,
/// on separate copies, and reports how the results compare.  Always takes
/// the leveled path, however small the block.  `state` is not modified.
pub fn check_parity<S: CanonicalState>(
    executor: &BlockExecutor,
    chain: &ChainConfig,
    ctx: &BlockContext,
    state: &S,
    txs: &[Message],
    gas_limit: u64,
) -> ExecResult<ParityReport> {
    let mut serial_state = state.clone();
    let serial = run_serial(chain, ctx, &mut serial_state, txs, &GasPool::new(gas_limit))?;

    let mut parallel_state = state.clone();
    let parallel = executor.run_parallel(
        chain,
        ctx,
        &mut parallel_state,
        txs,
        &GasPool::new(gas_limit),
    )?;

    Ok(ParityReport::compare(&serial, &parallel))
}

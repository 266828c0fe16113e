//! Execution outputs.

use parexec_chain_types::{Log, LogEntry, Receipt, ReceiptStatus};
use parexec_primitives::prelude::*;

use crate::errors::{ExecError, ExecResult};

/// Which path produced an output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExecPath {
    Serial,
    Parallel { levels: usize },
}

/// Describes the output of executing a block.
#[derive(Debug, Clone)]
pub struct BlockExecutionOutput {
    /// State root after the last applied transaction.
    state_root: B256,

    /// One per applied transaction, in block order.
    receipts: Vec<Receipt>,

    /// Every log of the block, in block order.
    logs: Vec<Log>,

    gas_used: u64,

    path: ExecPath,
}

impl BlockExecutionOutput {
    pub fn state_root(&self) -> &B256 {
        &self.state_root
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn path(&self) -> ExecPath {
        self.path
    }
}

/// Assembles receipts in block order while transactions are settled.
#[derive(Debug, Default)]
pub(crate) struct ReceiptBuilder {
    receipts: Vec<Receipt>,
    logs: Vec<Log>,
    cumulative: u64,
}

impl ReceiptBuilder {
    pub(crate) fn push(
        &mut self,
        tx_index: usize,
        status: ReceiptStatus,
        gas_used: u64,
        entries: Vec<LogEntry>,
    ) {
        self.cumulative += gas_used;
        let first = self.logs.len();
        let logs: Vec<Log> = entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| Log::new(e, tx_index, first + i))
            .collect();
        self.logs.extend(logs.iter().cloned());
        self.receipts.push(Receipt::new(
            status,
            gas_used,
            self.cumulative,
            logs,
            tx_index,
        ));
    }

    pub(crate) fn finish(self, state_root: B256, path: ExecPath) -> BlockExecutionOutput {
        BlockExecutionOutput {
            state_root,
            receipts: self.receipts,
            logs: self.logs,
            gas_used: self.cumulative,
            path,
        }
    }
}

/// Output of one run plus where it stopped, if it did.
#[derive(Debug, Clone)]
pub(crate) struct BlockRun {
    pub(crate) output: BlockExecutionOutput,
    pub(crate) halted_at: Option<usize>,
}

impl BlockRun {
    pub(crate) fn into_result(self) -> ExecResult<BlockExecutionOutput> {
        match self.halted_at {
            None => Ok(self.output),
            Some(tx_idx) => Err(ExecError::GasLimitReached {
                tx_idx,
                partial: Box::new(self.output),
            }),
        }
    }
}

//! Benchmarks for the block executor.
//!
//! This crate holds the workloads shared by the benchmark targets.

#[allow(
    unused_imports,
    clippy::allow_attributes,
    reason = "used for benchmarking"
)]
use criterion as _;
#[allow(
    unused_imports,
    clippy::allow_attributes,
    reason = "used for benchmarking"
)]
use parexec_chaintsn as _;
#[allow(
    unused_imports,
    clippy::allow_attributes,
    reason = "used for benchmarking"
)]
use parexec_params as _;

use parexec_chainexec::BlockExecutor;
use parexec_config::{ExecMode, ExecutorConfig};
use parexec_test_utils::{BlockSpec, TxMix};

/// Shapes of block the benchmarks run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Workload {
    /// Transfers between many accounts, few conflicts.
    Disjoint,
    /// All four kinds with a moderate share of hot senders.
    Mixed,
    /// Most senders drawn from two accounts.
    Contended,
}

impl Workload {
    pub const ALL: [Workload; 3] = [Workload::Disjoint, Workload::Mixed, Workload::Contended];

    pub fn name(&self) -> &'static str {
        match self {
            Workload::Disjoint => "disjoint",
            Workload::Mixed => "mixed",
            Workload::Contended => "contended",
        }
    }

    pub fn spec(&self, txs: usize) -> BlockSpec {
        let base = BlockSpec {
            txs,
            invalid_rate: 0.0,
            ..BlockSpec::default()
        };
        match self {
            Workload::Disjoint => BlockSpec {
                accounts: txs.max(2) * 2,
                mix: TxMix::transfers_only(),
                hot_rate: 0.0,
                ..base
            },
            Workload::Mixed => BlockSpec {
                accounts: txs.max(2),
                ..base
            },
            Workload::Contended => BlockSpec {
                accounts: txs.max(2),
                hot_rate: 0.9,
                ..base
            },
        }
    }
}

/// Executor for `mode` that never routes a block to the serial path on size
/// alone.
pub fn bench_executor(mode: ExecMode) -> BlockExecutor {
    BlockExecutor::new(&ExecutorConfig {
        mode,
        serial_threshold: 0,
        ..ExecutorConfig::default()
    })
}

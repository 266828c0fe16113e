//! Block executor dispatching between the serial and leveled paths.

use std::{
    collections::BTreeMap,
    sync::{Arc, mpsc},
    thread,
};

use parexec_chain_types::{BlockContext, Message};
use parexec_chaintsn::{GasPool, TsnError, TxOutcome, apply_message};
use parexec_config::{ExecMode, ExecutorConfig};
use parexec_params::ChainConfig;
use parexec_state::{CanonicalState, StateReader};
use threadpool::ThreadPool;
use tracing::*;

use crate::{
    access::{AccessSet, analyze_tx},
    errors::{ExecError, ExecResult},
    instrumentation::components,
    levels::{build_levels, serial_levels},
    output::{BlockExecutionOutput, BlockRun, ExecPath, ReceiptBuilder},
    phase::{BlockPhase, PhaseTracker},
    serial::{commit, run_serial, settle},
    verify::ParityReport,
    write_buffer::{PendingWrites, WriteBuffer},
};

type TaskResult = Result<(TxOutcome, PendingWrites), TsnError>;

/// Executes blocks according to an [`ExecutorConfig`], owning the worker pool
/// the leveled path runs on.
#[derive(Debug)]
pub struct BlockExecutor {
    mode: ExecMode,
    serial_threshold: usize,
    max_txs_per_block: usize,
    pool: ThreadPool,
}

impl BlockExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        let threads = match config.worker_threads {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        Self {
            mode: config.mode,
            serial_threshold: config.serial_threshold,
            max_txs_per_block: config.max_txs_per_block,
            pool: ThreadPool::with_name("parexec-worker".to_owned(), threads),
        }
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.max_count()
    }

    /// Executes `txs` on top of `state`, charging `gas_pool`.
    ///
    /// On success, and on [`ExecError::GasLimitReached`], the applied
    /// transactions are committed to `state` and their gas is taken from
    /// `gas_pool`.  On any other error neither is touched.
    #[instrument(
        skip_all,
        fields(
            component = components::EXEC_BLOCK,
            number = ctx.number(),
            txs = txs.len(),
        )
    )]
    pub fn execute_block<S>(
        &self,
        chain: &ChainConfig,
        ctx: &BlockContext,
        state: &mut S,
        txs: &[Message],
        gas_pool: &GasPool,
    ) -> ExecResult<BlockExecutionOutput>
    where
        S: CanonicalState,
    {
        if txs.len() > self.max_txs_per_block {
            return Err(ExecError::TooManyTransactions {
                count: txs.len(),
                max: self.max_txs_per_block,
            });
        }

        match self.mode {
            ExecMode::Serial => commit(state, gas_pool, |working, pool| {
                run_serial(chain, ctx, working, txs, pool)
            }),
            ExecMode::Parallel => commit(state, gas_pool, |working, pool| {
                if txs.len() < self.serial_threshold {
                    debug!(threshold = self.serial_threshold, "small block, running serially");
                    run_serial(chain, ctx, working, txs, pool)
                } else {
                    self.run_parallel(chain, ctx, working, txs, pool)
                }
            }),
            ExecMode::Shadow => self.execute_shadow(chain, ctx, state, txs, gas_pool),
        }
    }

    #[instrument(
        skip_all,
        fields(
            component = components::EXEC_SHADOW,
            number = ctx.number(),
            txs = txs.len(),
        )
    )]
    fn execute_shadow<S: CanonicalState>(
        &self,
        chain: &ChainConfig,
        ctx: &BlockContext,
        state: &mut S,
        txs: &[Message],
        gas_pool: &GasPool,
    ) -> ExecResult<BlockExecutionOutput> {
        let mut parallel_state = state.clone();
        let parallel_pool = GasPool::new(gas_pool.remaining());
        let parallel = self.run_parallel(chain, ctx, &mut parallel_state, txs, &parallel_pool)?;
        drop(parallel_state);

        let mut serial_state = state.clone();
        let serial_pool = GasPool::new(gas_pool.remaining());
        let serial = run_serial(chain, ctx, &mut serial_state, txs, &serial_pool)?;

        let report = ParityReport::compare(&serial, &parallel);
        if !report.is_match() {
            error!(%report, "shadow execution diverged, nothing committed");
            return Err(ExecError::ShadowMismatch(Box::new(report)));
        }

        gas_pool.try_sub_gas(serial_pool.used())?;
        *state = serial_state;
        serial.into_result()
    }

    /// Runs the leveled path on `working`, regardless of block size.
    pub(crate) fn run_parallel<S: CanonicalState>(
        &self,
        chain: &ChainConfig,
        ctx: &BlockContext,
        working: &mut S,
        txs: &[Message],
        pool: &GasPool,
    ) -> ExecResult<BlockRun> {
        let mut tracker = PhaseTracker::new();

        let levels = if txs.iter().any(|m| m.sender() == ctx.coinbase()) {
            warn!(
                coinbase = %ctx.coinbase(),
                "coinbase sends in this block, executing one tx per level"
            );
            serial_levels(txs.len())
        } else {
            let sets: Vec<AccessSet> = txs
                .iter()
                .map(|m| analyze_tx(m, ctx.number()))
                .collect();
            build_levels(&sets)
        };
        tracker.advance(BlockPhase::Leveled {
            levels: levels.len(),
        });
        debug!(levels = levels.len(), "built levels");

        let shared_txs: Arc<[Message]> = Arc::from(txs);
        let shared_chain = Arc::new(chain.clone());
        let mut receipts = ReceiptBuilder::default();
        let mut halted_at = None;

        'levels: for (level_idx, level) in levels.iter().enumerate() {
            if level.is_empty() {
                continue;
            }

            tracker.advance(BlockPhase::Executing(level_idx));
            let mut results = self.execute_level(
                level_idx,
                level,
                working.snapshot(),
                &shared_txs,
                &shared_chain,
                ctx,
            )?;

            tracker.advance(BlockPhase::Merging(level_idx));
            for &idx in level {
                let msg = &txs[idx];
                if !pool.admits(msg.gas_limit()) {
                    warn!(
                        tx_idx = idx,
                        gas_limit = msg.gas_limit(),
                        remaining = pool.remaining(),
                        "block gas limit reached"
                    );
                    tracker.advance(BlockPhase::Halted);
                    halted_at = Some(idx);
                    break 'levels;
                }

                let res = results
                    .remove(&idx)
                    .ok_or_else(|| ExecError::WorkerFailed {
                        level: level_idx,
                        expected: level.len(),
                        received: results.len(),
                    })?;
                let res = res.map(|(outcome, pending)| {
                    pending.merge(working, ctx.coinbase());
                    outcome
                });
                settle(working, pool, &mut receipts, idx, res)?;
            }
        }

        if halted_at.is_none() {
            tracker.advance(BlockPhase::Done);
        }

        let path = ExecPath::Parallel {
            levels: levels.len(),
        };
        Ok(BlockRun {
            output: receipts.finish(working.state_root(), path),
            halted_at,
        })
    }

    /// Runs every transaction of a level on its own overlay and waits for all
    /// of them.
    #[instrument(
        skip_all,
        fields(component = components::EXEC_LEVEL, level = level_idx, txs = level.len())
    )]
    fn execute_level<Snap>(
        &self,
        level_idx: usize,
        level: &[usize],
        snapshot: Snap,
        txs: &Arc<[Message]>,
        chain: &Arc<ChainConfig>,
        ctx: &BlockContext,
    ) -> ExecResult<BTreeMap<usize, TaskResult>>
    where
        Snap: StateReader + Clone + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel::<(usize, TaskResult)>();
        for &idx in level {
            let snapshot = snapshot.clone();
            let txs = txs.clone();
            let chain = chain.clone();
            let ctx = *ctx;
            let tx = tx.clone();
            self.pool.execute(move || {
                let mut buf = WriteBuffer::new(snapshot);
                let res = apply_message(&mut buf, &txs[idx], &ctx, &chain);
                let res = res.map(|outcome| (outcome, buf.detach()));
                if tx.send((idx, res)).is_err() {
                    trace!(tx_idx = idx, "level receiver gone, dropping result");
                }
            });
        }
        drop(tx);
        drop(snapshot);

        let results: BTreeMap<usize, TaskResult> = rx.iter().collect();
        if results.len() != level.len() {
            error!(expected = level.len(), received = results.len(), "worker failed");
            return Err(ExecError::WorkerFailed {
                level: level_idx,
                expected: level.len(),
                received: results.len(),
            });
        }
        Ok(results)
    }
}

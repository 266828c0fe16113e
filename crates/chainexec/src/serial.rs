//! Reference executor applying one transaction at a time.

use parexec_chain_types::{BlockContext, Message, ReceiptStatus};
use parexec_chaintsn::{GasPool, TsnError, TxOutcome, apply_message};
use parexec_params::ChainConfig;
use parexec_state::CanonicalState;
use tracing::*;

use crate::{
    errors::ExecResult,
    instrumentation::components,
    output::{BlockExecutionOutput, BlockRun, ExecPath, ReceiptBuilder},
    phase::{BlockPhase, PhaseTracker},
};

/// Executes `txs` in order, directly against `state`.
///
/// On a fatal error `state` and `gas_pool` are left as they were.  On gas
/// exhaustion the prefix is kept, matching
/// [`BlockExecutor::execute_block`](crate::BlockExecutor::execute_block).
#[instrument(
    skip_all,
    fields(
        component = components::EXEC_SERIAL,
        number = ctx.number(),
        txs = txs.len(),
    )
)]
pub fn execute_serial<S: CanonicalState>(
    chain: &ChainConfig,
    ctx: &BlockContext,
    state: &mut S,
    txs: &[Message],
    gas_pool: &GasPool,
) -> ExecResult<BlockExecutionOutput> {
    commit(state, gas_pool, |working, pool| {
        run_serial(chain, ctx, working, txs, pool)
    })
}

pub(crate) fn run_serial<S: CanonicalState>(
    chain: &ChainConfig,
    ctx: &BlockContext,
    state: &mut S,
    txs: &[Message],
    pool: &GasPool,
) -> ExecResult<BlockRun> {
    let mut tracker = PhaseTracker::new();
    tracker.advance(BlockPhase::Leveled { levels: txs.len() });

    let mut receipts = ReceiptBuilder::default();
    let mut halted_at = None;

    for (idx, msg) in txs.iter().enumerate() {
        tracker.advance(BlockPhase::Executing(idx));
        if !pool.admits(msg.gas_limit()) {
            warn!(
                tx_idx = idx,
                gas_limit = msg.gas_limit(),
                remaining = pool.remaining(),
                "block gas limit reached"
            );
            tracker.advance(BlockPhase::Halted);
            halted_at = Some(idx);
            break;
        }

        let res = apply_message(state, msg, ctx, chain);
        tracker.advance(BlockPhase::Merging(idx));
        settle(state, pool, &mut receipts, idx, res)?;
    }

    if halted_at.is_none() {
        tracker.advance(BlockPhase::Done);
    }

    Ok(BlockRun {
        output: receipts.finish(state.state_root(), ExecPath::Serial),
        halted_at,
    })
}

/// Takes the gas of an applied (or rejected) message from the pool, closes
/// the transaction and records its receipt.
pub(crate) fn settle<S: CanonicalState>(
    state: &mut S,
    pool: &GasPool,
    receipts: &mut ReceiptBuilder,
    tx_idx: usize,
    res: Result<TxOutcome, TsnError>,
) -> ExecResult<()> {
    let (status, gas_used) = match res {
        Ok(outcome) if outcome.is_success() => (ReceiptStatus::Success, outcome.gas_used()),
        Ok(outcome) => (ReceiptStatus::Failed, outcome.gas_used()),
        Err(e) => {
            debug!(%tx_idx, err = %e, "message rejected");
            (ReceiptStatus::Failed, 0)
        }
    };

    pool.try_sub_gas(gas_used)?;
    state.finalize_tx();
    receipts.push(tx_idx, status, gas_used, state.take_logs());
    trace!(%tx_idx, %gas_used, ?status, "settled transaction");
    Ok(())
}

/// Runs `f` against scratch copies of `state` and the gas pool, and makes
/// them canonical unless `f` fails hard.
pub(crate) fn commit<S, F>(
    state: &mut S,
    gas_pool: &GasPool,
    f: F,
) -> ExecResult<BlockExecutionOutput>
where
    S: CanonicalState,
    F: FnOnce(&mut S, &GasPool) -> ExecResult<BlockRun>,
{
    let mut working = state.clone();
    let pool = GasPool::new(gas_pool.remaining());
    let run = f(&mut working, &pool)?;
    gas_pool.try_sub_gas(pool.used())?;
    *state = working;
    run.into_result()
}

//! Drives the block executor over generated blocks.
//!
//! Useful for eyeballing the speedup of the leveled path and for soaking it
//! against the serial one with `--verify`.

mod args;

use std::{
    process,
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use args::Args;
use parexec_chainexec::{BlockExecutor, ExecError, ExecPath, check_parity};
use parexec_chaintsn::GasPool;
use parexec_common::logging::{self, LoggerConfig};
use parexec_config::Config;
use parexec_state::CanonicalState;
use parexec_test_utils::{BlockGenerator, BlockSpec, genesis_state, test_ctx};
use tracing::*;

fn main() {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("ERROR\n{e:?}");
        process::exit(1);
    }
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(mode) = args.mode {
        config.executor.mode = mode;
    }

    logging::init(LoggerConfig::from_config(
        "parexec-bench".to_owned(),
        &config.logging,
    ))
    .context("failed to initialize logging")?;

    let executor = BlockExecutor::new(&config.executor);
    info!(
        mode = ?executor.mode(),
        workers = executor.worker_threads(),
        seed = args.seed,
        "starting benchmark"
    );

    let spec = BlockSpec {
        txs: args.txs,
        accounts: args.accounts,
        hot_rate: args.hot_rate,
        ..BlockSpec::default()
    };
    let mut state = genesis_state(spec.accounts);
    let mut generator = BlockGenerator::new(args.seed, spec.accounts);
    let mut total = Duration::ZERO;
    let mut total_gas = 0u64;

    for number in 1..=args.blocks {
        let txs = generator.generate(&spec);
        let ctx = test_ctx(number);

        if args.verify {
            let report = check_parity(
                &executor,
                &config.chain,
                &ctx,
                &state,
                &txs,
                args.gas_limit,
            )?;
            if !report.is_match() {
                bail!("block {number} diverged: {report}");
            }
            debug!(%number, %report, "parity ok");
        }

        let pool = GasPool::new(args.gas_limit);
        let started = Instant::now();
        let res = executor.execute_block(&config.chain, &ctx, &mut state, &txs, &pool);
        let elapsed = started.elapsed();
        total += elapsed;
        total_gas += pool.used();

        let out = match res {
            Ok(out) => out,
            Err(ExecError::GasLimitReached { tx_idx, partial }) => {
                warn!(%number, %tx_idx, "block ran out of gas, prefix kept");
                *partial
            }
            Err(e) => return Err(e).with_context(|| format!("block {number} failed")),
        };

        let levels = match out.path() {
            ExecPath::Serial => None,
            ExecPath::Parallel { levels } => Some(levels),
        };
        let failed = out.receipts().iter().filter(|r| !r.is_success()).count();
        info!(
            %number,
            txs = txs.len(),
            failed,
            gas_used = out.gas_used(),
            ?levels,
            elapsed_us = elapsed.as_micros() as u64,
            root = %out.state_root(),
            "executed block"
        );
    }

    let secs = total.as_secs_f64();
    let gas_per_sec = if secs > 0.0 { total_gas as f64 / secs } else { 0.0 };
    info!(
        blocks = args.blocks,
        total_ms = total.as_millis() as u64,
        total_gas,
        gas_per_sec = gas_per_sec as u64,
        root = %state.state_root(),
        "done"
    );
    Ok(())
}

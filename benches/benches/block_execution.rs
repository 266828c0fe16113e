//! Benchmarks for [`BlockExecutor::execute_block`] across execution modes and
//! block shapes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use parexec_benchmarks::{Workload, bench_executor};
use parexec_chainexec::BlockExecutor;
use parexec_chaintsn::GasPool;
use parexec_config::ExecMode;
use parexec_params::ChainConfig;
use parexec_test_utils::{generate_block, test_ctx};

/// Transaction counts to test across benchmarks.
const TX_COUNTS: &[usize] = &[16, 64, 256, 1_000];

const BLOCK_GAS: u64 = 1_000_000_000;

fn bench_mode(c: &mut Criterion, executor: &BlockExecutor, mode_name: &str) {
    let chain = ChainConfig::default();
    let ctx = test_ctx(1);

    for workload in Workload::ALL {
        let mut group = c.benchmark_group(format!("execute_block_{}_{mode_name}", workload.name()));

        for &tx_count in TX_COUNTS {
            group.throughput(Throughput::Elements(tx_count as u64));
            let (state, txs) = generate_block(tx_count as u64, &workload.spec(tx_count));

            group.bench_with_input(
                BenchmarkId::new("tx_count", tx_count),
                &tx_count,
                |b, _| {
                    b.iter_with_setup(
                        || state.clone(),
                        |mut state| {
                            let pool = GasPool::new(BLOCK_GAS);
                            let res = executor.execute_block(&chain, &ctx, &mut state, &txs, &pool);
                            black_box(res.map(|out| out.gas_used()).ok())
                        },
                    );
                },
            );
        }

        group.finish();
    }
}

fn bench_serial(c: &mut Criterion) {
    bench_mode(c, &bench_executor(ExecMode::Serial), "serial");
}

fn bench_parallel(c: &mut Criterion) {
    bench_mode(c, &bench_executor(ExecMode::Parallel), "parallel");
}

criterion_group!(benches, bench_serial, bench_parallel);
criterion_main!(benches);

//! Run loop benchmarks
//!
//! Measures per-case dispatch overhead (spawn, span, metrics) and report
//! serialization with no-op cases and in-memory invokers.

use std::sync::Arc;

use cctest_core::{
    BoxFuture, CaseDescriptor, CaseError, CctestConfig, ChainError, ChainInvoker, ChainKind,
    Framework, FrameworkBuilder, RunRequest, TestCase,
};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

struct NullInvoker(ChainKind);

impl ChainInvoker for NullInvoker {
    fn chain(&self) -> ChainKind {
        self.0
    }

    fn endpoint(&self) -> &str {
        "bench://null"
    }

    fn account(&self) -> Option<&str> {
        None
    }

    fn current_height(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async { Ok(1) })
    }

    fn call<'a>(
        &'a self,
        _method: &'a str,
        _params: serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, ChainError>> {
        Box::pin(async { Ok(serde_json::Value::Null) })
    }
}

struct Noop;

impl TestCase for Noop {
    async fn execute(&self, ctx: &Framework) -> Result<(), CaseError> {
        ctx.relay().current_height().await?;
        Ok(())
    }
}

fn framework(cases: usize) -> Arc<Framework> {
    let mut builder = FrameworkBuilder::new(Arc::new(CctestConfig::default()));
    for chain in ChainKind::ALL {
        builder
            .set_handle(chain, Arc::new(NullInvoker(chain)))
            .unwrap();
    }
    for i in 0..cases {
        builder
            .register(CaseDescriptor::new(format!("case_{i}"), "no-op", Noop))
            .unwrap();
    }
    Arc::new(builder.build().unwrap())
}

fn bench_run_loop(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("run_loop");
    for cases in [1usize, 10, 50] {
        let fw = framework(cases);
        let request = RunRequest::all();
        group.throughput(Throughput::Elements(cases as u64));
        group.bench_function(format!("all_cases_{cases}"), |b| {
            b.iter(|| rt.block_on(fw.run(black_box(&request))))
        });
    }

    let fw = framework(10);
    let missing = RunRequest::new(vec!["missing".to_owned(); 10], 1);
    group.throughput(Throughput::Elements(10));
    group.bench_function("not_found_10", |b| {
        b.iter(|| rt.block_on(fw.run(black_box(&missing))))
    });

    group.finish();
}

fn bench_report_serialization(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let fw = framework(50);
    let report = rt.block_on(fw.run(&RunRequest::new(Vec::new(), 4)));

    let mut group = c.benchmark_group("run_report");
    group.throughput(Throughput::Elements(report.records.len() as u64));
    group.bench_function("report_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&report)).unwrap())
    });
    group.finish();
}

fn bench_case_list_parsing(c: &mut Criterion) {
    let list = (0..50)
        .map(|i| format!("case_{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    c.bench_function("parse_case_list_50", |b| {
        b.iter(|| RunRequest::parse_case_list(black_box(&list)))
    });
}

criterion_group!(
    benches,
    bench_run_loop,
    bench_report_serialization,
    bench_case_list_parsing
);
criterion_main!(benches);

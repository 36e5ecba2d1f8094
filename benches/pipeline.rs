//! Benchmarks for the transpile pipeline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use jsx_sandbox::imports::{extract, import_pattern};
use jsx_sandbox::pipeline::Pipeline;
use jsx_sandbox::transpiler::BuiltinTransform;

fn bench_pipeline_small(c: &mut Criterion) {
    let code = "import x from 'y'\nconst a = <div className=\"a\">{x}</div>;";
    let pipeline = Pipeline::new(BuiltinTransform);
    c.bench_function("pipeline_small", |b| {
        b.iter(|| pipeline.run(black_box(code)).unwrap())
    });
}

fn bench_pipeline_fixture(c: &mut Criterion) {
    let code = include_str!("../tests/fixtures/counter.jsx");
    let pipeline = Pipeline::new(BuiltinTransform);
    c.bench_function("pipeline_fixture", |b| {
        b.iter(|| pipeline.run(black_box(code)).unwrap())
    });
}

fn bench_import_extraction(c: &mut Criterion) {
    let code = include_str!("../tests/fixtures/counter.jsx").repeat(50);
    c.bench_function("import_extraction", |b| {
        b.iter(|| extract(black_box(&code), import_pattern()))
    });
}

criterion_group!(
    benches,
    bench_pipeline_small,
    bench_pipeline_fixture,
    bench_import_extraction
);
criterion_main!(benches);

use boolsearch_core::merge::{and_merge, and_merge_fast};
use boolsearch_core::tokenizer::tokenize;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_intersection(c: &mut Criterion) {
    let dense: Vec<u32> = (1..=100_000).collect();
    let sparse: Vec<u32> = (1..=100_000).step_by(997).collect();
    c.bench_function("and_merge_dense_sparse", |b| b.iter(|| and_merge(black_box(&dense), black_box(&sparse))));
    c.bench_function("and_merge_fast_dense_sparse", |b| {
        b.iter(|| and_merge_fast(black_box(&dense), black_box(&sparse)))
    });
}

fn bench_tokenize(c: &mut Criterion) {
    let text = "The Library of Congress classification scheme, information retrieval systems. ".repeat(200);
    c.bench_function("tokenize_abstract", |b| b.iter(|| tokenize(black_box(&text))));
}

criterion_group!(benches, bench_intersection, bench_tokenize);
criterion_main!(benches);

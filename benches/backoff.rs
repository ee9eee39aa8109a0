//! 退避计算与快照渲染基准测试

use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::hint::black_box;
use std::time::Duration;
use url_poller::health::{BackoffPolicy, Snapshot};

fn backoff_benchmark(c: &mut Criterion) {
    let policy = BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(10));

    c.bench_function("backoff_delay_for", |b| {
        b.iter(|| {
            for errors in 0..64u32 {
                black_box(policy.delay_for(black_box(errors)));
            }
        });
    });
}

fn snapshot_benchmark(c: &mut Criterion) {
    let state: HashMap<String, String> = (0..200)
        .map(|i| (format!("https://service-{i}.example.com/"), "200 OK".to_string()))
        .collect();

    c.bench_function("snapshot_render_200_entries", |b| {
        b.iter(|| {
            let snapshot = Snapshot::new(black_box(&state));
            black_box(snapshot.lines())
        });
    });
}

criterion_group!(benches, backoff_benchmark, snapshot_benchmark);
criterion_main!(benches);

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wayfare_domain::policy::{refund_amount, refund_tier, split_commission};

fn benchmark_split_commission(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_commission");

    for price in [10.0, 99.99, 1_234.56, 100_000.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(price), price, |b, &price| {
            b.iter(|| split_commission(black_box(price), black_box(0.15)));
        });
    }

    group.finish();
}

fn benchmark_refund_tier(c: &mut Criterion) {
    let now = Utc::now();
    let scheduled = Some(now + Duration::hours(18));

    c.bench_function("refund_tier", |b| {
        b.iter(|| refund_tier(black_box(scheduled), black_box(now)));
    });

    c.bench_function("refund_amount", |b| {
        b.iter(|| refund_amount(black_box(100.0), black_box(0.5)));
    });
}

criterion_group!(benches, benchmark_split_commission, benchmark_refund_tier);
criterion_main!(benches);

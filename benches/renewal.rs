use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eversvoz_usage::{
    models::UsageRecord,
    services::{
        entitlement::StaticEntitlements,
        metrics::MetricsService,
        renewal::next_renewal_date,
        usage_reset::{ResetOptions, UsageResetEvaluator},
    },
    storage::memory::MemoryUsageStore,
};
use std::sync::Arc;
use uuid::Uuid;

fn bench_next_renewal_date(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_renewal_date");

    let anchor = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
    let gaps = vec![0u32, 3, 24, 120];

    for months in gaps {
        let now = anchor + chrono::Months::new(months) + chrono::Duration::days(1);
        group.bench_with_input(BenchmarkId::new("elapsed_months", months), &now, |b, now| {
            b.iter(|| next_renewal_date(black_box(anchor), black_box(*now)))
        });
    }

    group.finish();
}

fn bench_evaluate_before_request(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");

    let store = MemoryUsageStore::new();
    let user_id = Uuid::new_v4();
    let created = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    runtime.block_on(store.insert(UsageRecord {
        reset_monthly_requests_date: Some(created),
        ..UsageRecord::new(user_id, created)
    }));

    let evaluator = UsageResetEvaluator::new(
        Arc::new(store),
        Arc::new(StaticEntitlements::new()),
        Arc::new(MetricsService::new()),
    );
    let now = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();

    c.bench_function("evaluate_before_request", |b| {
        b.iter(|| {
            runtime
                .block_on(evaluator.evaluate_at(
                    black_box(user_id),
                    ResetOptions::before_request(),
                    black_box(now),
                ))
                .expect("evaluation failed")
        })
    });
}

criterion_group!(benches, bench_next_renewal_date, bench_evaluate_before_request);
criterion_main!(benches);

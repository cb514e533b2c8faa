//! Criterion benchmarks for StatsAggregator and entry decoding

use chrono::{Days, NaiveDate, NaiveDateTime};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use milktrack::services::StatsAggregator;
use milktrack::types::{MilkEntry, WindowDays};
use std::hint::black_box;

const MILK_TYPES: [&str; 4] = ["Cow", "Buffalo", "Goat", "A2 Cow"];

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 30)
        .and_then(|d| d.and_hms_opt(18, 0, 0))
        .unwrap_or_default()
}

/// Entries spread over the last 90 days, a few without a date
fn make_entries(count: usize) -> Vec<MilkEntry> {
    let today = now();
    (0..count)
        .map(|i| {
            let quantity = 1.0 + (i % 17) as f64 * 0.5;
            let rate = 40.0 + (i % 7) as f64;
            MilkEntry {
                id: Some(i as i64),
                milk_type: MILK_TYPES[i % MILK_TYPES.len()].to_string(),
                quantity,
                rate,
                amount: quantity * rate,
                entry_date: if i % 50 == 49 {
                    None
                } else {
                    today.checked_sub_days(Days::new((i % 90) as u64))
                },
                user_id: Some((i % 25) as i64),
                ..Default::default()
            }
        })
        .collect()
}

/// Wire JSON for `count` entries, mixing numeric strings into the payload
fn make_payload(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"id":{i},"milkType":"{}","quantity":"{}","rate":45.5,"amount":{},"entryDate":"2025-06-{:02}T07:30:00","user":{{"id":{},"username":"farmer{}"}}}}"#,
                MILK_TYPES[i % MILK_TYPES.len()],
                1 + i % 9,
                (1 + i % 9) as f64 * 45.5,
                1 + i % 28,
                i % 25,
                i % 25,
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator");

    for size in [100usize, 1_000, 10_000, 100_000] {
        let entries = make_entries(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("compute_7d", size), &entries, |b, entries| {
            b.iter(|| StatsAggregator::compute(black_box(entries), WindowDays::Seven, now()));
        });

        group.bench_with_input(BenchmarkId::new("compute_30d", size), &entries, |b, entries| {
            b.iter(|| StatsAggregator::compute(black_box(entries), WindowDays::Thirty, now()));
        });

        group.bench_with_input(BenchmarkId::new("daily_all", size), &entries, |b, entries| {
            b.iter(|| StatsAggregator::daily_all(black_box(entries)));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let payload = make_payload(5_000);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("milk_entries_5000", |b| {
        b.iter(|| {
            let _: Result<Vec<MilkEntry>, _> = serde_json::from_str(black_box(&payload));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_compute, bench_decode);
criterion_main!(benches);

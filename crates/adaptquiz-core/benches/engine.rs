use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptquiz_core::difficulty::{DifficultyAdjuster, DifficultyThresholds};
use adaptquiz_core::model::DifficultyLevel;
use adaptquiz_core::statistics::accuracy_percent;
use adaptquiz_core::tracker::PerformanceTracker;
use adaptquiz_core::trend;

fn tracker_with(n: usize) -> PerformanceTracker {
    let mut tracker = PerformanceTracker::new();
    for i in 0..n {
        tracker.record_answer(i % 3 != 0, 1_000 + i as u64);
    }
    tracker
}

fn bench_difficulty(c: &mut Criterion) {
    let mut group = c.benchmark_group("difficulty");

    group.bench_function("50 answers", |b| {
        b.iter(|| {
            let mut tracker = PerformanceTracker::new();
            let mut adjuster =
                DifficultyAdjuster::new(DifficultyLevel::Beginner, DifficultyThresholds::default());
            for i in 0..50 {
                tracker.record_answer(black_box(i % 4 != 0), 1_000);
                adjuster.on_answer(tracker.records());
            }
            adjuster.current()
        })
    });

    group.finish();
}

fn bench_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend");

    for n in [10, 100, 1_000] {
        let tracker = tracker_with(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| trend::analyze(black_box(tracker.records())))
        });
    }

    let tracker = tracker_with(1_000);
    group.bench_function("accuracy n=1000", |b| {
        b.iter(|| accuracy_percent(black_box(tracker.records())))
    });

    group.finish();
}

criterion_group!(benches, bench_difficulty, bench_trend);
criterion_main!(benches);

//! 工序聚合基準測試

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use prodtrack_calc::{AggregationRequest, StageAggregator};
use prodtrack_core::{
    Activity, ActivityAction, ActivityKind, PackSnapshot, QuantityBreakdown, Stage,
    StageFallbacks,
};
use rust_decimal::Decimal;

fn random_breakdown(rng: &mut StdRng, len: usize) -> QuantityBreakdown {
    QuantityBreakdown::from_slots((0..len).map(|_| Decimal::from(rng.gen_range(0..200))).collect())
}

fn random_activities(rng: &mut StdRng, count: usize) -> Vec<Activity> {
    let stages = Stage::PIPELINE;

    (0..count)
        .map(|i| {
            let breakdown = random_breakdown(rng, 4);
            let total = breakdown.total();
            let stage = stages[i % stages.len()];
            let kind = if rng.gen_bool(0.1) {
                ActivityKind::Defect
            } else {
                ActivityKind::Normal
            };

            let activity =
                Activity::new("ASM-BENCH".to_string(), stage, kind, total).with_breakdown(breakdown);

            // 一成活動掛外發工序
            if rng.gen_bool(0.1) {
                let action = if rng.gen_bool(0.5) {
                    ActivityAction::SentOut
                } else {
                    ActivityAction::ReceivedIn
                };
                activity
                    .with_action(action)
                    .with_external_step("embroidery".to_string())
            } else {
                activity
            }
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_aggregation");

    for activity_count in [10usize, 100, 500] {
        let mut rng = StdRng::seed_from_u64(42);
        let ordered = random_breakdown(&mut rng, 4);
        let activities = random_activities(&mut rng, activity_count);

        group.bench_with_input(
            BenchmarkId::new("single", activity_count),
            &activities,
            |b, activities| {
                b.iter(|| {
                    StageAggregator::aggregate(
                        "ASM-BENCH",
                        &ordered,
                        &StageFallbacks::new(),
                        &PackSnapshot::default(),
                        activities,
                    )
                })
            },
        );
    }

    group.finish();
}

fn bench_aggregate_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);

    let requests: Vec<AggregationRequest> = (0..200)
        .map(|i| AggregationRequest {
            assembly_id: format!("ASM-{i:04}"),
            ordered: random_breakdown(&mut rng, 4),
            fallbacks: StageFallbacks::new(),
            pack_snapshot: PackSnapshot::default(),
            activities: random_activities(&mut rng, 50),
        })
        .collect();

    c.bench_function("stage_aggregation/batch_200", |b| {
        b.iter(|| StageAggregator::aggregate_batch(&requests))
    });
}

criterion_group!(benches, bench_aggregate, bench_aggregate_batch);
criterion_main!(benches);

//! # Scheduler Benchmark
//!
//! Queue churn at interaction rates: a drag emits a dynamic-layer request
//! per pointer move, most of which must coalesce.

#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mosaic_rendering::{FrameMetadata, Priority, RenderScheduler};
use mosaic_shared::{LayerSet, RenderLayerType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TARGET: Duration = Duration::from_millis(16);

fn random_requests(count: usize, seed: u64) -> Vec<(LayerSet, Priority)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut layers = LayerSet::EMPTY;
            for layer in RenderLayerType::ALL {
                if rng.gen_bool(0.4) {
                    layers.insert(layer);
                }
            }
            (layers, Priority::ALL[rng.gen_range(0..Priority::ALL.len())])
        })
        .collect()
}

fn bench_schedule_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_then_drain");

    for count in [16usize, 256, 4_096] {
        let requests = random_requests(count, 0x5C4E_D01E);
        group.bench_with_input(BenchmarkId::from_parameter(count), &requests, |b, requests| {
            let mut scheduler = RenderScheduler::new(TARGET);
            let mut frame = 0;
            b.iter(|| {
                for (i, &(layers, priority)) in requests.iter().enumerate() {
                    scheduler.schedule_frame(
                        layers,
                        priority,
                        Duration::from_micros(i as u64),
                        FrameMetadata::from_source("bench"),
                    );
                }
                frame += 1;
                let report = scheduler.drain(frame, |_| Duration::from_micros(500));
                scheduler.clear();
                black_box(report.rendered)
            });
        });
    }
    group.finish();
}

fn bench_drag_coalescing(c: &mut Criterion) {
    let mut scheduler = RenderScheduler::new(TARGET);
    let dynamic = LayerSet::single(RenderLayerType::Dynamic);

    c.bench_function("drag_move_coalesce_1k", |b| {
        b.iter(|| {
            for i in 0..1_000u64 {
                black_box(scheduler.schedule_frame(
                    dynamic,
                    Priority::High,
                    Duration::from_micros(i),
                    FrameMetadata::from_source("drag"),
                ));
            }
            scheduler.clear();
        });
    });
}

criterion_group!(benches, bench_schedule_and_drain, bench_drag_coalescing);
criterion_main!(benches);

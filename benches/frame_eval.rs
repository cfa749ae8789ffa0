//! Benchmarks for per-frame evaluation and CPU-side setup.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flurry::layout::GridLayout;
use flurry::prelude::*;
use std::time::Duration;

fn fall_config(count: usize) -> ConfettiConfig {
    ConfettiConfig::new()
        .with_count(count)
        .with_container(390.0, 844.0)
        .with_autoplay(false)
        .with_seed(7)
}

fn bench_fall_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("fall_frame");

    for count in [200usize, 1_000, 5_000] {
        let confetti = ConfettiController::new(fall_config(count)).unwrap();
        confetti.restart(None);
        confetti.tick(Duration::from_millis(500));
        let mut batch = FrameBatch::new();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                batch.clear();
                confetti.write_frame(&mut batch);
                black_box(batch.len())
            })
        });
    }

    group.finish();
}

fn bench_cannon_frame(c: &mut Criterion) {
    let confetti = ConfettiController::new(
        fall_config(1_000).with_cannons(vec![Vec2::new(-30.0, 844.0), Vec2::new(420.0, 844.0)]),
    )
    .unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(150));
    let mut batch = FrameBatch::new();

    c.bench_function("cannon_frame_1000", |b| {
        b.iter(|| {
            batch.clear();
            confetti.write_frame(&mut batch);
            black_box(batch.len())
        })
    });
}

fn bench_blast_frame(c: &mut Criterion) {
    let burst = BlastController::new(
        BlastConfig::new()
            .with_count(1_000)
            .with_container(390.0, 844.0)
            .with_seed(7),
    )
    .unwrap();
    burst.restart(None);
    burst.tick(Duration::from_millis(200));
    let mut batch = FrameBatch::new();

    c.bench_function("blast_frame_1000", |b| {
        b.iter(|| {
            batch.clear();
            burst.write_frame(&mut batch);
            black_box(batch.len())
        })
    });
}

fn bench_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("setup");

    group.bench_function("grid_layout_5000", |b| {
        b.iter(|| {
            let layout = GridLayout::new(
                black_box(5_000),
                Vec2::new(390.0, 844.0),
                FlakeSize::new(8.0, 16.0),
                30.0,
                false,
            );
            black_box(layout.positions())
        })
    });

    group.bench_function("restart_1000", |b| {
        let confetti = ConfettiController::new(fall_config(1_000)).unwrap();
        b.iter(|| confetti.restart(None))
    });

    group.finish();
}

fn bench_software_render(c: &mut Criterion) {
    let confetti = ConfettiController::new(fall_config(200)).unwrap();
    confetti.restart(None);
    confetti.tick(Duration::from_millis(3_000));
    let atlas = confetti.atlas();
    let mut batch = FrameBatch::new();
    confetti.write_frame(&mut batch);
    let mut renderer = SoftwareRenderer::new(390, 844);

    c.bench_function("software_render_200", |b| {
        b.iter(|| {
            renderer.clear();
            renderer.draw_batch(&atlas, &batch);
        })
    });
}

criterion_group!(
    benches,
    bench_fall_frame,
    bench_cannon_frame,
    bench_blast_frame,
    bench_setup,
    bench_software_render
);
criterion_main!(benches);

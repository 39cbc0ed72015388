//! Benchmarks for the per-frame CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mandala::prelude::*;
use mandala::{FrameParams, Scene};

fn config(n: usize) -> StaticConfig {
    StaticConfig {
        n,
        seed: 42,
        seconds: 0.0,
        ..StaticConfig::default()
    }
}

fn params() -> FrameParams {
    FrameParams {
        palette: Palette::Neon,
        background_alpha: 10,
        symmetry: 6,
        mirror: true,
        glow: true,
        trail: true,
        render_fraction: 1.0,
        show_attractors: true,
    }
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_step");

    for n in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut scene = Scene::new(&config(n)).unwrap();
            b.iter(|| scene.step(black_box(1.0 / 60.0)))
        });
    }

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_recorded");

    for n in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut scene = Scene::new(&config(n)).unwrap();
            scene.step(1.0 / 60.0);
            let mut rec = Recorder::new(800, 600);
            b.iter(|| {
                rec.clear();
                scene.draw(&mut rec, &params());
                black_box(rec.commands.len())
            })
        });
    }

    group.finish();
}

fn bench_canvas_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("canvas_frame");
    group.sample_size(20);

    for (n, ssaa) in [(1_000, 1), (1_000, 2), (10_000, 1)] {
        let id = format!("n{}_ssaa{}", n, ssaa);
        group.bench_function(id, |b| {
            let mut engine = Engine::new(StaticConfig { supersampling: ssaa, ..config(n) }).unwrap();
            let mut canvas = Canvas::new(800, 600);
            let mut clock = FrameClock::new();
            b.iter(|| black_box(engine.advance(&mut canvas, clock.record(1.0 / 60.0))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_step, bench_record, bench_canvas_frame);
criterion_main!(benches);

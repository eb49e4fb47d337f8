//! Scene benchmarks.

use common::geometry::Point;
use common::units::{Length, ReferenceAttribute};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scene::bbox::bounding_box;
use scene::props::PointProps;
use scene::{Anchor, Layer, LayerRegistry, MorphLayer, QuadraticLayer, Renderer, Scene};
use surface::Canvas2D;

/// A row of boxes, each placed after the previous one by reference.
fn chained_scene(count: usize) -> Scene {
    let layers = (0..count).map(|i| {
        let x = if i == 0 {
            Length::Number(0.0)
        } else {
            Length::reference(format!("box-{}", i - 1), ReferenceAttribute::X, 4.0)
        };
        Layer::from(
            MorphLayer::new(4.0, 4.0)
                .with_id(format!("box-{}", i))
                .with_z_index(i as i32)
                .with_position(x, "50%")
                .with_centring(Anchor::StartTop)
                .with_fill("#3366cc"),
        )
    });
    Scene::new(512, 64).try_with_layers(layers).unwrap_or_else(|_| Scene::new(512, 64))
}

/// Benchmark registry insertion and sorting.
fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for size in [10usize, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("from_vec", size), size, |b, &size| {
            b.iter(|| {
                let layers: Vec<Layer> = (0..size)
                    .map(|i| {
                        Layer::from(
                            MorphLayer::new(1.0, 1.0)
                                .with_id(format!("l{}", i))
                                .with_z_index((size - i) as i32),
                        )
                    })
                    .collect();
                black_box(LayerRegistry::from_vec(layers).map(|r| r.len()).unwrap_or(0))
            })
        });
    }

    group.finish();
}

/// Benchmark curve bounding boxes.
fn bench_bounding_box(c: &mut Criterion) {
    let points = [
        Point::new(0.0, 0.0),
        Point::new(25.0, 100.0),
        Point::new(75.0, -40.0),
        Point::new(100.0, 0.0),
    ];

    let mut group = c.benchmark_group("bounding_box");
    for samples in [25usize, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("cubic", samples), samples, |b, &samples| {
            b.iter(|| black_box(bounding_box(black_box(&points), samples).ok()))
        });
    }
    group.finish();
}

/// Benchmark full render passes.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [8usize, 64].iter() {
        let scene = chained_scene(*size);
        group.bench_with_input(BenchmarkId::new("reference_chain", size), &scene, |b, scene| {
            let mut renderer = Renderer::new();
            b.iter(|| {
                let mut canvas = Canvas2D::new(scene.width(), scene.height());
                black_box(renderer.render(scene, &mut canvas).is_ok())
            })
        });
    }

    let curves = Scene::new(256, 256)
        .try_with_layers((0..16).map(|i| {
            let offset = i as f64 * 12.0;
            Layer::from(
                QuadraticLayer::new(PointProps::new(128.0, offset), PointProps::new(240.0, 240.0 - offset))
                    .with_id(format!("curve-{}", i))
                    .with_position(16.0, offset),
            )
        }))
        .unwrap_or_else(|_| Scene::new(256, 256));
    group.bench_function("curves", |b| {
        let mut renderer = Renderer::new();
        b.iter(|| {
            let mut canvas = Canvas2D::new(256, 256);
            black_box(renderer.render(&curves, &mut canvas).is_ok())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_registry, bench_bounding_box, bench_render);
criterion_main!(benches);

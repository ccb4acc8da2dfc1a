//! Benchmarks for draw dispatch against the recording backend.
//!
//! Measures the CPU cost of deciding which backend calls a draw needs:
//! - Repeated draws with identical state (everything elided)
//! - Texture thrash (a bind per draw)
//! - Small batches through the pre-transform scratch buffer
//! - The uniform pipeline with lights

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::{Mat4, Vec2, Vec3};
use kiln_gfx::{Light, LightRegistry, PrimitiveType};
use kiln_render::{RenderStates, RenderTarget, RenderTargetDescriptor};
use kiln_test_utils::{MockBackend, MockSurface, MockTexture, fixtures};
use std::sync::Arc;

fn legacy_target() -> (Arc<MockBackend>, RenderTarget) {
    let backend = Arc::new(MockBackend::legacy());
    let target = RenderTarget::new(backend.clone(), MockSurface::new(1280, 720), RenderTargetDescriptor::default());
    (backend, target)
}

fn bench_identical_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/identical_state");

    for draws in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(draws), &draws, |b, &draws| {
            let (backend, mut target) = legacy_target();
            let texture = MockTexture::new(64, 64);
            let quad = fixtures::quad(Vec2::ZERO, Vec2::splat(32.0));
            let states = RenderStates::default().with_texture(&texture);

            b.iter(|| {
                for _ in 0..draws {
                    target.draw_vertices(black_box(&quad), PrimitiveType::Quads, &states);
                }
                backend.clear_calls();
            });
        });
    }

    group.finish();
}

fn bench_texture_thrash(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/texture_thrash");

    for textures in [2, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(textures), &textures, |b, &count| {
            let (backend, mut target) = legacy_target();
            let textures: Vec<MockTexture> = (0..count).map(|_| MockTexture::new(64, 64)).collect();
            let quad = fixtures::quad(Vec2::ZERO, Vec2::splat(32.0));

            b.iter(|| {
                for texture in &textures {
                    let states = RenderStates::default().with_texture(texture);
                    target.draw_vertices(black_box(&quad), PrimitiveType::Quads, &states);
                }
                backend.clear_calls();
            });
        });
    }

    group.finish();
}

fn bench_vertex_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/vertex_cache");

    for cached in [false, true] {
        group.bench_with_input(BenchmarkId::from_parameter(cached), &cached, |b, &cached| {
            let (backend, mut target) = legacy_target();
            let quad = fixtures::quad(Vec2::ZERO, Vec2::splat(8.0));

            b.iter(|| {
                for i in 0..100 {
                    let states = RenderStates::default()
                        .with_transform(Mat4::from_translation(Vec3::new(i as f32 * 8.0, 0.0, 0.0)))
                        .with_vertex_cache(cached);
                    target.draw_vertices(black_box(&quad), PrimitiveType::Quads, &states);
                }
                backend.clear_calls();
            });
        });
    }

    group.finish();
}

fn bench_uniform_lighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/uniform_lighting");

    for lights in [0, 1, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(lights), &lights, |b, &count| {
            let backend = Arc::new(MockBackend::new());
            let registry = Arc::new(LightRegistry::new());
            for i in 0..count {
                registry.add(Light::point(Vec3::new(i as f32, 0.0, 1.0)));
            }
            registry.set_lighting_enabled(count > 0);

            let mut target = RenderTarget::new(
                backend.clone(),
                MockSurface::new(1280, 720),
                RenderTargetDescriptor::default().with_lights(registry),
            );
            let triangle = fixtures::triangle();

            b.iter(|| {
                for _ in 0..100 {
                    target.draw_vertices(black_box(&triangle), PrimitiveType::Triangles, &RenderStates::default());
                }
                backend.clear_calls();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_identical_state,
    bench_texture_thrash,
    bench_vertex_cache,
    bench_uniform_lighting
);
criterion_main!(benches);

//! Benchmarks for mesh-heightfield.
//!
//! Run with: `cargo bench`
//!
//! CPU benchmarks (expansion, analytic coverage) always run; the GPU
//! end-to-end benchmarks skip themselves when no adapter is available.

#![allow(missing_docs, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mesh_heightfield::{
    best_height, expand_triangles, try_compute_offset_height_map, GpuContext,
    RECORDS_PER_TRIANGLE,
};
use nalgebra::Point3;

/// Flat triangle soup approximating a sphere fan, `count` triangles.
fn fan_soup(count: usize) -> Vec<f32> {
    let mut soup = Vec::with_capacity(count * 9);
    for i in 0..count {
        let a0 = i as f32 / count as f32 * std::f32::consts::TAU;
        let a1 = (i + 1) as f32 / count as f32 * std::f32::consts::TAU;
        soup.extend_from_slice(&[
            0.0,
            0.0,
            0.2,
            a0.cos(),
            a0.sin(),
            0.0,
            a1.cos(),
            a1.sin(),
            0.0,
        ]);
    }
    soup
}

fn bench_expand_triangles(c: &mut Criterion) {
    let mut group = c.benchmark_group("Expansion - Varying Mesh Size");

    for count in [100usize, 1_000, 10_000] {
        let soup = fan_soup(count);
        group.throughput(Throughput::Elements((count * RECORDS_PER_TRIANGLE) as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{count}tri")),
            &soup,
            |b, soup| {
                b.iter(|| black_box(expand_triangles(black_box(soup))));
            },
        );
    }

    group.finish();
}

fn bench_analytic_coverage(c: &mut Criterion) {
    let tri = [
        Point3::new(-0.8, -0.8, 0.0),
        Point3::new(0.8, -0.8, 0.0),
        Point3::new(-0.8, 0.8, 0.0),
    ];
    let resolution = 128usize;

    let mut group = c.benchmark_group("Analytic Coverage");
    group.throughput(Throughput::Elements((resolution * resolution) as u64));

    group.bench_function("128x128 pixel grid", |b| {
        b.iter(|| {
            let mut covered = 0usize;
            for iy in 0..resolution {
                for ix in 0..resolution {
                    let px = 2.0 * ix as f32 / (resolution - 1) as f32 - 1.0;
                    let py = 2.0 * iy as f32 / (resolution - 1) as f32 - 1.0;
                    if best_height(px, py, black_box(&tri), 0.2).is_some() {
                        covered += 1;
                    }
                }
            }
            black_box(covered)
        });
    });

    group.finish();
}

fn bench_raster_varying_resolution(c: &mut Criterion) {
    if !GpuContext::is_available() {
        println!("Skipping GPU benchmarks - no GPU available");
        return;
    }

    let soup = fan_soup(64);
    let mut group = c.benchmark_group("Raster GPU - Varying Resolution");

    for resolution in [64u32, 256, 512, 1024] {
        group.throughput(Throughput::Elements(u64::from(resolution * resolution)));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{resolution}x{resolution}")),
            &resolution,
            |b, &resolution| {
                b.iter(|| {
                    let map = try_compute_offset_height_map(
                        black_box(&soup),
                        black_box(0.1),
                        resolution,
                    );
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

fn bench_raster_varying_mesh_size(c: &mut Criterion) {
    if !GpuContext::is_available() {
        println!("Skipping GPU benchmarks - no GPU available");
        return;
    }

    let mut group = c.benchmark_group("Raster GPU - Varying Mesh Size");
    group.throughput(Throughput::Elements(256 * 256));

    for count in [16usize, 128, 1_024, 8_192] {
        let soup = fan_soup(count);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{count}tri")),
            &soup,
            |b, soup| {
                b.iter(|| {
                    let map =
                        try_compute_offset_height_map(black_box(soup), black_box(0.1), 256);
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_expand_triangles,
    bench_analytic_coverage,
    bench_raster_varying_resolution,
    bench_raster_varying_mesh_size,
);

criterion_main!(benches);

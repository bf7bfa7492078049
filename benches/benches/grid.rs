// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Star sizing over bare track slices.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_layout::{GridLength, Track, set_final_lengths};

fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| match i % 4 {
            0 => Track::new(GridLength::Auto, 0.0, f64::INFINITY),
            1 => Track::new(GridLength::Pixel(24.0), 0.0, f64::INFINITY),
            // Every other star is bounded so clamping paths are exercised.
            2 => Track::new(GridLength::Star(1.0 + (i % 3) as f64), 8.0, 64.0),
            _ => Track::new(GridLength::Star(2.0), 0.0, f64::INFINITY),
        })
        .map(|mut track| {
            track.update_min_length(10.0);
            track
        })
        .collect()
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/set_final_lengths");
    for n in [4_usize, 16, 64, 256] {
        let template = tracks(n);
        group.bench_with_input(BenchmarkId::new("roomy", n), &template, |b, template| {
            b.iter_batched(
                || template.clone(),
                |mut tracks| {
                    set_final_lengths(&mut tracks, 64.0 * n as f64);
                    black_box(tracks);
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("cramped", n), &template, |b, template| {
            b.iter_batched(
                || template.clone(),
                |mut tracks| {
                    set_final_lengths(&mut tracks, 4.0 * n as f64);
                    black_box(tracks);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grid);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use criterion::{criterion_group, criterion_main, Criterion};

#[cfg(target_os = "linux")]
use pprof::criterion::{Output, PProfProfiler};

use elbow_linalg::{
    kmeans::{KMeans, KMeansParams},
    MatrixView,
};
use elbow_testing::datagen::generate_random_array_with_seed;

fn bench_train(c: &mut Criterion) {
    let params = [
        (4 * 1024, 2),  // typical tabular input, few columns
        (4 * 1024, 16), // wider tables
        (32 * 1024, 8),
    ];
    for (n, dimension) in params {
        let values = generate_random_array_with_seed(n * dimension, 42);
        let data = MatrixView::try_new(values, dimension).unwrap();

        for k in [4, 16] {
            c.bench_function(&format!("train_{}d_{}k_{}", dimension, n / 1024, k), |b| {
                b.iter(|| KMeans::train(&data, k, &KMeansParams::default()).unwrap())
            });
        }

        let kmeans = KMeans::train(&data, 16, &KMeansParams::default())
            .unwrap()
            .kmeans;
        c.bench_function(
            &format!("compute_membership_{}d_{}k", dimension, n / 1024),
            |b| b.iter(|| kmeans.compute_membership(&data)),
        );
    }
}

#[cfg(target_os = "linux")]
criterion_group!(
    name=benches;
    config = Criterion::default().significance_level(0.1).sample_size(10)
    .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench_train);

// Non-linux version does not support pprof.
#[cfg(not(target_os = "linux"))]
criterion_group!(
    name=benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = bench_train);
criterion_main!(benches);

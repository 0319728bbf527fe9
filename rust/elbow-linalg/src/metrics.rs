// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Cluster quality metrics.

use rayon::prelude::*;

use crate::distance::{euclidean_distance, L2};
use crate::kmeans::KMeans;
use crate::MatrixView;

/// Within-cluster sum of squares.
///
/// Sum of the squared distance from every vector to the centroid of the
/// cluster it is assigned to.
pub fn wcss(data: &MatrixView, membership: &[u32], kmeans: &KMeans) -> f64 {
    debug_assert_eq!(data.num_rows(), membership.len());
    data.iter()
        .zip(membership)
        .map(|(vector, &cluster_id)| vector.l2(kmeans.centroid(cluster_id as usize)))
        .sum()
}

/// Silhouette coefficient of every vector.
///
/// For vector `i` with mean distance `a` to the other members of its own
/// cluster and smallest mean distance `b` to the members of any other non-empty
/// cluster (0 if there is none), the coefficient is `(b - a) / max(a, b)`, or 0
/// when both are 0.
///
/// Returns `None` for vectors that are alone in their cluster, and for every
/// vector when `k < 2`.
///
/// This is an exact O(n² · dimension) computation. Rows are processed in
/// parallel; each row only reads the shared inputs.
pub fn silhouette_samples(data: &MatrixView, membership: &[u32], k: usize) -> Vec<Option<f64>> {
    debug_assert_eq!(data.num_rows(), membership.len());
    if k < 2 {
        return vec![None; data.num_rows()];
    }

    data.values()
        .par_chunks_exact(data.num_columns())
        .enumerate()
        .map(|(i, vector)| {
            let mut dist_sums = vec![0.0_f64; k];
            let mut counts = vec![0_usize; k];
            for (j, (other, &cluster_id)) in data.iter().zip(membership).enumerate() {
                if i == j {
                    continue;
                }
                dist_sums[cluster_id as usize] += euclidean_distance(vector, other);
                counts[cluster_id as usize] += 1;
            }

            let own = membership[i] as usize;
            if counts[own] == 0 {
                return None;
            }
            let a = dist_sums[own] / counts[own] as f64;
            let b = (0..k)
                .filter(|&c| c != own && counts[c] > 0)
                .map(|c| dist_sums[c] / counts[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let b = if b.is_finite() { b } else { 0.0 };

            let max = a.max(b);
            Some(if max > 0.0 { (b - a) / max } else { 0.0 })
        })
        .collect()
}

/// Mean silhouette coefficient over all vectors that have one.
///
/// Defined as 0 when `k < 2` or when no vector has a coefficient.
pub fn silhouette_score(data: &MatrixView, membership: &[u32], k: usize) -> f64 {
    if k < 2 {
        return 0.0;
    }
    let samples = silhouette_samples(data, membership, k);
    let (sum, count) = samples
        .iter()
        .flatten()
        .fold((0.0_f64, 0_usize), |(sum, count), s| (sum + s, count + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

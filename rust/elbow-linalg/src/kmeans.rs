// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! K-Means with k-means++ seeding and Lloyd refinement.
//!
//! Training is deterministic: every call to [`KMeans::train`] seeds a fresh
//! random generator from [`KMeansParams::seed`], so the same data and `k`
//! always produce the same centroids and membership.

use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use snafu::location;
use tracing::instrument;

use crate::distance::L2;
use crate::kernels::argmin;
use crate::{Error, MatrixView, Result};

/// Seed used for k-means++ unless the caller picks another one.
pub const DEFAULT_SEED: u64 = 12345;

/// Default cap on Lloyd iterations.
pub const DEFAULT_MAX_ITERS: u32 = 100;

/// KMean Training Parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KMeansParams {
    /// Max number of Lloyd iterations. Must be at least 1.
    pub max_iters: u32,

    /// Seed of the k-means++ random generator. The same seed is used for
    /// every `k`.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Sample an index with probability proportional to its weight.
///
/// `draw` is a uniform value scaled by the total weight. Returns the first index
/// whose cumulative weight reaches `draw`. When rounding (or a non-finite total)
/// keeps the cumulative sum below `draw`, the last index is returned.
pub fn weighted_pick(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (idx, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= draw {
            return idx;
        }
    }
    weights.len().saturating_sub(1)
}

/// Initialize using kmean++, and returns the flattened centroids of k clusters.
///
/// Always returns exactly `k * dimension` values. Points may be picked more
/// than once, e.g. when `k` exceeds the number of distinct points.
///
/// # Panics
///
/// Panics if `data` is empty or `k` is 0. [`KMeans::train`] rejects both
/// with an error before seeding.
pub fn kmeans_plusplus(data: &MatrixView, k: usize, rng: &mut impl Rng) -> Vec<f64> {
    assert!(!data.is_empty());
    assert!(k > 0);
    let n = data.num_rows();
    let dimension = data.num_columns();

    let mut centroids = Vec::with_capacity(k * dimension);
    let first_idx = rng.gen_range(0..n);
    centroids.extend_from_slice(data.row(first_idx));

    // Squared distance from each point to its nearest chosen centroid.
    let mut min_dists = vec![f64::INFINITY; n];
    for _ in 1..k {
        let newest = &centroids[centroids.len() - dimension..];
        min_dists
            .par_iter_mut()
            .zip(data.values().par_chunks_exact(dimension))
            .for_each(|(min_dist, vector)| {
                let dist = vector.l2(newest);
                if dist < *min_dist {
                    *min_dist = dist;
                }
            });

        let total: f64 = min_dists.iter().sum();
        let draw = rng.gen::<f64>() * total;
        let chosen = weighted_pick(&min_dists, draw);
        centroids.extend_from_slice(data.row(chosen));
    }
    centroids
}

/// KMeans model: the centroids of `k` clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    /// Centroids for each of the k clusters.
    ///
    /// k * dimension.
    pub centroids: Vec<f64>,

    /// Vector dimension.
    pub dimension: usize,

    /// The number of clusters
    pub k: usize,
}

/// A trained model together with the membership it was trained to.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub kmeans: KMeans,

    /// Cluster id of each input vector, in input order.
    pub membership: Vec<u32>,

    /// Number of assignment passes that ran.
    pub iterations: u32,

    /// False when training stopped at the iteration cap.
    pub converged: bool,
}

impl KMeansFit {
    /// Size of each cluster.
    pub fn histogram(&self) -> Vec<usize> {
        let mut hist = vec![0; self.kmeans.k];
        for &cluster_id in self.membership.iter() {
            hist[cluster_id as usize] += 1;
        }
        hist
    }
}

impl KMeans {
    /// Create a [`KMeans`] with existing centroids.
    pub fn with_centroids(centroids: Vec<f64>, dimension: usize) -> Result<Self> {
        if dimension == 0 || centroids.is_empty() || centroids.len() % dimension != 0 {
            return Err(Error::invalid_input(
                format!(
                    "KMeans: {} centroid values do not form vectors of dimension {}",
                    centroids.len(),
                    dimension
                ),
                location!(),
            ));
        }
        let k = centroids.len() / dimension;
        Ok(Self {
            centroids,
            dimension,
            k,
        })
    }

    /// The centroid of cluster `i`.
    pub fn centroid(&self, i: usize) -> &[f64] {
        &self.centroids[i * self.dimension..(i + 1) * self.dimension]
    }

    pub fn iter_centroids(&self) -> impl Iterator<Item = &[f64]> {
        self.centroids.chunks_exact(self.dimension)
    }

    /// Train a KMeans model on data with `k` clusters.
    ///
    /// Seeds with k-means++ and then refines with Lloyd's algorithm.
    #[instrument(level = "debug", skip(data, params))]
    pub fn train(data: &MatrixView, k: usize, params: &KMeansParams) -> Result<KMeansFit> {
        if data.is_empty() {
            return Err(Error::empty_data(
                "KMeans: training data is empty",
                location!(),
            ));
        }
        if k == 0 {
            return Err(Error::invalid_config(
                "KMeans: k must be at least 1",
                location!(),
            ));
        }
        if params.max_iters == 0 {
            return Err(Error::invalid_config(
                "KMeans: max_iters must be at least 1",
                location!(),
            ));
        }
        if data.num_rows() < k {
            warn!(
                "KMeans: only {} vectors for {} clusters, some clusters will be empty",
                data.num_rows(),
                k
            );
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let kmeans = Self {
            centroids: kmeans_plusplus(data, k, &mut rng),
            dimension: data.num_columns(),
            k,
        };
        Ok(kmeans.refine(data, params.max_iters))
    }

    /// Lloyd's algorithm starting from the current centroids.
    ///
    /// Alternates [`Self::compute_membership`] and [`Self::update`] until an
    /// assignment pass changes nothing or `max_iters` passes ran. Every vector
    /// starts out in cluster 0, so a first pass that puts everything in cluster
    /// 0 converges without updating the centroids.
    pub fn refine(self, data: &MatrixView, max_iters: u32) -> KMeansFit {
        let mut membership = vec![0_u32; data.num_rows()];
        let mut kmeans = self;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iters {
            iterations += 1;
            if iterations % 10 == 0 {
                info!(
                    "KMeans training: k={} iteration {} / {}",
                    kmeans.k, iterations, max_iters
                );
            }
            let next = kmeans.compute_membership(data);
            if next == membership {
                converged = true;
                break;
            }
            membership = next;
            kmeans = kmeans.update(data, &membership);
        }

        if converged {
            info!(
                "KMeans training: k={} converged at iteration {} / {}",
                kmeans.k, iterations, max_iters
            );
        } else {
            debug!(
                "KMeans training: k={} stopped at the iteration cap {}",
                kmeans.k, max_iters
            );
        }

        KMeansFit {
            kmeans,
            membership,
            iterations,
            converged,
        }
    }

    /// Assign each vector to its nearest centroid.
    ///
    /// Ties go to the lowest cluster id. Rows are processed in parallel, each
    /// writing only its own slot, so the result does not depend on scheduling.
    pub fn compute_membership(&self, data: &MatrixView) -> Vec<u32> {
        debug_assert_eq!(data.num_columns(), self.dimension);
        data.values()
            .par_chunks_exact(self.dimension)
            .map(|vector| argmin(self.iter_centroids().map(|c| vector.l2(c))).unwrap_or(0))
            .collect()
    }

    /// Recompute each centroid as the mean of its members.
    ///
    /// A cluster without members keeps its current centroid.
    pub fn update(&self, data: &MatrixView, membership: &[u32]) -> Self {
        let dimension = self.dimension;
        let mut cluster_cnts = vec![0_usize; self.k];
        let mut new_centroids = vec![0.0_f64; self.k * dimension];
        for (vector, &cluster_id) in data.iter().zip(membership) {
            let cluster_id = cluster_id as usize;
            cluster_cnts[cluster_id] += 1;
            for (sum, value) in new_centroids[cluster_id * dimension..(cluster_id + 1) * dimension]
                .iter_mut()
                .zip(vector)
            {
                *sum += value;
            }
        }

        for (i, &cnt) in cluster_cnts.iter().enumerate() {
            let centroid = &mut new_centroids[i * dimension..(i + 1) * dimension];
            if cnt == 0 {
                warn!("KMeans: cluster {} is empty, keeping its centroid", i);
                centroid.copy_from_slice(self.centroid(i));
            } else {
                centroid.iter_mut().for_each(|v| *v /= cnt as f64);
            }
        }

        Self {
            centroids: new_centroids,
            dimension,
            k: self.k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use elbow_testing::datagen::{generate_blobs, two_groups_of_three};
    use proptest::prelude::*;
    use rstest::rstest;

    fn blobs(centers: &[Vec<f64>], per_center: usize, spread: f64, seed: u64) -> MatrixView {
        MatrixView::from_rows(&generate_blobs(centers, per_center, spread, seed)).unwrap()
    }

    fn two_groups() -> MatrixView {
        MatrixView::from_rows(&two_groups_of_three()).unwrap()
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    #[case(6)]
    #[case(9)]
    fn test_kmeans_plusplus_returns_k_centroids(#[case] k: usize) {
        let data = two_groups();
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        let centroids = kmeans_plusplus(&data, k, &mut rng);
        assert_eq!(centroids.len(), k * data.num_columns());
        // Every centroid is one of the input vectors.
        for centroid in centroids.chunks_exact(data.num_columns()) {
            assert!(data.iter().any(|v| v == centroid));
        }
    }

    #[test]
    fn test_kmeans_plusplus_deterministic() {
        let data = blobs(&[vec![0.0, 0.0], vec![5.0, 5.0]], 20, 0.5, 7);
        let a = kmeans_plusplus(&data, 4, &mut StdRng::seed_from_u64(DEFAULT_SEED));
        let b = kmeans_plusplus(&data, 4, &mut StdRng::seed_from_u64(DEFAULT_SEED));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_kmeans_plusplus_zero_clusters() {
        kmeans_plusplus(&two_groups(), 0, &mut StdRng::seed_from_u64(DEFAULT_SEED));
    }

    #[test]
    fn test_kmeans_plusplus_avoids_chosen_points() {
        // Points identical to the first centroid have zero weight, so the second
        // centroid must come from the other group.
        let data = MatrixView::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![10.0, 10.0],
            vec![10.0, 10.0],
        ])
        .unwrap();
        for seed in 0..16 {
            let centroids = kmeans_plusplus(&data, 2, &mut StdRng::seed_from_u64(seed));
            assert_ne!(centroids[0..2], centroids[2..4]);
        }
    }

    #[rstest]
    #[case::first(&[1.0, 1.0, 1.0], 0.5, 0)]
    #[case::middle(&[1.0, 1.0, 1.0], 1.5, 1)]
    #[case::exact_boundary(&[1.0, 1.0, 1.0], 2.0, 1)]
    #[case::zero_weights_skipped(&[0.0, 0.0, 2.0], 0.1, 2)]
    #[case::all_zero(&[0.0, 0.0, 0.0], 0.0, 0)]
    #[case::fallback_overshoot(&[1.0, 1.0, 1.0], 3.5, 2)]
    #[case::fallback_nan(&[1.0, 1.0, 1.0], f64::NAN, 2)]
    fn test_weighted_pick(#[case] weights: &[f64], #[case] draw: f64, #[case] expected: usize) {
        assert_eq!(weighted_pick(weights, draw), expected);
    }

    #[test]
    fn test_kmeans_plusplus_with_infinite_weights() {
        // Squared distances overflow to infinity.
        let data = MatrixView::from_rows(&[vec![-1e200], vec![1e200], vec![5e199]]).unwrap();
        let centroids = kmeans_plusplus(&data, 3, &mut StdRng::seed_from_u64(DEFAULT_SEED));
        assert_eq!(centroids.len(), 3);
        for centroid in centroids.chunks_exact(1) {
            assert!(data.iter().any(|v| v == centroid));
        }
    }

    #[test]
    fn test_compute_membership_ties_go_to_lowest_index() {
        let kmeans = KMeans::with_centroids(vec![-1.0, 0.0, 1.0, 0.0], 2).unwrap();
        let data = MatrixView::from_rows(&[vec![0.0, 0.0], vec![0.9, 0.0]]).unwrap();
        assert_eq!(kmeans.compute_membership(&data), vec![0, 1]);
    }

    #[test_log::test]
    fn test_empty_cluster_keeps_centroid() {
        let kmeans =
            KMeans::with_centroids(vec![5.0, 5.0, 10.0, 10.0, 100.0, 100.0], 2).unwrap();
        let data = MatrixView::from_rows(&[
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![-1.0, -1.0],
            vec![9.0, 9.0],
        ])
        .unwrap();
        let fit = kmeans.refine(&data, 10);
        assert_eq!(fit.membership, vec![0, 0, 0, 1]);
        assert_eq!(fit.kmeans.k, 3);
        assert_eq!(fit.kmeans.centroid(2), &[100.0, 100.0]);
        assert_relative_eq!(fit.kmeans.centroid(0)[0], 0.0);
        assert_relative_eq!(fit.kmeans.centroid(0)[1], 0.0);
        assert_eq!(fit.kmeans.centroid(1), &[9.0, 9.0]);
        assert!(fit.converged);
        assert_eq!(fit.iterations, 2);
        assert_eq!(fit.histogram(), vec![3, 1, 0]);
    }

    #[test]
    fn test_single_cluster_keeps_seed_point() {
        // The first pass puts every vector in cluster 0, which is where they
        // start, so the seed is never replaced by the mean.
        let data = MatrixView::from_rows(&[vec![0.0], vec![10.0]]).unwrap();
        let fit = KMeans::train(&data, 1, &KMeansParams::default()).unwrap();
        assert!(data.iter().any(|v| v == fit.kmeans.centroid(0)));
        assert_ne!(fit.kmeans.centroid(0), &[5.0]);
        assert_eq!(fit.membership, vec![0, 0]);
        assert_eq!(fit.iterations, 1);
        assert!(fit.converged);
    }

    #[test]
    fn test_all_in_first_cluster_converges_without_update() {
        let kmeans = KMeans::with_centroids(vec![0.0, 50.0], 1).unwrap();
        let data = MatrixView::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let fit = kmeans.refine(&data, 10);
        assert_eq!(fit.kmeans.centroids, vec![0.0, 50.0]);
        assert_eq!(fit.iterations, 1);
        assert!(fit.converged);
    }

    #[test]
    fn test_refine_stops_at_cap() {
        let data = blobs(&[vec![0.0, 0.0], vec![3.0, 3.0]], 50, 2.0, 11);
        let kmeans = KMeans::with_centroids(data.values()[0..4].to_vec(), 2).unwrap();
        let fit = kmeans.refine(&data, 1);
        assert_eq!(fit.iterations, 1);
        assert!(!fit.converged);
        assert_eq!(fit.membership.len(), data.num_rows());
    }

    #[test]
    fn test_train_separates_groups() {
        let data = two_groups();
        let fit = KMeans::train(&data, 2, &KMeansParams::default()).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.membership[0], fit.membership[1]);
        assert_eq!(fit.membership[1], fit.membership[2]);
        assert_eq!(fit.membership[3], fit.membership[4]);
        assert_eq!(fit.membership[4], fit.membership[5]);
        assert_ne!(fit.membership[0], fit.membership[3]);
        assert_eq!(fit.histogram(), vec![3, 3]);
    }

    #[test]
    fn test_train_is_idempotent() {
        let data = blobs(
            &[vec![0.0, 0.0, 0.0], vec![4.0, 4.0, 0.0], vec![0.0, 4.0, 4.0]],
            30,
            1.0,
            3,
        );
        let params = KMeansParams::default();
        for k in 1..6 {
            let a = KMeans::train(&data, k, &params).unwrap();
            let b = KMeans::train(&data, k, &params).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_train_rejects_bad_arguments() {
        let data = two_groups();
        assert!(matches!(
            KMeans::train(&data, 0, &KMeansParams::default()),
            Err(Error::InvalidConfig { .. })
        ));
        let params = KMeansParams {
            max_iters: 0,
            ..Default::default()
        };
        assert!(matches!(
            KMeans::train(&data, 2, &params),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_train_more_clusters_than_points() {
        let data = MatrixView::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let fit = KMeans::train(&data, 4, &KMeansParams::default()).unwrap();
        assert_eq!(fit.kmeans.k, 4);
        assert_eq!(fit.kmeans.centroids.len(), 4);
        assert!(fit.kmeans.centroids.iter().all(|v| v.is_finite()));
    }

    fn arbitrary_data() -> impl Strategy<Value = (MatrixView, usize)> {
        (1_usize..5, 1_usize..40).prop_flat_map(|(dim, n)| {
            (
                prop::collection::vec(-100.0_f64..100.0, dim * n)
                    .prop_map(move |values| MatrixView::try_new(values, dim).unwrap()),
                1..=n + 2,
            )
        })
    }

    proptest::proptest! {
        #[test]
        fn test_train_shapes((data, k) in arbitrary_data()) {
            let fit = KMeans::train(&data, k, &KMeansParams::default()).unwrap();
            prop_assert_eq!(fit.kmeans.centroids.len(), k * data.num_columns());
            prop_assert_eq!(fit.membership.len(), data.num_rows());
            prop_assert!(fit.membership.iter().all(|&c| (c as usize) < k));
            prop_assert!(fit.kmeans.centroids.iter().all(|v| v.is_finite()));
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Run k-means once per required `k` and score the results.

use std::collections::{BTreeMap, HashMap};

use elbow_core::utils::{cancel::CancellationToken, progress::ProgressCallback};
use elbow_linalg::{
    kmeans::{KMeans, KMeansFit},
    metrics::{silhouette_score, wcss},
};
use log::{debug, info};
use snafu::location;
use tracing::instrument;

use crate::extract::{ObservationSet, RowId};
use crate::params::EvaluationParams;
use crate::{cluster_label, Error, Result, SKIPPED_LABEL};

/// One clustering run of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KStep {
    pub k: usize,
    /// Scored and reported in the curves.
    pub in_range: bool,
    /// Labels the input rows.
    pub is_solution: bool,
}

/// The `k` values an evaluation clusters with, ascending.
///
/// Walks from `min(min_k, solution_k)` to `max(max_k, solution_k)` and keeps
/// every `k` that is in the evaluated range or is the solution `k`.
pub fn k_schedule(params: &EvaluationParams) -> Vec<KStep> {
    let start = params.min_k.min(params.solution_k);
    let end = params.max_k.max(params.solution_k);
    (start..=end)
        .filter_map(|k| {
            let step = KStep {
                k,
                in_range: params.in_range(k),
                is_solution: k == params.solution_k,
            };
            (step.in_range || step.is_solution).then_some(step)
        })
        .collect()
}

/// Centroid of one cluster for one evaluated `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidRow {
    pub k: usize,
    pub cluster: u32,
    /// Mean of the cluster members, one value per numeric column.
    pub values: Vec<f64>,
}

/// Cluster of every valid input row for the solution `k`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolutionAssignment {
    pub k: usize,
    /// Cluster centers, indexed by cluster id.
    pub centers: Vec<Vec<f64>>,
    assignments: HashMap<RowId, u32>,
}

impl SolutionAssignment {
    fn new(k: usize, fit: &KMeansFit, row_ids: &[RowId]) -> Self {
        Self {
            k,
            centers: fit.kmeans.iter_centroids().map(|c| c.to_vec()).collect(),
            assignments: row_ids
                .iter()
                .copied()
                .zip(fit.membership.iter().copied())
                .collect(),
        }
    }

    /// Cluster of `row`, or `None` if the row was skipped.
    pub fn cluster_of(&self, row: RowId) -> Option<u32> {
        self.assignments.get(&row).copied()
    }

    /// `Cluster_<id>` for assigned rows, `Skipped` for the others.
    pub fn label_of(&self, row: RowId) -> String {
        self.cluster_of(row)
            .map(cluster_label)
            .unwrap_or_else(|| SKIPPED_LABEL.to_string())
    }

    /// Number of assigned rows.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, u32)> + '_ {
        self.assignments.iter().map(|(row, cluster)| (*row, *cluster))
    }
}

/// Everything an evaluation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub params: EvaluationParams,
    /// WCSS of every evaluated `k`.
    pub wcss: BTreeMap<usize, f64>,
    /// Average silhouette of every evaluated `k`.
    pub silhouette: BTreeMap<usize, f64>,
    /// Centroids of every evaluated `k`, by ascending `k` then cluster id.
    pub centroids: Vec<CentroidRow>,
    pub solution: SolutionAssignment,
    /// Names of the numeric columns the vectors were built from.
    pub column_names: Vec<String>,
    /// Number of input rows dropped because of missing values.
    pub num_skipped: usize,
}

/// Evaluate k-means over `params.min_k..=params.max_k` and cluster with
/// `params.solution_k`.
///
/// Each `k` is clustered once, even when it is both evaluated and the solution.
/// `cancel` is checked before every `k`; a cancelled run returns
/// [`Error::Cancelled`] and nothing else.
#[instrument(level = "info", skip_all, fields(
    min_k = params.min_k,
    max_k = params.max_k,
    solution_k = params.solution_k,
))]
pub fn evaluate(
    observations: &ObservationSet,
    params: &EvaluationParams,
    progress: &dyn ProgressCallback,
    cancel: &CancellationToken,
) -> Result<EvaluationResult> {
    params.validate()?;
    if observations.is_empty() {
        return Err(Error::empty_data("no vectors to cluster", location!()));
    }

    let schedule = k_schedule(params);
    let start = params.min_k.min(params.solution_k);
    let end = params.max_k.max(params.solution_k);
    let span = (end - start) as f64;
    let kmeans_params = params.kmeans_params();
    let data = observations.data();

    progress.begin(schedule.len() as u64);
    let mut wcss_curve = BTreeMap::new();
    let mut silhouette_curve = BTreeMap::new();
    let mut centroids = Vec::new();
    let mut solution = None;
    for step in schedule {
        cancel.check()?;
        progress.update(
            (step.k - start) as f64 / span,
            &format!("Clustering k={}", step.k),
        );

        let fit = KMeans::train(data, step.k, &kmeans_params)?;
        debug!(
            "k={}: {} iterations, converged={}, cluster sizes {:?}",
            step.k,
            fit.iterations,
            fit.converged,
            fit.histogram()
        );

        if step.in_range {
            let wcss = wcss(data, &fit.membership, &fit.kmeans);
            let silhouette = silhouette_score(data, &fit.membership, step.k);
            info!(
                "k={}: WCSS={:.6} average silhouette={:.6}",
                step.k, wcss, silhouette
            );
            wcss_curve.insert(step.k, wcss);
            silhouette_curve.insert(step.k, silhouette);
            centroids.extend(fit.kmeans.iter_centroids().enumerate().map(
                |(cluster, values)| CentroidRow {
                    k: step.k,
                    cluster: cluster as u32,
                    values: values.to_vec(),
                },
            ));
        }
        if step.is_solution {
            solution = Some(SolutionAssignment::new(
                step.k,
                &fit,
                observations.row_ids(),
            ));
        }
    }

    let solution = solution.ok_or_else(|| {
        Error::internal(
            format!("solution k={} was never clustered", params.solution_k),
            location!(),
        )
    })?;
    Ok(EvaluationResult {
        params: params.clone(),
        wcss: wcss_curve,
        silhouette: silhouette_curve,
        centroids,
        solution,
        column_names: observations.column_names().to_vec(),
        num_skipped: observations.num_skipped(),
    })
}

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Pick the number of k-means clusters for a table.
//!
//! For every `k` in a range, Elbow fits a k-means model and records the
//! within-cluster sum of squares (WCSS) and the average silhouette
//! coefficient, the two curves behind the elbow and silhouette heuristics. For
//! one chosen *solution* `k` it also labels every input row with its cluster.
//!
//! ```rust,ignore
//! use elbow::{evaluate, EvaluationParams, ObservationSet};
//! use elbow_core::utils::{cancel::CancellationToken, progress::NoopProgressCallback};
//!
//! let observations = ObservationSet::try_from_batches(&batches)?;
//! let params = EvaluationParams { min_k: 2, max_k: 8, solution_k: 3, ..Default::default() };
//! let result = evaluate(
//!     &observations,
//!     &params,
//!     &NoopProgressCallback::default(),
//!     &CancellationToken::new(),
//! )?;
//! for (k, wcss) in result.wcss.iter() {
//!     println!("k={k} wcss={wcss}");
//! }
//! ```

pub mod evaluate;
pub mod extract;
pub mod output;
pub mod params;
pub mod session;

pub use elbow_core::{Error, Result};
pub use evaluate::{evaluate, CentroidRow, EvaluationResult, SolutionAssignment};
pub use extract::{ObservationSet, RowId};
pub use params::EvaluationParams;
pub use session::EvaluationSession;

/// Label of the rows dropped because of missing values.
pub const SKIPPED_LABEL: &str = "Skipped";

/// Label of cluster `cluster_id`, as used in every output table.
pub fn cluster_label(cluster_id: u32) -> String {
    format!("Cluster_{}", cluster_id)
}

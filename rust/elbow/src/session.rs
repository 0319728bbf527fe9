// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::collections::BTreeMap;
use std::sync::Arc;

use elbow_core::utils::{cancel::CancellationToken, progress::ProgressCallback};
use log::info;

use crate::evaluate::{evaluate, EvaluationResult};
use crate::extract::ObservationSet;
use crate::params::EvaluationParams;
use crate::Result;

/// Holds the result of the last successful evaluation.
///
/// A run that fails or is cancelled leaves the stored result as it was.
#[derive(Debug, Clone, Default)]
pub struct EvaluationSession {
    last: Option<Arc<EvaluationResult>>,
}

impl EvaluationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate and, on success, store the result.
    pub fn run(
        &mut self,
        observations: &ObservationSet,
        params: &EvaluationParams,
        progress: &dyn ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<Arc<EvaluationResult>> {
        let result = Arc::new(evaluate(observations, params, progress, cancel)?);
        self.last = Some(result.clone());
        Ok(result)
    }

    pub fn last_result(&self) -> Option<Arc<EvaluationResult>> {
        self.last.clone()
    }

    /// Copy of the last WCSS curve, empty if nothing has run.
    pub fn wcss_curve(&self) -> BTreeMap<usize, f64> {
        self.last
            .as_ref()
            .map(|result| result.wcss.clone())
            .unwrap_or_default()
    }

    /// Copy of the last average silhouette curve, empty if nothing has run.
    pub fn silhouette_curve(&self) -> BTreeMap<usize, f64> {
        self.last
            .as_ref()
            .map(|result| result.silhouette.clone())
            .unwrap_or_default()
    }

    /// Drop the stored result.
    pub fn reset(&mut self) {
        if self.last.take().is_some() {
            info!("Cleared the stored evaluation result");
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::path::Path;

use elbow_linalg::kmeans::{KMeansParams, DEFAULT_MAX_ITERS, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use snafu::location;

use crate::{Error, Result};

/// Largest `k` accepted. Output tables store `k` as a 32-bit integer.
pub const MAX_K: usize = i32::MAX as usize;

/// Parameters of an evaluation run.
///
/// Serialized as JSON so settings can be saved and reloaded. Missing keys take
/// their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// Smallest k of the evaluated range. At least 2.
    pub min_k: usize,

    /// Largest k of the evaluated range. Greater than `min_k`.
    pub max_k: usize,

    /// The k whose clustering labels the input rows. Independent of the range.
    pub solution_k: usize,

    /// Cap on Lloyd iterations for each k.
    pub max_iters: u32,

    /// Seed of the k-means++ initialization, shared by every k.
    pub seed: u64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            min_k: 2,
            max_k: 10,
            solution_k: 3,
            max_iters: DEFAULT_MAX_ITERS,
            seed: DEFAULT_SEED,
        }
    }
}

impl EvaluationParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_k < 2 {
            return Err(Error::invalid_config(
                format!("min_k must be at least 2, got {}", self.min_k),
                location!(),
            ));
        }
        if self.max_k <= self.min_k {
            return Err(Error::invalid_config(
                format!(
                    "max_k ({}) must be greater than min_k ({})",
                    self.max_k, self.min_k
                ),
                location!(),
            ));
        }
        if self.solution_k < 1 {
            return Err(Error::invalid_config(
                "solution_k must be at least 1",
                location!(),
            ));
        }
        if self.max_k > MAX_K || self.solution_k > MAX_K {
            return Err(Error::invalid_config(
                format!(
                    "max_k ({}) and solution_k ({}) must not exceed {}",
                    self.max_k, self.solution_k, MAX_K
                ),
                location!(),
            ));
        }
        if self.max_iters < 1 {
            return Err(Error::invalid_config(
                "max_iters must be at least 1",
                location!(),
            ));
        }
        Ok(())
    }

    /// True if `k` is inside the evaluated range.
    pub fn in_range(&self, k: usize) -> bool {
        (self.min_k..=self.max_k).contains(&k)
    }

    pub fn kmeans_params(&self) -> KMeansParams {
        KMeansParams {
            max_iters: self.max_iters,
            seed: self.seed,
        }
    }

    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Validate and write settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let params = EvaluationParams::default();
        params.validate().unwrap();
        assert_eq!(params.kmeans_params(), KMeansParams::default());
    }

    #[rstest]
    #[case::min_k_too_small(1, 5, 2, 100, "min_k must be at least 2")]
    #[case::empty_range(3, 3, 2, 100, "must be greater than min_k")]
    #[case::inverted_range(5, 3, 2, 100, "must be greater than min_k")]
    #[case::no_solution(2, 5, 0, 100, "solution_k")]
    #[case::no_iterations(2, 5, 2, 0, "max_iters")]
    #[case::max_k_too_large(2, MAX_K + 1, 2, 100, "must not exceed")]
    #[case::solution_k_too_large(2, 5, MAX_K + 1, 100, "must not exceed")]
    fn test_validate_rejects(
        #[case] min_k: usize,
        #[case] max_k: usize,
        #[case] solution_k: usize,
        #[case] max_iters: u32,
        #[case] expected: &str,
    ) {
        let params = EvaluationParams {
            min_k,
            max_k,
            solution_k,
            max_iters,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(err.to_string().contains(expected), "{}", err);
    }

    #[test]
    fn test_solution_k_outside_range_is_valid() {
        let params = EvaluationParams {
            min_k: 4,
            max_k: 6,
            solution_k: 1,
            ..Default::default()
        };
        params.validate().unwrap();
        assert!(!params.in_range(1));
        assert!(params.in_range(4));
        assert!(params.in_range(6));
    }

    #[test]
    fn test_json_missing_keys_take_defaults() {
        let params = EvaluationParams::from_json(r#"{"min_k": 3, "max_k": 7}"#).unwrap();
        assert_eq!(params.min_k, 3);
        assert_eq!(params.max_k, 7);
        assert_eq!(params.solution_k, 3);
        assert_eq!(params.max_iters, DEFAULT_MAX_ITERS);
        assert_eq!(params.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_json_invalid_settings() {
        assert!(matches!(
            EvaluationParams::from_json(r#"{"min_k": 1}"#),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            EvaluationParams::from_json(r#"{"min_k": "two"}"#),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let params = EvaluationParams {
            min_k: 3,
            max_k: 12,
            solution_k: 5,
            max_iters: 40,
            seed: 7,
        };
        params.save(&path).unwrap();
        assert_eq!(EvaluationParams::load(&path).unwrap(), params);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EvaluationParams::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::IO { .. }));
    }
}

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Data generation utilities for unit tests

use std::iter::repeat_with;
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema as ArrowSchema};
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};

/// Generate `points_per_center` vectors around each center.
///
/// Every component is offset uniformly in `[-spread, spread]`. Vectors are
/// grouped by center, in the order the centers are given.
pub fn generate_blobs(
    centers: &[Vec<f64>],
    points_per_center: usize,
    spread: f64,
    seed: u64,
) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = Uniform::new_inclusive(-spread, spread);
    let mut rows = Vec::with_capacity(centers.len() * points_per_center);
    for center in centers {
        for _ in 0..points_per_center {
            rows.push(center.iter().map(|c| c + offset.sample(&mut rng)).collect());
        }
    }
    rows
}

/// Six 2-d points in two well separated groups of three.
///
/// Rows 0..3 form one group and rows 3..6 the other.
pub fn two_groups_of_three() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 1.0],
        vec![1.5, 2.0],
        vec![2.0, 1.5],
        vec![8.0, 8.0],
        vec![8.5, 9.0],
        vec![9.0, 8.5],
    ]
}

/// Create `n` random values, uniformly distributed in `[0, 1)`.
pub fn generate_random_array_with_seed(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let distribution = Uniform::new(0.0, 1.0);
    repeat_with(|| distribution.sample(&mut rng))
        .take(n)
        .collect()
}

/// Build a batch of nullable `Float64` columns.
pub fn numeric_batch(columns: Vec<(&str, Vec<Option<f64>>)>) -> RecordBatch {
    let fields = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Float64, true))
        .collect::<Vec<_>>();
    let arrays = columns
        .into_iter()
        .map(|(_, values)| Arc::new(Float64Array::from(values)) as ArrayRef)
        .collect::<Vec<_>>();
    RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays).unwrap()
}

/// Build a batch from rows of vectors, with a leading `name` text column so
/// that a non-numeric column is present too.
pub fn labeled_batch(rows: &[Vec<f64>]) -> RecordBatch {
    let dimension = rows.first().map(|r| r.len()).unwrap_or_default();
    let mut fields = vec![Field::new("name", DataType::Utf8, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
        (0..rows.len()).map(|i| format!("row_{}", i)),
    ))];
    for d in 0..dimension {
        fields.push(Field::new(format!("x{}", d), DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r[d]),
        )));
    }
    RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays).unwrap()
}

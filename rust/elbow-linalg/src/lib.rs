// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Dense linear algebra, k-means and cluster quality metrics.
//!
//! Vectors are stored row-major as `f64` in a [`MatrixView`]; every algorithm
//! in this crate is Euclidean.

pub mod distance;
pub mod kernels;
pub mod kmeans;
pub mod matrix;
pub mod metrics;

pub use elbow_core::{Error, Result};
pub use matrix::MatrixView;

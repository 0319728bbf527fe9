// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! L2 (Euclidean) distance.
//!
//! Following the usual convention, [`L2::l2`] and [`l2_distance`] return the
//! *squared* distance. Use [`euclidean_distance`] for the metric itself.

use std::iter::Sum;

use num_traits::real::Real;

/// Calculate the squared L2 distance between two vectors.
pub trait L2 {
    type Output;

    /// Calculate the squared L2 distance between two vectors.
    fn l2(&self, other: &Self) -> Self::Output;
}

/// Squared L2 distance using scalar operations.
///
/// Rely on compiler auto-vectorization.
#[inline]
fn l2_scalar<T: Real + Sum>(from: &[T], to: &[T]) -> T {
    debug_assert_eq!(from.len(), to.len());
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| a.sub(*b).powi(2))
        .sum::<T>()
}

impl L2 for [f64] {
    type Output = f64;

    #[inline]
    fn l2(&self, other: &[f64]) -> f64 {
        l2_scalar(self, other)
    }
}

/// Compute the squared L2 distance between two vectors.
#[inline]
pub fn l2_distance(from: &[f64], to: &[f64]) -> f64 {
    from.l2(to)
}

/// Compute the Euclidean distance between two vectors.
#[inline]
pub fn euclidean_distance(from: &[f64], to: &[f64]) -> f64 {
    l2_distance(from, to).sqrt()
}

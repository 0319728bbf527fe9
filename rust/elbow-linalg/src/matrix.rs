// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::sync::Arc;

use snafu::location;

use crate::{Error, Result};

/// A read-only, row-major view over a set of equal length vectors.
///
/// Cloning is cheap; the values are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView {
    data: Arc<[f64]>,
    num_columns: usize,
}

impl MatrixView {
    /// Create a matrix from flat row-major values.
    pub fn try_new(data: impl Into<Arc<[f64]>>, num_columns: usize) -> Result<Self> {
        let data = data.into();
        if num_columns == 0 {
            return Err(Error::invalid_input(
                "matrix must have at least one column",
                location!(),
            ));
        }
        if data.len() % num_columns != 0 {
            return Err(Error::invalid_input(
                format!(
                    "data length {} is not a multiple of the column count {}",
                    data.len(),
                    num_columns
                ),
                location!(),
            ));
        }
        Ok(Self { data, num_columns })
    }

    /// Create a matrix from rows. All rows must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let num_columns = rows.first().map(|r| r.as_ref().len()).unwrap_or_default();
        let mut values = Vec::with_capacity(rows.len() * num_columns);
        for (idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != num_columns {
                return Err(Error::invalid_input(
                    format!(
                        "row {} has {} values, expected {}",
                        idx,
                        row.len(),
                        num_columns
                    ),
                    location!(),
                ));
            }
            values.extend_from_slice(row);
        }
        Self::try_new(values, num_columns)
    }

    pub fn num_rows(&self) -> usize {
        self.data.len() / self.num_columns
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The `i`-th row. Panics if out of bounds.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.num_columns..(i + 1) * self.num_columns]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.num_columns)
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }
}

// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Turn Arrow record batches into the vectors k-means works on.

use arrow_array::{cast::AsArray, types::Float64Type, Array, RecordBatch};
use arrow_schema::{DataType, Schema};
use elbow_linalg::MatrixView;
use log::debug;
use snafu::location;

use crate::{Error, Result};

/// Identity of an input row: its zero-based position across all input batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

/// Numeric vectors extracted from a table, one per row without missing values.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    data: MatrixView,
    row_ids: Vec<RowId>,
    column_names: Vec<String>,
    num_input_rows: usize,
}

/// Columns usable as a vector component: integers and floats.
pub fn is_numeric(data_type: &DataType) -> bool {
    data_type.is_integer() || data_type.is_floating()
}

/// Indices of the numeric columns of `schema`, in schema order.
pub fn numeric_columns(schema: &Schema) -> Vec<usize> {
    schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| is_numeric(field.data_type()))
        .map(|(idx, _)| idx)
        .collect()
}

impl ObservationSet {
    /// Extract vectors from record batches.
    ///
    /// Every numeric column becomes one dimension. A row with a null in any
    /// numeric column is skipped and does not get a vector.
    pub fn try_from_batches(batches: &[RecordBatch]) -> Result<Self> {
        let schema = batches
            .first()
            .map(|batch| batch.schema())
            .ok_or_else(|| Error::invalid_input("input table is missing", location!()))?;
        let columns = numeric_columns(&schema);
        if columns.is_empty() {
            return Err(Error::invalid_input(
                "no numeric columns found in input",
                location!(),
            ));
        }
        let column_names = columns
            .iter()
            .map(|&idx| schema.field(idx).name().clone())
            .collect::<Vec<_>>();
        let dimension = columns.len();

        let mut values = Vec::new();
        let mut row_ids = Vec::new();
        let mut offset = 0_u64;
        for batch in batches {
            if batch.schema() != schema {
                return Err(Error::invalid_input(
                    format!(
                        "all batches must share one schema, expected {:?}, got {:?}",
                        schema,
                        batch.schema()
                    ),
                    location!(),
                ));
            }
            let arrays = columns
                .iter()
                .map(|&idx| arrow_cast::cast(batch.column(idx), &DataType::Float64))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let arrays = arrays
                .iter()
                .map(|arr| arr.as_primitive::<Float64Type>())
                .collect::<Vec<_>>();

            for row in 0..batch.num_rows() {
                if arrays.iter().any(|arr| arr.is_null(row)) {
                    continue;
                }
                values.extend(arrays.iter().map(|arr| arr.value(row)));
                row_ids.push(RowId(offset + row as u64));
            }
            offset += batch.num_rows() as u64;
        }

        if row_ids.is_empty() {
            return Err(Error::empty_data(
                "input table is empty or all rows contained missing values",
                location!(),
            ));
        }
        debug!(
            "Extracted {} of {} rows with {} numeric columns",
            row_ids.len(),
            offset,
            dimension
        );

        Ok(Self {
            data: MatrixView::try_new(values, dimension)?,
            row_ids,
            column_names,
            num_input_rows: offset as usize,
        })
    }

    /// Wrap an in-memory matrix. Row `i` gets `RowId(i)` and columns are named
    /// `x0`, `x1`, ...
    pub fn from_matrix(data: MatrixView) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::empty_data("no vectors to cluster", location!()));
        }
        let row_ids = (0..data.num_rows() as u64).map(RowId).collect();
        let column_names = (0..data.num_columns()).map(|d| format!("x{}", d)).collect();
        Ok(Self {
            num_input_rows: data.num_rows(),
            data,
            row_ids,
            column_names,
        })
    }

    pub fn data(&self) -> &MatrixView {
        &self.data
    }

    /// Identity of each vector, parallel to the rows of [`Self::data`].
    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    /// Names of the numeric columns, one per dimension.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn dimension(&self) -> usize {
        self.data.num_columns()
    }

    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    /// Number of rows in the input, including skipped ones.
    pub fn num_input_rows(&self) -> usize {
        self.num_input_rows
    }

    /// Number of rows dropped because of missing values.
    pub fn num_skipped(&self) -> usize {
        self.num_input_rows - self.row_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use arrow_array::{ArrayRef, Float32Array, Int32Array, StringArray, UInt8Array};
    use arrow_schema::Field;
    use elbow_testing::datagen::{labeled_batch, numeric_batch};

    #[test]
    fn test_extract_skips_missing() {
        let batch = numeric_batch(vec![
            ("a", vec![Some(1.0), None, Some(3.0), Some(4.0)]),
            ("b", vec![Some(10.0), Some(20.0), None, Some(40.0)]),
        ]);
        let obs = ObservationSet::try_from_batches(&[batch]).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.dimension(), 2);
        assert_eq!(obs.row_ids(), &[RowId(0), RowId(3)]);
        assert_eq!(obs.data().row(0), &[1.0, 10.0]);
        assert_eq!(obs.data().row(1), &[4.0, 40.0]);
        assert_eq!(obs.num_input_rows(), 4);
        assert_eq!(obs.num_skipped(), 2);
    }

    #[test]
    fn test_extract_numeric_columns_only() {
        let batch = labeled_batch(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let obs = ObservationSet::try_from_batches(&[batch]).unwrap();
        assert_eq!(obs.column_names(), &["x0".to_string(), "x1".to_string()]);
        assert_eq!(obs.data().row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_extract_casts_integer_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("i", DataType::Int32, true),
            Field::new("u", DataType::UInt8, true),
            Field::new("f", DataType::Float32, true),
            Field::new("s", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, -2])) as ArrayRef,
                Arc::new(UInt8Array::from(vec![3, 4])),
                Arc::new(Float32Array::from(vec![0.5, 1.5])),
                Arc::new(StringArray::from(vec!["a", "b"])),
            ],
        )
        .unwrap();
        let obs = ObservationSet::try_from_batches(&[batch]).unwrap();
        assert_eq!(obs.dimension(), 3);
        assert_eq!(obs.data().row(1), &[-2.0, 4.0, 1.5]);
    }

    #[test]
    fn test_row_ids_span_batches() {
        let first = numeric_batch(vec![("a", vec![Some(1.0), None])]);
        let second = numeric_batch(vec![("a", vec![Some(5.0), Some(6.0)])]);
        let obs = ObservationSet::try_from_batches(&[first, second]).unwrap();
        assert_eq!(obs.row_ids(), &[RowId(0), RowId(2), RowId(3)]);
        assert_eq!(obs.num_input_rows(), 4);
    }

    #[test]
    fn test_extract_errors() {
        assert!(matches!(
            ObservationSet::try_from_batches(&[]),
            Err(Error::InvalidInput { .. })
        ));

        let schema = Arc::new(Schema::new(vec![Field::new("s", DataType::Utf8, true)]));
        let text_only =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a"]))]).unwrap();
        let err = ObservationSet::try_from_batches(&[text_only]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(err.to_string().contains("no numeric columns"));

        let all_missing = numeric_batch(vec![("a", vec![None, None])]);
        assert!(matches!(
            ObservationSet::try_from_batches(&[all_missing]),
            Err(Error::EmptyData { .. })
        ));

        let mismatched = [
            numeric_batch(vec![("a", vec![Some(1.0)])]),
            numeric_batch(vec![("b", vec![Some(1.0)])]),
        ];
        assert!(matches!(
            ObservationSet::try_from_batches(&mismatched),
            Err(Error::InvalidInput { .. })
        ));
    }
}

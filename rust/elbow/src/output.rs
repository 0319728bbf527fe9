// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Arrow tables built from an [`EvaluationResult`].
//!
//! There are four of them:
//!
//! 1. the input rows with a `Cluster` label column,
//! 2. `k` against WCSS,
//! 3. `k` against the average silhouette,
//! 4. one centroid row per cluster per evaluated `k`.

use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use snafu::location;

use crate::evaluate::EvaluationResult;
use crate::extract::{numeric_columns, RowId};
use crate::{cluster_label, Error, Result};

pub const CLUSTER_COLUMN: &str = "Cluster";
pub const K_COLUMN: &str = "k";
pub const WCSS_COLUMN: &str = "WCSS";
pub const SILHOUETTE_COLUMN: &str = "Avg_Silhouette";

/// Name of the centroid column for the input column `column`.
pub fn center_column(column: &str) -> String {
    format!("Center_{}", column)
}

/// Input schema with the `Cluster` label column appended.
pub fn label_schema(input: &Schema) -> Result<SchemaRef> {
    if input.column_with_name(CLUSTER_COLUMN).is_some() {
        return Err(Error::invalid_input(
            format!("input already has a column named {}", CLUSTER_COLUMN),
            location!(),
        ));
    }
    let mut fields = input.fields().iter().cloned().collect::<Vec<_>>();
    fields.push(Arc::new(Field::new(CLUSTER_COLUMN, DataType::Utf8, false)));
    Ok(Arc::new(Schema::new_with_metadata(
        fields,
        input.metadata().clone(),
    )))
}

pub fn wcss_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(K_COLUMN, DataType::Int32, false),
        Field::new(WCSS_COLUMN, DataType::Float64, false),
    ]))
}

pub fn silhouette_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(K_COLUMN, DataType::Int32, false),
        Field::new(SILHOUETTE_COLUMN, DataType::Float64, false),
    ]))
}

/// `k`, `Cluster`, then one `Center_<column>` per numeric column.
pub fn centroid_schema(column_names: &[String]) -> SchemaRef {
    let mut fields = vec![
        Field::new(K_COLUMN, DataType::Int32, false),
        Field::new(CLUSTER_COLUMN, DataType::Utf8, false),
    ];
    fields.extend(
        column_names
            .iter()
            .map(|name| Field::new(center_column(name), DataType::Float64, false)),
    );
    Arc::new(Schema::new(fields))
}

/// Schemas of the four output tables, derived from the input schema alone.
///
/// Fails like an evaluation would if the input has no numeric column.
pub fn output_schemas(input: &Schema) -> Result<[SchemaRef; 4]> {
    let columns = numeric_columns(input);
    if columns.is_empty() {
        return Err(Error::invalid_input(
            "no numeric columns found in input",
            location!(),
        ));
    }
    let column_names = columns
        .iter()
        .map(|&idx| input.field(idx).name().clone())
        .collect::<Vec<_>>();
    Ok([
        label_schema(input)?,
        wcss_schema(),
        silhouette_schema(),
        centroid_schema(&column_names),
    ])
}

/// Append the solution label of every row to the input batches.
///
/// `input` must be the batches the evaluated observations were extracted from.
pub fn label_batches(
    input: &[RecordBatch],
    result: &EvaluationResult,
) -> Result<Vec<RecordBatch>> {
    let Some(first) = input.first() else {
        return Ok(Vec::new());
    };
    let schema = label_schema(&first.schema())?;
    let mut offset = 0_u64;
    input
        .iter()
        .map(|batch| {
            let labels = StringArray::from_iter_values(
                (0..batch.num_rows() as u64)
                    .map(|row| result.solution.label_of(RowId(offset + row))),
            );
            offset += batch.num_rows() as u64;
            let mut columns = batch.columns().to_vec();
            columns.push(Arc::new(labels));
            Ok(RecordBatch::try_new(schema.clone(), columns)?)
        })
        .collect()
}

/// `k` as stored in the `k` columns.
fn k_value(k: usize) -> Result<i32> {
    i32::try_from(k).map_err(|_| {
        Error::invalid_config(
            format!("k={} does not fit in the Int32 k column", k),
            location!(),
        )
    })
}

fn curve_batch<'a>(
    schema: SchemaRef,
    curve: impl Iterator<Item = (&'a usize, &'a f64)>,
) -> Result<RecordBatch> {
    let mut ks = Vec::new();
    let mut values = Vec::new();
    for (k, value) in curve {
        ks.push(k_value(*k)?);
        values.push(*value);
    }
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(ks)),
            Arc::new(Float64Array::from(values)),
        ],
    )?)
}

/// `k` against WCSS, ascending by `k`.
pub fn wcss_batch(result: &EvaluationResult) -> Result<RecordBatch> {
    curve_batch(wcss_schema(), result.wcss.iter())
}

/// `k` against the average silhouette, ascending by `k`.
pub fn silhouette_batch(result: &EvaluationResult) -> Result<RecordBatch> {
    curve_batch(silhouette_schema(), result.silhouette.iter())
}

/// One row per cluster per evaluated `k`.
pub fn centroid_batch(result: &EvaluationResult) -> Result<RecordBatch> {
    let schema = centroid_schema(&result.column_names);
    let rows = &result.centroids;
    if let Some(row) = rows
        .iter()
        .find(|row| row.values.len() != result.column_names.len())
    {
        return Err(Error::internal(
            format!(
                "centroid of k={} cluster {} has {} values, expected {}",
                row.k,
                row.cluster,
                row.values.len(),
                result.column_names.len()
            ),
            location!(),
        ));
    }

    let ks = rows
        .iter()
        .map(|row| k_value(row.k))
        .collect::<Result<Vec<_>>>()?;
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(ks)),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|row| cluster_label(row.cluster)),
        )),
    ];
    for dim in 0..result.column_names.len() {
        columns.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|row| row.values[dim]),
        )));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

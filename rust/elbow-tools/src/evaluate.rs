// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::collections::BTreeMap;
use std::io::Write;

use arrow_cast::pretty::pretty_format_batches;
use elbow::output::{centroid_batch, label_batches, output_schemas, silhouette_batch, wcss_batch};
use elbow::{cluster_label, evaluate, ObservationSet};
use elbow_core::utils::{cancel::CancellationToken, progress::LogProgressCallback};
use elbow_core::{Error, Result};
use log::info;
use snafu::location;

use crate::cli::{EvaluateArgs, SchemasArgs};
use crate::util::{read_csv, write_csv};

pub(crate) fn run_evaluate(mut writer: impl Write, args: &EvaluateArgs) -> Result<()> {
    let params = args.params()?;
    if let Some(path) = &args.save_config {
        params.save(path)?;
        info!("Saved settings to {}", path.display());
    }

    let batches = read_csv(&args.input)?;
    let observations = ObservationSet::try_from_batches(&batches)?;
    let result = evaluate(
        &observations,
        &params,
        &LogProgressCallback::default(),
        &CancellationToken::new(),
    )?;

    writeln!(
        writer,
        "Clustered {} of {} rows on {} numeric columns ({} skipped for missing values)",
        observations.len(),
        observations.num_input_rows(),
        observations.dimension(),
        observations.num_skipped(),
    )?;
    writeln!(writer, "{}", pretty_format_batches(&[wcss_batch(&result)?])?)?;
    writeln!(
        writer,
        "{}",
        pretty_format_batches(&[silhouette_batch(&result)?])?
    )?;
    writeln!(
        writer,
        "{}",
        pretty_format_batches(&[centroid_batch(&result)?])?
    )?;

    let mut sizes = BTreeMap::new();
    for (_, cluster) in result.solution.iter() {
        *sizes.entry(cluster).or_insert(0_usize) += 1;
    }
    writeln!(writer, "Solution k={}:", result.solution.k)?;
    for (cluster, size) in sizes {
        writeln!(writer, "  {}: {} rows", cluster_label(cluster), size)?;
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        write_csv(&dir.join("labels.csv"), &label_batches(&batches, &result)?)?;
        write_csv(&dir.join("wcss.csv"), &[wcss_batch(&result)?])?;
        write_csv(&dir.join("silhouette.csv"), &[silhouette_batch(&result)?])?;
        write_csv(&dir.join("centroids.csv"), &[centroid_batch(&result)?])?;
        info!("Wrote output tables to {}", dir.display());
    }
    Ok(())
}

pub(crate) fn show_schemas(mut writer: impl Write, args: &SchemasArgs) -> Result<()> {
    let batches = read_csv(&args.input)?;
    let schema = batches
        .first()
        .map(|batch| batch.schema())
        .ok_or_else(|| Error::invalid_input("input table is missing", location!()))?;
    let names = ["labels", "wcss", "silhouette", "centroids"];
    for (name, schema) in names.iter().zip(output_schemas(&schema)?) {
        writeln!(writer, "{}:", name)?;
        for field in schema.fields() {
            writeln!(writer, "  {}: {}", field.name(), field.data_type())?;
        }
    }
    Ok(())
}

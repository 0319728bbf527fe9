// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use elbow::EvaluationParams;
use elbow_core::Result;

#[derive(Parser, Debug)]
#[command(
    name = "elbow-tools",
    about = "Find the number of k-means clusters for a table",
    version
)]
pub struct ElbowToolsArgs {
    /// Subcommand to run
    #[command(subcommand)]
    command: ElbowToolsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ElbowToolsCommand {
    /// Cluster a CSV file for a range of k and report WCSS and silhouette.
    Evaluate(EvaluateArgs),
    /// Show the schemas of the output tables without clustering.
    Schemas(SchemasArgs),
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// CSV file with a header row. Numeric columns are clustered.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub(crate) input: PathBuf,

    /// Smallest evaluated k.
    #[arg(long, value_name = "K")]
    pub(crate) min_k: Option<usize>,

    /// Largest evaluated k.
    #[arg(long, value_name = "K")]
    pub(crate) max_k: Option<usize>,

    /// The k used to label the input rows.
    #[arg(short = 'k', long, value_name = "K")]
    pub(crate) solution_k: Option<usize>,

    /// Cap on Lloyd iterations for each k.
    #[arg(long, value_name = "NUM")]
    pub(crate) max_iters: Option<u32>,

    /// Seed of the k-means++ initialization.
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// JSON settings file. Options given on the command line take precedence.
    #[arg(short = 'c', long, value_name = "JSON")]
    pub(crate) config: Option<PathBuf>,

    /// Write the resolved settings to this JSON file.
    #[arg(long, value_name = "JSON")]
    pub(crate) save_config: Option<PathBuf>,

    /// Directory for labels.csv, wcss.csv, silhouette.csv and centroids.csv.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// CSV file with a header row.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub(crate) input: PathBuf,
}

impl EvaluateArgs {
    /// Settings from the config file, or the defaults, with command line
    /// overrides applied.
    pub fn params(&self) -> Result<EvaluationParams> {
        let mut params = match &self.config {
            Some(path) => EvaluationParams::load(path)?,
            None => EvaluationParams::default(),
        };
        if let Some(min_k) = self.min_k {
            params.min_k = min_k;
        }
        if let Some(max_k) = self.max_k {
            params.max_k = max_k;
        }
        if let Some(solution_k) = self.solution_k {
            params.solution_k = solution_k;
        }
        if let Some(max_iters) = self.max_iters {
            params.max_iters = max_iters;
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        params.validate()?;
        Ok(params)
    }
}

impl ElbowToolsArgs {
    pub fn run(&self, writer: impl std::io::Write) -> Result<()> {
        match &self.command {
            ElbowToolsCommand::Evaluate(args) => crate::evaluate::run_evaluate(writer, args),
            ElbowToolsCommand::Schemas(args) => crate::evaluate::show_schemas(writer, args),
        }
    }
}

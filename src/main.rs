use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use softbar_io::{Dataset, ExperimentName, MultiSeriesReader, ResultWriter, SeriesData, TimeSeriesReader};
use softbar_sdtw::{CentroidInit, SdtwCentroidConfig, SeriesBatch, SoftDtwBarycenter};

#[derive(Parser)]
#[command(name = "softbar")]
#[command(about = "Soft-DTW barycenter loss, gradient, and centroid refinement")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the soft-DTW barycenter objective and gradient for one centroid
    Evaluate {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Read the long layout (series_id,step,x0,...) instead of the wide one
        #[arg(long, default_value_t = false)]
        multivariate: bool,

        /// ID of the series used as the centroid
        #[arg(long)]
        centroid_id: String,

        /// Soft-DTW smoothing parameter (> 0)
        #[arg(long, default_value_t = 1.0)]
        gamma: f64,

        /// Comma-separated per-series weights, in dataset order (default: all 1)
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,

        /// Experiment name for the output file (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: Option<String>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Refine a soft-DTW centroid of all series in the dataset
    Centroid {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Read the long layout (series_id,step,x0,...) instead of the wide one
        #[arg(long, default_value_t = false)]
        multivariate: bool,

        /// Soft-DTW smoothing parameter (> 0)
        #[arg(long, default_value_t = 1.0)]
        gamma: f64,

        /// Maximum gradient descent iterations
        #[arg(long, default_value_t = 100)]
        max_iter: usize,

        /// Relative objective change that counts as converged
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,

        /// Initialization strategy: "random" or "mean"
        #[arg(long, default_value = "random")]
        init: String,

        /// Comma-separated per-series weights, in dataset order (default: all 1)
        #[arg(long, value_delimiter = ',')]
        weights: Option<Vec<f64>>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct EvaluateOutput {
    centroid_id: String,
    gamma: f64,
    n_series: usize,
    dim: usize,
    objective: f64,
    gradient: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct CentroidOutput {
    experiment: String,
    n_series: usize,
    dim: usize,
    length: usize,
    objective: f64,
    converged: bool,
    iterations: usize,
    artifact: PathBuf,
}

fn read_dataset(path: &Path, multivariate: bool) -> Result<Dataset> {
    let dataset = if multivariate {
        MultiSeriesReader::new(path).read()
    } else {
        TimeSeriesReader::new(path).read()
    };
    dataset.context("failed to read input CSV")
}

fn parse_init(s: &str) -> Result<CentroidInit> {
    match s {
        "random" => Ok(CentroidInit::RandomSeries),
        "mean" => Ok(CentroidInit::Mean),
        other => anyhow::bail!("unknown init strategy: {other} (expected random or mean)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Evaluate {
            data,
            multivariate,
            centroid_id,
            gamma,
            weights,
            experiment,
            output_dir,
        } => {
            let experiment_name = experiment.map(ExperimentName::new).transpose()?;

            let dataset = read_dataset(&data, multivariate)?;
            let Some(centroid_index) = dataset.position(&centroid_id) else {
                anyhow::bail!("centroid ID {centroid_id:?} not found in {}", data.display());
            };

            let sdtw = SoftDtwBarycenter::new(gamma)?;
            let weights = weights.as_deref();
            let loss = match &dataset.data {
                SeriesData::Univariate(series) => {
                    let views: Vec<_> = series.iter().map(|s| s.as_view()).collect();
                    let batch = SeriesBatch::Univariate {
                        centroid: views[centroid_index],
                        series: &views,
                    };
                    sdtw.evaluate(batch, weights)
                }
                SeriesData::Multivariate(series) => {
                    let views: Vec<_> = series.iter().map(|s| s.as_view()).collect();
                    let batch = SeriesBatch::Multivariate {
                        centroid: views[centroid_index],
                        series: &views,
                    };
                    sdtw.evaluate(batch, weights)
                }
            }
            .context("loss evaluation failed")?;
            info!(objective = loss.objective, "barycenter loss evaluated");

            if let Some(experiment_name) = experiment_name {
                let writer = ResultWriter::new(&output_dir, experiment_name)?;
                writer.write_gradient(
                    &dataset.ids[centroid_index],
                    &dataset.ids,
                    gamma,
                    weights,
                    &loss,
                )?;
            }

            let gradient = &loss.gradient;
            let output = EvaluateOutput {
                centroid_id,
                gamma,
                n_series: dataset.len(),
                dim: gradient.dim(),
                objective: loss.objective,
                gradient: (0..gradient.len()).map(|i| gradient.row(i).to_vec()).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Centroid {
            data,
            multivariate,
            gamma,
            max_iter,
            tol,
            init,
            weights,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let dataset = read_dataset(&data, multivariate)?;

            let config = SdtwCentroidConfig::new(gamma)
                .with_init(parse_init(&init)?)
                .with_max_iter(max_iter)
                .with_tol(tol)
                .with_seed(cli.seed);

            let weights = weights.as_deref();
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let (summary, artifact) = match &dataset.data {
                SeriesData::Univariate(series) => {
                    let views: Vec<_> = series.iter().map(|s| s.as_view()).collect();
                    let result = config
                        .average(&views, weights)
                        .context("centroid refinement failed")?;
                    let artifact = writer.write_centroid(&dataset.ids, gamma, &result)?;
                    let summary = (1, result.centroid.len(), result.objective, result.converged, result.iterations);
                    (summary, artifact)
                }
                SeriesData::Multivariate(series) => {
                    let views: Vec<_> = series.iter().map(|s| s.as_view()).collect();
                    let result = config
                        .average_multivariate(&views, weights)
                        .context("centroid refinement failed")?;
                    let artifact = writer.write_centroid(&dataset.ids, gamma, &result)?;
                    let centroid = &result.centroid;
                    let summary = (centroid.dim(), centroid.len(), result.objective, result.converged, result.iterations);
                    (summary, artifact)
                }
            };
            let (dim, length, objective, converged, iterations) = summary;
            info!(objective, converged, iterations, "centroid refined");

            let output = CentroidOutput {
                experiment,
                n_series: dataset.len(),
                dim,
                length,
                objective,
                converged,
                iterations,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

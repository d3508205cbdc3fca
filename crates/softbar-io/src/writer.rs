//! JSON result writer for centroid and gradient outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use softbar_sdtw::{BarycenterLoss, SdtwCentroidResult, Sequence};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, SeriesId};

/// Writes centroid refinement and loss evaluation results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_centroid.json` and
/// `{experiment}_gradient.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the centroid artifact.
    #[must_use]
    pub fn centroid_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_centroid.json", self.experiment.as_str()))
    }

    /// Path of the gradient artifact.
    #[must_use]
    pub fn gradient_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_gradient.json", self.experiment.as_str()))
    }

    /// Write a refined centroid to `{experiment}_centroid.json`.
    ///
    /// `series_ids` are the members the centroid was refined against.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_centroid<C: Sequence>(
        &self,
        series_ids: &[SeriesId],
        gamma: f64,
        result: &SdtwCentroidResult<C>,
    ) -> Result<PathBuf, IoError> {
        let path = self.centroid_path();
        let centroid = &result.centroid;

        let artifact = CentroidArtifact {
            experiment: self.experiment.as_str(),
            gamma,
            n_series: series_ids.len(),
            series_ids: series_ids.iter().map(SeriesId::as_str).collect(),
            dim: centroid.dim(),
            length: centroid.len(),
            objective: result.objective,
            converged: result.converged,
            iterations: result.iterations,
            centroid: centroid.values().chunks(centroid.dim()).map(<[f64]>::to_vec).collect(),
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "centroid result written");
        Ok(path)
    }

    /// Write a loss evaluation to `{experiment}_gradient.json`.
    ///
    /// `weights` of `None` are recorded as `1.0` per series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::WeightCountMismatch`] | `weights` and `series_ids` differ in length |
    /// | [`IoError::Serialize`] | The artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_gradient(
        &self,
        centroid_id: &SeriesId,
        series_ids: &[SeriesId],
        gamma: f64,
        weights: Option<&[f64]>,
        loss: &BarycenterLoss,
    ) -> Result<PathBuf, IoError> {
        let path = self.gradient_path();
        let gradient = &loss.gradient;

        let weights = match weights {
            Some(w) if w.len() != series_ids.len() => {
                return Err(IoError::WeightCountMismatch {
                    path,
                    weights: w.len(),
                    series: series_ids.len(),
                });
            }
            Some(w) => w.to_vec(),
            None => vec![1.0; series_ids.len()],
        };
        let series: Vec<WeightEntry> = series_ids
            .iter()
            .zip(weights)
            .map(|(id, weight)| WeightEntry {
                series_id: id.as_str(),
                weight,
            })
            .collect();

        let artifact = GradientArtifact {
            experiment: self.experiment.as_str(),
            gamma,
            centroid_id: centroid_id.as_str(),
            series,
            dim: gradient.dim(),
            objective: loss.objective,
            gradient_norm: gradient.norm_squared().sqrt(),
            gradient: (0..gradient.len()).map(|i| gradient.row(i).to_vec()).collect(),
        };

        write_json(&path, &artifact)?;
        info!(path = %path.display(), "gradient result written");
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, artifact: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, &json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct CentroidArtifact<'a> {
    experiment: &'a str,
    gamma: f64,
    n_series: usize,
    series_ids: Vec<&'a str>,
    dim: usize,
    length: usize,
    objective: f64,
    converged: bool,
    iterations: usize,
    centroid: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct GradientArtifact<'a> {
    experiment: &'a str,
    gamma: f64,
    centroid_id: &'a str,
    series: Vec<WeightEntry<'a>>,
    dim: usize,
    objective: f64,
    gradient_norm: f64,
    gradient: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct WeightEntry<'a> {
    series_id: &'a str,
    weight: f64,
}

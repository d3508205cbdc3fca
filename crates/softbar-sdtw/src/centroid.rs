//! Soft-DTW centroid refinement by gradient descent.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::batch::{BarycenterLoss, SoftDtwBarycenter};
use crate::error::CentroidError;
use crate::series::{FromValues, MultiSeries, MultiSeriesView, Sequence, TimeSeries, TimeSeriesView};
use crate::workspace::Workspace;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C: f64 = 1e-4;

/// How the centroid is initialized before refinement.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CentroidInit {
    /// One of the input series, chosen uniformly with the configured seed.
    #[default]
    RandomSeries,
    /// Caller-supplied flat row-major values.
    Given(Vec<f64>),
    /// Element-wise mean of the input series; requires equal lengths.
    Mean,
}

/// Configuration for soft-DTW centroid refinement.
///
/// | Parameter | Default |
/// |---|---|
/// | `init` | [`CentroidInit::RandomSeries`] |
/// | `max_iter` | 100 |
/// | `tol` | 1e-6 (relative objective change) |
/// | `step` | 1.0 (initial line-search step) |
/// | `seed` | 42 |
/// | `max_backtracks` | 30 |
#[derive(Debug, Clone)]
pub struct SdtwCentroidConfig {
    gamma: f64,
    init: CentroidInit,
    max_iter: usize,
    tol: f64,
    step: f64,
    seed: u64,
    max_backtracks: usize,
}

impl SdtwCentroidConfig {
    /// Create a configuration with smoothing parameter `gamma` and default parameters.
    #[must_use]
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            init: CentroidInit::default(),
            max_iter: 100,
            tol: 1e-6,
            step: 1.0,
            seed: 42,
            max_backtracks: 30,
        }
    }

    /// Set the initialization strategy.
    #[must_use]
    pub fn with_init(mut self, init: CentroidInit) -> Self {
        self.init = init;
        self
    }

    /// Set the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the initial line-search step.
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the random seed used by [`CentroidInit::RandomSeries`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set how many times the step may be halved per iteration.
    #[must_use]
    pub fn with_max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.max_backtracks = max_backtracks;
        self
    }

    /// Return the smoothing parameter.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Return the initialization strategy.
    #[must_use]
    pub fn init(&self) -> &CentroidInit {
        &self.init
    }

    /// Return the maximum number of iterations.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the relative convergence tolerance.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Refine a univariate centroid of `series`.
    ///
    /// Each iteration evaluates the weighted barycenter loss and moves the
    /// centroid against its gradient, halving the step until the Armijo
    /// condition `f(c - t g) <= f(c) - 1e-4 t |g|^2` holds and doubling it
    /// for the next iteration. Refinement stops when the relative improvement
    /// drops to `tol`, the gradient vanishes, or no step up to
    /// `max_backtracks` halvings decreases the objective.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CentroidError::EmptyCluster`] | `series` is empty |
    /// | [`CentroidError::UnequalLengths`] | [`CentroidInit::Mean`] with series of different lengths |
    /// | [`CentroidError::InitMismatch`] | [`CentroidInit::Given`] values are not whole points |
    /// | [`CentroidError::Sdtw`] | Invalid `gamma`, weights, or initial values |
    #[instrument(skip(self, series, weights), fields(n = series.len(), gamma = self.gamma, max_iter = self.max_iter))]
    pub fn average(
        &self,
        series: &[TimeSeriesView<'_>],
        weights: Option<&[f64]>,
    ) -> Result<SdtwCentroidResult<TimeSeries>, CentroidError> {
        self.refine(series, weights)
    }

    /// Refine a multivariate centroid of `series`.
    ///
    /// # Errors
    ///
    /// Same as [`SdtwCentroidConfig::average`].
    #[instrument(skip(self, series, weights), fields(n = series.len(), gamma = self.gamma, max_iter = self.max_iter))]
    pub fn average_multivariate(
        &self,
        series: &[MultiSeriesView<'_>],
        weights: Option<&[f64]>,
    ) -> Result<SdtwCentroidResult<MultiSeries>, CentroidError> {
        self.refine(series, weights)
    }

    fn refine<C, S>(
        &self,
        series: &[S],
        weights: Option<&[f64]>,
    ) -> Result<SdtwCentroidResult<C>, CentroidError>
    where
        C: FromValues,
        S: Sequence<Point = C::Point>,
    {
        if series.is_empty() {
            return Err(CentroidError::EmptyCluster);
        }
        let sdtw = SoftDtwBarycenter::new(self.gamma)?;
        let dim = series[0].dim();

        let mut centroid = C::from_values(self.initial_values(series)?, dim)?;
        let n_max = series.iter().map(Sequence::len).max().unwrap_or(0);
        let mut ws = Workspace::new(centroid.len(), n_max);
        let mut loss = sdtw.loss_with(&centroid, series, weights, &mut ws)?;

        let mut step = self.step;
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let grad_sq = loss.gradient.norm_squared();
            if grad_sq == 0.0 {
                converged = true;
                break;
            }

            let Some((next, next_loss, t)) =
                self.line_search(&sdtw, &centroid, &loss, grad_sq, step, series, weights, &mut ws)?
            else {
                debug!(iteration = iterations, "line search exhausted");
                converged = true;
                break;
            };

            let improvement = loss.objective - next_loss.objective;
            let scale = loss.objective.abs().max(1.0);
            centroid = next;
            loss = next_loss;
            step = t * 2.0;
            debug!(iteration = iterations, objective = loss.objective, step = t, "soft-DTW centroid iteration complete");

            if improvement <= self.tol * scale {
                converged = true;
                break;
            }
        }

        Ok(SdtwCentroidResult {
            centroid,
            objective: loss.objective,
            converged,
            iterations,
        })
    }

    /// Backtrack from `step` until the Armijo condition holds.
    ///
    /// Returns `None` once `max_backtracks` halvings have all failed.
    #[allow(clippy::too_many_arguments)]
    fn line_search<C, S>(
        &self,
        sdtw: &SoftDtwBarycenter,
        centroid: &C,
        loss: &BarycenterLoss,
        grad_sq: f64,
        step: f64,
        series: &[S],
        weights: Option<&[f64]>,
        ws: &mut Workspace,
    ) -> Result<Option<(C, BarycenterLoss, f64)>, CentroidError>
    where
        C: FromValues,
        S: Sequence<Point = C::Point>,
    {
        let mut t = step;
        for _ in 0..=self.max_backtracks {
            let candidate: Vec<f64> = centroid
                .values()
                .iter()
                .zip(loss.gradient.as_slice())
                .map(|(c, g)| c - t * g)
                .collect();
            if candidate.iter().all(|v| v.is_finite()) {
                let next = C::from_values(candidate, centroid.dim())?;
                let next_loss = sdtw.loss_with(&next, series, weights, ws)?;
                if next_loss.objective <= loss.objective - ARMIJO_C * t * grad_sq {
                    return Ok(Some((next, next_loss, t)));
                }
            }
            t *= 0.5;
        }
        Ok(None)
    }

    fn initial_values<S: Sequence>(&self, series: &[S]) -> Result<Vec<f64>, CentroidError> {
        let dim = series[0].dim();
        match &self.init {
            CentroidInit::RandomSeries => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                let pick = rng.gen_range(0..series.len());
                debug!(series = pick, "centroid initialized from input series");
                Ok(series[pick].values().to_vec())
            }
            CentroidInit::Given(values) => {
                if values.len() % dim != 0 {
                    return Err(CentroidError::InitMismatch {
                        dim,
                        len: values.len(),
                    });
                }
                Ok(values.clone())
            }
            CentroidInit::Mean => {
                let len = series[0].len();
                if let Some((index, s)) = series.iter().enumerate().find(|(_, s)| s.len() != len) {
                    return Err(CentroidError::UnequalLengths {
                        index,
                        expected: len,
                        found: s.len(),
                    });
                }
                let mut mean = vec![0.0; len * dim];
                for s in series {
                    for (m, &v) in mean.iter_mut().zip(s.values()) {
                        *m += v;
                    }
                }
                let n = series.len() as f64;
                for m in &mut mean {
                    *m /= n;
                }
                Ok(mean)
            }
        }
    }
}

/// Result of a soft-DTW centroid refinement.
#[derive(Debug, Clone)]
pub struct SdtwCentroidResult<C> {
    /// The refined centroid.
    pub centroid: C,
    /// Barycenter objective at the returned centroid.
    pub objective: f64,
    /// Whether refinement stopped before `max_iter`.
    pub converged: bool,
    /// Number of iterations performed.
    pub iterations: usize,
}

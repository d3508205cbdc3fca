//! Point-kind dispatch for batch evaluation.

use std::fmt;

use crate::batch::{BarycenterLoss, SoftDtwBarycenter};
use crate::error::SdtwError;
use crate::forward::ForwardAligner;
use crate::series::{MultiSeriesView, Sequence, TimeSeriesView};
use crate::workspace::Workspace;

/// Whether points are scalars or fixed-length vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointMode {
    /// Scalar points.
    Univariate,
    /// Fixed-length vector points.
    Multivariate,
}

impl fmt::Display for PointMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Univariate => f.write_str("univariate"),
            Self::Multivariate => f.write_str("multivariate"),
        }
    }
}

/// A centroid and the series it is evaluated against, tagged by point kind.
#[derive(Debug, Clone, Copy)]
pub enum SeriesBatch<'a> {
    /// Scalar points.
    Univariate {
        /// The candidate centroid.
        centroid: TimeSeriesView<'a>,
        /// Series in evaluation order.
        series: &'a [TimeSeriesView<'a>],
    },
    /// Vector points; every series must share the centroid's dimension.
    Multivariate {
        /// The candidate centroid.
        centroid: MultiSeriesView<'a>,
        /// Series in evaluation order.
        series: &'a [MultiSeriesView<'a>],
    },
}

impl SeriesBatch<'_> {
    /// Return the point kind of this batch.
    #[must_use]
    pub fn mode(&self) -> PointMode {
        match self {
            Self::Univariate { .. } => PointMode::Univariate,
            Self::Multivariate { .. } => PointMode::Multivariate,
        }
    }

    /// Number of centroid points.
    #[must_use]
    pub fn centroid_len(&self) -> usize {
        match self {
            Self::Univariate { centroid, .. } => centroid.len(),
            Self::Multivariate { centroid, .. } => centroid.len(),
        }
    }

    /// Number of series in the batch.
    #[must_use]
    pub fn n_series(&self) -> usize {
        match self {
            Self::Univariate { series, .. } => series.len(),
            Self::Multivariate { series, .. } => series.len(),
        }
    }

    /// Length of the longest series, zero for an empty batch.
    #[must_use]
    pub fn max_series_len(&self) -> usize {
        let longest = match self {
            Self::Univariate { series, .. } => series.iter().map(Sequence::len).max(),
            Self::Multivariate { series, .. } => series.iter().map(Sequence::len).max(),
        };
        longest.unwrap_or(0)
    }

    /// A workspace large enough for this batch.
    #[must_use]
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.centroid_len(), self.max_series_len())
    }
}

impl<A: ForwardAligner> SoftDtwBarycenter<A> {
    /// Evaluate a batch of either point kind, allocating scratch buffers.
    ///
    /// # Errors
    ///
    /// Same as [`SoftDtwBarycenter::loss_with`].
    pub fn evaluate(
        &self,
        batch: SeriesBatch<'_>,
        weights: Option<&[f64]>,
    ) -> Result<BarycenterLoss, SdtwError> {
        let mut ws = batch.workspace();
        self.evaluate_with(batch, weights, &mut ws)
    }

    /// Evaluate a batch of either point kind with caller-owned scratch buffers.
    ///
    /// # Errors
    ///
    /// Same as [`SoftDtwBarycenter::loss_with`].
    pub fn evaluate_with(
        &self,
        batch: SeriesBatch<'_>,
        weights: Option<&[f64]>,
        ws: &mut Workspace,
    ) -> Result<BarycenterLoss, SdtwError> {
        match batch {
            SeriesBatch::Univariate { centroid, series } => {
                self.loss_with(&centroid, series, weights, ws)
            }
            SeriesBatch::Multivariate { centroid, series } => {
                self.loss_with(&centroid, series, weights, ws)
            }
        }
    }
}

//! Weighted soft-DTW barycenter objective and gradient over a batch of series.

use tracing::{debug, instrument, trace};

use crate::backward::backward_pass;
use crate::error::SdtwError;
use crate::forward::{ForwardAligner, SoftDtw, check_gamma};
use crate::gradient::{Gradient, GradientAccumulator};
use crate::series::Sequence;
use crate::workspace::Workspace;

/// Objective value and centroid gradient of one batch evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct BarycenterLoss {
    /// `sum_k weight_k * sdtw(centroid, series_k)`.
    pub objective: f64,
    /// Gradient of `objective` with respect to every centroid coordinate.
    pub gradient: Gradient,
}

/// Evaluates the soft-DTW barycenter loss for a fixed smoothing parameter.
///
/// The centroid always plays the role of the first sequence and each series
/// the second, so the gradient rows follow the centroid's time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftDtwBarycenter<A = SoftDtw> {
    gamma: f64,
    aligner: A,
}

impl SoftDtwBarycenter {
    /// Create an evaluator with the built-in [`SoftDtw`] forward pass.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::InvalidGamma`] | `gamma` is not positive and finite |
    pub fn new(gamma: f64) -> Result<Self, SdtwError> {
        check_gamma(gamma)?;
        Ok(Self {
            gamma,
            aligner: SoftDtw,
        })
    }
}

impl<A: ForwardAligner> SoftDtwBarycenter<A> {
    /// Replace the forward pass used to build the cost table.
    #[must_use]
    pub fn with_aligner<B: ForwardAligner>(self, aligner: B) -> SoftDtwBarycenter<B> {
        SoftDtwBarycenter {
            gamma: self.gamma,
            aligner,
        }
    }

    /// Return the smoothing parameter.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Evaluate the loss, allocating a workspace sized for this batch.
    ///
    /// `weights` defaults to `1.0` per series when `None`.
    ///
    /// # Errors
    ///
    /// Same as [`SoftDtwBarycenter::loss_with`], except that the workspace is
    /// always large enough.
    pub fn loss<C, S>(
        &self,
        centroid: &C,
        series: &[S],
        weights: Option<&[f64]>,
    ) -> Result<BarycenterLoss, SdtwError>
    where
        C: Sequence + ?Sized,
        S: Sequence<Point = C::Point>,
    {
        let n_max = series.iter().map(Sequence::len).max().unwrap_or(0);
        let mut ws = Workspace::new(centroid.len(), n_max);
        self.loss_with(centroid, series, weights, &mut ws)
    }

    /// Evaluate the loss using caller-owned scratch buffers.
    ///
    /// Series are processed in order; `ws` is reused for each of them and
    /// re-seeded for every series' own length, so the result does not depend
    /// on what a previous call left in it.
    ///
    /// # Errors
    ///
    /// All checks run before any buffer is written.
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::EmptyBatch`] | `series` is empty |
    /// | [`SdtwError::WeightCountMismatch`] | `weights.len() != series.len()` |
    /// | [`SdtwError::NegativeWeight`] | A weight is negative or non-finite |
    /// | [`SdtwError::DimensionMismatch`] | A series' point dimension differs from the centroid's |
    /// | [`SdtwError::WorkspaceTooSmall`] | `ws` cannot hold the centroid or the longest series |
    #[instrument(skip_all, fields(m = centroid.len(), n_series = series.len(), gamma = self.gamma))]
    pub fn loss_with<C, S>(
        &self,
        centroid: &C,
        series: &[S],
        weights: Option<&[f64]>,
        ws: &mut Workspace,
    ) -> Result<BarycenterLoss, SdtwError>
    where
        C: Sequence + ?Sized,
        S: Sequence<Point = C::Point>,
    {
        self.validate(centroid, series, weights, ws)?;

        let m = centroid.len();
        let mut acc = GradientAccumulator::new(m, centroid.dim());
        let mut objective = 0.0;

        for (k, s) in series.iter().enumerate() {
            let weight = weights.map_or(1.0, |w| w[k]);
            let n = s.len();
            let distance = self
                .aligner
                .align(centroid, s, self.gamma, &mut ws.cost, &mut ws.dist);
            objective += weight * distance;

            backward_pass(ws, m, n, self.gamma, |i, row| {
                acc.add_row(i, row, centroid, s, weight);
            })?;
            trace!(series = k, n, distance, weight, "series folded into barycenter loss");
        }

        debug!(objective, "barycenter loss evaluated");
        Ok(BarycenterLoss {
            objective,
            gradient: acc.finish(),
        })
    }

    fn validate<C, S>(
        &self,
        centroid: &C,
        series: &[S],
        weights: Option<&[f64]>,
        ws: &Workspace,
    ) -> Result<(), SdtwError>
    where
        C: Sequence + ?Sized,
        S: Sequence<Point = C::Point>,
    {
        if series.is_empty() {
            return Err(SdtwError::EmptyBatch);
        }
        if let Some(w) = weights {
            if w.len() != series.len() {
                return Err(SdtwError::WeightCountMismatch {
                    weights: w.len(),
                    series: series.len(),
                });
            }
            if let Some(index) = w.iter().position(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(SdtwError::NegativeWeight {
                    index,
                    weight: w[index],
                });
            }
        }
        let dim = centroid.dim();
        if let Some((k, s)) = series.iter().enumerate().find(|(_, s)| s.dim() != dim) {
            return Err(SdtwError::DimensionMismatch {
                series: k,
                expected: dim,
                found: s.dim(),
            });
        }
        let n_max = series.iter().map(Sequence::len).max().unwrap_or(0);
        ws.check(centroid.len(), n_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::soft_dtw;
    use crate::series::{MultiSeries, TimeSeries, TimeSeriesView};

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn rejects_invalid_gamma() {
        assert!(matches!(SoftDtwBarycenter::new(0.0), Err(SdtwError::InvalidGamma(_))));
        assert!(matches!(
            SoftDtwBarycenter::new(f64::INFINITY),
            Err(SdtwError::InvalidGamma(_))
        ));
    }

    #[test]
    fn objective_is_weighted_sum_of_distances() {
        let c = ts(&[0.0, 1.0, 2.0]);
        let series = [ts(&[0.0, 2.0]), ts(&[1.0, 1.0, 3.0, 2.0])];
        let weights = [0.25, 2.0];
        let sdtw = SoftDtwBarycenter::new(0.5).unwrap();
        let loss = sdtw.loss(&c, &series, Some(&weights[..])).unwrap();

        let expected = 0.25 * soft_dtw(&c, &series[0], 0.5).unwrap()
            + 2.0 * soft_dtw(&c, &series[1], 0.5).unwrap();
        assert!((loss.objective - expected).abs() < 1e-12);
        assert_eq!(loss.gradient.len(), 3);
        assert_eq!(loss.gradient.dim(), 1);
    }

    #[test]
    fn missing_weights_mean_unit_weights() {
        let c = ts(&[0.0, 1.0]);
        let series = [ts(&[1.0, 0.0]), ts(&[2.0])];
        let sdtw = SoftDtwBarycenter::new(1.0).unwrap();
        let a = sdtw.loss(&c, &series, None).unwrap();
        let b = sdtw.loss(&c, &series, Some(&[1.0, 1.0][..])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_weight_series_contributes_nothing() {
        let c = ts(&[0.0, 1.0]);
        let series = [ts(&[1.0, 0.0]), ts(&[7.0, 9.0, 8.0])];
        let sdtw = SoftDtwBarycenter::new(1.0).unwrap();
        let both = sdtw.loss(&c, &series, Some(&[1.0, 0.0][..])).unwrap();
        let first = sdtw.loss(&c, &series[..1], None).unwrap();
        assert!((both.objective - first.objective).abs() < 1e-12);
        for (a, b) in both.gradient.as_slice().iter().zip(first.gradient.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn validation_errors() {
        let c = ts(&[0.0, 1.0]);
        let series = [ts(&[1.0, 0.0]), ts(&[2.0, 3.0, 4.0])];
        let sdtw = SoftDtwBarycenter::new(1.0).unwrap();

        let empty: [TimeSeries; 0] = [];
        assert!(matches!(sdtw.loss(&c, &empty, None), Err(SdtwError::EmptyBatch)));
        assert!(matches!(
            sdtw.loss(&c, &series, Some(&[1.0][..])),
            Err(SdtwError::WeightCountMismatch { weights: 1, series: 2 })
        ));
        assert!(matches!(
            sdtw.loss(&c, &series, Some(&[1.0, -0.5][..])),
            Err(SdtwError::NegativeWeight { index: 1, .. })
        ));
        assert!(matches!(
            sdtw.loss(&c, &series, Some(&[f64::NAN, 1.0][..])),
            Err(SdtwError::NegativeWeight { index: 0, .. })
        ));

        let mut small = Workspace::new(2, 2);
        assert!(matches!(
            sdtw.loss_with(&c, &series, None, &mut small),
            Err(SdtwError::WorkspaceTooSmall { need_n: 3, .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_reported_with_series_index() {
        let c = MultiSeries::new(vec![0.0, 0.0, 1.0, 1.0], 2).unwrap();
        let series = [
            MultiSeries::new(vec![0.0, 1.0], 2).unwrap(),
            MultiSeries::new(vec![0.0, 1.0, 2.0], 3).unwrap(),
        ];
        let sdtw = SoftDtwBarycenter::new(1.0).unwrap();
        assert!(matches!(
            sdtw.loss(&c, &series, None),
            Err(SdtwError::DimensionMismatch { series: 1, expected: 2, found: 3 })
        ));
    }

    #[test]
    fn owned_centroid_with_borrowed_series() {
        let c = ts(&[1.0, 2.0]);
        let owned = [ts(&[1.0, 3.0]), ts(&[0.0])];
        let views: Vec<TimeSeriesView<'_>> = owned.iter().map(TimeSeries::as_view).collect();
        let sdtw = SoftDtwBarycenter::new(0.3).unwrap();
        let a = sdtw.loss(&c, &owned, None).unwrap();
        let b = sdtw.loss(&c.as_view(), &views, None).unwrap();
        assert_eq!(a, b);
    }

    /// A forward pass that defers to [`SoftDtw`] and counts invocations.
    struct Counting<'a>(&'a std::cell::Cell<usize>);

    impl ForwardAligner for Counting<'_> {
        fn align<X, Y>(
            &self,
            x: &X,
            y: &Y,
            gamma: f64,
            cost: &mut crate::table::Table,
            dist: &mut crate::table::Table,
        ) -> f64
        where
            X: Sequence + ?Sized,
            Y: Sequence<Point = X::Point> + ?Sized,
        {
            self.0.set(self.0.get() + 1);
            SoftDtw.align(x, y, gamma, cost, dist)
        }
    }

    #[test]
    fn custom_aligner_is_called_once_per_series() {
        let calls = std::cell::Cell::new(0);
        let c = ts(&[1.0, 2.0]);
        let series = [ts(&[1.0]), ts(&[2.0, 2.0]), ts(&[0.0, 1.0, 2.0])];
        let sdtw = SoftDtwBarycenter::new(0.5)
            .unwrap()
            .with_aligner(Counting(&calls));
        let counted = sdtw.loss(&c, &series, None).unwrap();
        assert_eq!(calls.get(), 3);

        let plain = SoftDtwBarycenter::new(0.5).unwrap().loss(&c, &series, None).unwrap();
        assert_eq!(counted, plain);
    }
}

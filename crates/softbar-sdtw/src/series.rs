//! Univariate and multivariate time series with validation guarantees.

use std::ops::Index;

use crate::error::SdtwError;
use crate::point::Point;

/// Read access to an ordered sequence of points.
///
/// Implemented by the owned and borrowed series types of both point kinds.
/// Every sequence exposes its data as one flat, row-major slice of
/// `len() * dim()` values.
pub trait Sequence {
    /// Point type: `f64` for univariate, `[f64]` for multivariate series.
    type Point: Point + ?Sized;

    /// Number of time steps.
    fn len(&self) -> usize;

    /// Number of coordinates per time step.
    fn dim(&self) -> usize;

    /// Borrow the point at `index`.
    fn point(&self, index: usize) -> &Self::Point;

    /// Flat row-major values.
    fn values(&self) -> &[f64];

    /// Return true if the sequence has no time steps.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An owned sequence that can be rebuilt from flat values, used for centroids.
pub trait FromValues: Sequence + Sized {
    /// Build a validated sequence of points of dimension `dim` from flat values.
    ///
    /// # Errors
    ///
    /// Propagates the validation errors of the concrete constructor.
    fn from_values(values: Vec<f64>, dim: usize) -> Result<Self, SdtwError>;
}

fn validate_values(values: &[f64]) -> Result<(), SdtwError> {
    if values.is_empty() {
        return Err(SdtwError::EmptySeries);
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SdtwError::NonFiniteValue { index });
    }
    Ok(())
}

fn validate_shape(len: usize, dim: usize) -> Result<(), SdtwError> {
    if dim == 0 {
        return Err(SdtwError::ZeroDimension);
    }
    if len % dim != 0 {
        return Err(SdtwError::RaggedValues { len, dim });
    }
    Ok(())
}

// ── Univariate ────────────────────────────────────────────────────────────────

/// Owned, validated univariate time series. Guaranteed non-empty with all finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// Create a new time series, validating that it is non-empty and all values are finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::EmptySeries`] | `values` is empty |
    /// | [`SdtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, SdtwError> {
        validate_values(&values)?;
        Ok(Self(values))
    }

    /// Borrow this series as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView(&self.0)
    }

    /// Return the number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for instances built through [`TimeSeries::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the inner vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = SdtwError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl Sequence for TimeSeries {
    type Point = f64;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn dim(&self) -> usize {
        1
    }

    fn point(&self, index: usize) -> &f64 {
        &self.0[index]
    }

    fn values(&self) -> &[f64] {
        &self.0
    }
}

impl FromValues for TimeSeries {
    fn from_values(values: Vec<f64>, dim: usize) -> Result<Self, SdtwError> {
        if dim != 1 {
            return Err(SdtwError::RaggedValues { len: values.len(), dim });
        }
        Self::new(values)
    }
}

/// Borrowed, validated view into a univariate time series.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a>(&'a [f64]);

impl<'a> TimeSeriesView<'a> {
    /// Create a new view, validating that the slice is non-empty and all values are finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::EmptySeries`] | `slice` is empty |
    /// | [`SdtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(slice: &'a [f64]) -> Result<Self, SdtwError> {
        validate_values(slice)?;
        Ok(Self(slice))
    }

    /// Return the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.0
    }

    /// Return the number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for views built through [`TimeSeriesView::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<usize> for TimeSeriesView<'_> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AsRef<[f64]> for TimeSeriesView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.0
    }
}

impl Sequence for TimeSeriesView<'_> {
    type Point = f64;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn dim(&self) -> usize {
        1
    }

    fn point(&self, index: usize) -> &f64 {
        &self.0[index]
    }

    fn values(&self) -> &[f64] {
        self.0
    }
}

// ── Multivariate ──────────────────────────────────────────────────────────────

/// Owned, validated multivariate time series stored row-major (`len x dim`).
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSeries {
    values: Vec<f64>,
    dim: usize,
}

impl MultiSeries {
    /// Create a multivariate series from flat row-major values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::ZeroDimension`] | `dim == 0` |
    /// | [`SdtwError::RaggedValues`] | `values.len()` is not a multiple of `dim` |
    /// | [`SdtwError::EmptySeries`] | `values` is empty |
    /// | [`SdtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>, dim: usize) -> Result<Self, SdtwError> {
        validate_shape(values.len(), dim)?;
        validate_values(&values)?;
        Ok(Self { values, dim })
    }

    /// Create a multivariate series from one vector per time step.
    ///
    /// # Errors
    ///
    /// Same as [`MultiSeries::new`]; rows of differing length yield
    /// [`SdtwError::RaggedValues`].
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SdtwError> {
        let dim = rows.first().map_or(0, Vec::len);
        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        if rows.iter().any(|r| r.len() != dim) {
            return Err(SdtwError::RaggedValues { len: values.len(), dim });
        }
        Self::new(values, dim)
    }

    /// Borrow this series as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> MultiSeriesView<'_> {
        MultiSeriesView {
            values: &self.values,
            dim: self.dim,
        }
    }

    /// Return the number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Always `false` for instances built through [`MultiSeries::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the point dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Iterate over time steps as coordinate slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.dim)
    }

    /// Consume and return the flat row-major values.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl Sequence for MultiSeries {
    type Point = [f64];

    fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn point(&self, index: usize) -> &[f64] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    fn values(&self) -> &[f64] {
        &self.values
    }
}

impl FromValues for MultiSeries {
    fn from_values(values: Vec<f64>, dim: usize) -> Result<Self, SdtwError> {
        Self::new(values, dim)
    }
}

/// Borrowed, validated view into a multivariate time series.
#[derive(Debug, Clone, Copy)]
pub struct MultiSeriesView<'a> {
    values: &'a [f64],
    dim: usize,
}

impl<'a> MultiSeriesView<'a> {
    /// Create a view over flat row-major values.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MultiSeries::new`].
    pub fn new(values: &'a [f64], dim: usize) -> Result<Self, SdtwError> {
        validate_shape(values.len(), dim)?;
        validate_values(values)?;
        Ok(Self { values, dim })
    }

    /// Return the flat row-major values.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }

    /// Return the number of time steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Always `false` for views built through [`MultiSeriesView::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the point dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl Sequence for MultiSeriesView<'_> {
    type Point = [f64];

    fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn point(&self, index: usize) -> &[f64] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    fn values(&self) -> &[f64] {
        self.values
    }
}

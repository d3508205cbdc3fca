//! Centroid gradient storage and the per-row gradient accumulator.

use crate::point::Point;
use crate::series::Sequence;

/// Gradient of the barycenter objective, shaped like the centroid (`len x dim`).
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    dim: usize,
    values: Vec<f64>,
}

impl Gradient {
    /// A zero gradient for a centroid of `len` points of dimension `dim`.
    #[must_use]
    pub fn zeros(len: usize, dim: usize) -> Self {
        Self {
            dim,
            values: vec![0.0; len * dim],
        }
    }

    /// Number of centroid points.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.values.len() / self.dim }
    }

    /// Return true if the gradient covers no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of coordinates per point.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Partial derivatives for centroid point `i` (0-based).
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Flat row-major partial derivatives.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Squared Euclidean norm over every coordinate.
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|g| g * g).sum()
    }

    /// Consume and return the flat row-major values.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

/// Folds responsibility rows into a [`Gradient`] as the backward pass produces them.
#[derive(Debug, Clone)]
pub struct GradientAccumulator {
    gradient: Gradient,
    partial: Vec<f64>,
}

impl GradientAccumulator {
    /// Start from a zero gradient for a centroid of `len` points of dimension `dim`.
    #[must_use]
    pub fn new(len: usize, dim: usize) -> Self {
        Self {
            gradient: Gradient::zeros(len, dim),
            partial: vec![0.0; dim],
        }
    }

    /// Add the contribution of responsibility row `i` (1-based) for one series.
    ///
    /// `gradient[i-1] += weight * sum_j E(i, j) * 2 * (x_{i-1} - y_{j-1})`,
    /// with `row[j]` holding `E(i, j)` for `1 <= j <= series.len()`.
    pub fn add_row<C, S>(&mut self, i: usize, row: &[f64], centroid: &C, series: &S, weight: f64)
    where
        C: Sequence + ?Sized,
        S: Sequence<Point = C::Point> + ?Sized,
    {
        let x = centroid.point(i - 1);
        self.partial.fill(0.0);
        for (j, &e) in row[1..=series.len()].iter().enumerate() {
            x.add_scaled_gradient(series.point(j), e, &mut self.partial);
        }

        let dim = self.gradient.dim;
        let slot = &mut self.gradient.values[(i - 1) * dim..i * dim];
        for (g, p) in slot.iter_mut().zip(&self.partial) {
            *g += weight * p;
        }
    }

    /// Borrow the gradient accumulated so far.
    #[must_use]
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Finish accumulation and return the gradient.
    #[must_use]
    pub fn finish(self) -> Gradient {
        self.gradient
    }
}

//! Point abstraction shared by the univariate and multivariate code paths.

/// A single observation of a time series: a scalar or a fixed-length vector.
///
/// The soft-DTW recurrences are written once against this trait and
/// monomorphized for `f64` and `[f64]`.
pub trait Point {
    /// Number of coordinates in this point.
    fn dim(&self) -> usize;

    /// Squared Euclidean distance between `self` and `other`.
    fn squared_distance(&self, other: &Self) -> f64;

    /// Add `scale * 2 * (self - other)` to `slot`, coordinate by coordinate.
    ///
    /// This is the derivative of [`Point::squared_distance`] with respect to
    /// `self`, scaled. `slot` must have length [`Point::dim`].
    fn add_scaled_gradient(&self, other: &Self, scale: f64, slot: &mut [f64]);
}

impl Point for f64 {
    #[inline]
    fn dim(&self) -> usize {
        1
    }

    #[inline]
    fn squared_distance(&self, other: &Self) -> f64 {
        let d = self - other;
        d * d
    }

    #[inline]
    fn add_scaled_gradient(&self, other: &Self, scale: f64, slot: &mut [f64]) {
        slot[0] += scale * 2.0 * (self - other);
    }
}

impl Point for [f64] {
    #[inline]
    fn dim(&self) -> usize {
        self.len()
    }

    #[inline]
    fn squared_distance(&self, other: &Self) -> f64 {
        debug_assert_eq!(self.len(), other.len());
        self.iter()
            .zip(other)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum()
    }

    #[inline]
    fn add_scaled_gradient(&self, other: &Self, scale: f64, slot: &mut [f64]) {
        debug_assert_eq!(self.len(), slot.len());
        for ((g, a), b) in slot.iter_mut().zip(self).zip(other) {
            *g += scale * 2.0 * (a - b);
        }
    }
}

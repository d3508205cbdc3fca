//! Forward soft-DTW pass: the cumulative soft alignment cost table.
//!
//! For a first sequence `x` of length `m` and a second sequence `y` of length `n`:
//!
//! ```text
//! D(i, j) = |x_i - y_j|^2                       0 <= i < m, 0 <= j < n
//! R(0, 0) = 0,  R(i, 0) = R(0, j) = +inf        i, j >= 1
//! R(i, j) = D(i-1, j-1) + softmin_g(R(i-1, j-1), R(i-1, j), R(i, j-1))
//! softmin_g(a, b, c) = -g log(exp(-a/g) + exp(-b/g) + exp(-c/g))
//! ```
//!
//! and the soft-DTW value is `R(m, n)`.

use crate::error::SdtwError;
use crate::point::Point;
use crate::series::Sequence;
use crate::table::Table;

/// Produces the cost and distance tables consumed by the backward pass.
///
/// Implementations must fill `R(0..=m, 0..=n)` of `cost` and `D(0..m, 0..n)` of
/// `dist` following the conventions in the module docs, and return `R(m, n)`.
/// Tables are at least `(m+2) x (n+2)` and `(m+1) x (n+1)`; callers check
/// this with [`crate::Workspace::check`] first.
pub trait ForwardAligner {
    /// Align `x` (first sequence) against `y` (second sequence).
    fn align<X, Y>(&self, x: &X, y: &Y, gamma: f64, cost: &mut Table, dist: &mut Table) -> f64
    where
        X: Sequence + ?Sized,
        Y: Sequence<Point = X::Point> + ?Sized;
}

/// Log-domain stabilized soft-DTW with squared Euclidean point distance.
///
/// # Panics
///
/// [`ForwardAligner::align`] panics before writing anything if `cost` or
/// `dist` is too small for the pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftDtw;

impl ForwardAligner for SoftDtw {
    fn align<X, Y>(&self, x: &X, y: &Y, gamma: f64, cost: &mut Table, dist: &mut Table) -> f64
    where
        X: Sequence + ?Sized,
        Y: Sequence<Point = X::Point> + ?Sized,
    {
        let m = x.len();
        let n = y.len();
        assert!(
            cost.rows() >= m + 2 && cost.cols() >= n + 2,
            "cost table {}x{} too small for a {m}x{n} alignment",
            cost.rows(),
            cost.cols()
        );
        assert!(
            dist.rows() >= m + 1 && dist.cols() >= n + 1,
            "distance table {}x{} too small for a {m}x{n} alignment",
            dist.rows(),
            dist.cols()
        );

        for i in 0..m {
            let xi = x.point(i);
            for j in 0..n {
                dist[(i, j)] = xi.squared_distance(y.point(j));
            }
        }

        for i in 0..=m {
            cost[(i, 0)] = f64::INFINITY;
        }
        for j in 0..=n {
            cost[(0, j)] = f64::INFINITY;
        }
        cost[(0, 0)] = 0.0;

        for i in 1..=m {
            for j in 1..=n {
                let r = softmin3(
                    gamma,
                    cost[(i - 1, j - 1)],
                    cost[(i - 1, j)],
                    cost[(i, j - 1)],
                );
                cost[(i, j)] = dist[(i - 1, j - 1)] + r;
            }
        }
        cost[(m, n)]
    }
}

/// `-g log(exp(-a/g) + exp(-b/g) + exp(-c/g))` via log-sum-exp.
fn softmin3(gamma: f64, a: f64, b: f64, c: f64) -> f64 {
    let xa = -a / gamma;
    let xb = -b / gamma;
    let xc = -c / gamma;
    let max = xa.max(xb).max(xc);
    if !max.is_finite() {
        return f64::INFINITY;
    }
    let s = (xa - max).exp() + (xb - max).exp() + (xc - max).exp();
    -gamma * (max + s.ln())
}

pub(crate) fn check_gamma(gamma: f64) -> Result<(), SdtwError> {
    if gamma > 0.0 && gamma.is_finite() {
        Ok(())
    } else {
        Err(SdtwError::InvalidGamma(gamma))
    }
}

/// Soft-DTW value between two sequences of the same point kind.
///
/// Not a metric: the softmin over alignment paths lies below the cheapest
/// path cost, so the value can be slightly negative even for identical inputs.
/// Allocates its own tables; use [`crate::SoftDtwBarycenter`] with a
/// [`crate::Workspace`] when evaluating many pairs.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SdtwError::InvalidGamma`] | `gamma` is not positive and finite |
/// | [`SdtwError::DimensionMismatch`] | `x` and `y` have different point dimensions |
pub fn soft_dtw<X, Y>(x: &X, y: &Y, gamma: f64) -> Result<f64, SdtwError>
where
    X: Sequence + ?Sized,
    Y: Sequence<Point = X::Point> + ?Sized,
{
    check_gamma(gamma)?;
    if x.dim() != y.dim() {
        return Err(SdtwError::DimensionMismatch {
            series: 0,
            expected: x.dim(),
            found: y.dim(),
        });
    }
    let (m, n) = (x.len(), y.len());
    let mut cost = Table::new(m + 2, n + 2, 0.0);
    let mut dist = Table::new(m + 1, n + 1, 0.0);
    Ok(SoftDtw.align(x, y, gamma, &mut cost, &mut dist))
}

/// Soft-DTW divergence `sdtw(x, y) - (sdtw(x, x) + sdtw(y, y)) / 2`.
///
/// Non-negative and zero on identical inputs, unlike the raw soft-DTW value.
///
/// # Errors
///
/// Same as [`soft_dtw`].
pub fn soft_dtw_divergence<X, Y>(x: &X, y: &Y, gamma: f64) -> Result<f64, SdtwError>
where
    X: Sequence + ?Sized,
    Y: Sequence<Point = X::Point> + ?Sized,
{
    let xy = soft_dtw(x, y, gamma)?;
    let xx = soft_dtw(x, x, gamma)?;
    let yy = soft_dtw(y, y, gamma)?;
    Ok(xy - 0.5 * xx - 0.5 * yy)
}

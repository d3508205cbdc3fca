//! Dense row-major scratch table used for the cost and distance buffers.

use std::ops::{Index, IndexMut};

/// Dense `rows x cols` table of `f64`, stored row-major in one allocation.
///
/// The table is sized once for the largest problem in a batch; smaller
/// problems use its top-left corner with the full row stride.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Table {
    /// Create a `rows x cols` table filled with `fill`.
    #[must_use]
    pub fn new(rows: usize, cols: usize, fill: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    /// Return the number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the number of columns (the row stride).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Mutably borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}

impl Index<(usize, usize)> for Table {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(j < self.cols, "column {j} out of bounds for {} columns", self.cols);
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Table {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        assert!(j < self.cols, "column {j} out of bounds for {} columns", self.cols);
        &mut self.data[i * self.cols + j]
    }
}

use std::ops::AddAssign;

use num_traits::{PrimInt, Unsigned, Zero};

pub mod ops;
pub mod orthogonal;

#[cfg(test)]
mod proptests;

pub use orthogonal::{LineIter, SparseMatrix, Triplets};

/// Per-line non-zero counts, index 0 holding line 1.
pub trait MatrixNonZero {
    fn nonzero_col<U>(&self) -> anyhow::Result<Vec<U>>
    where
        U: PrimInt + Unsigned + Zero + AddAssign;

    fn nonzero_row<U>(&self) -> anyhow::Result<Vec<U>>
    where
        U: PrimInt + Unsigned + Zero + AddAssign;
}

pub trait MatrixSum {
    type Item;

    /// Wrapping sum of every column, index 0 holding column 1.
    fn sum_col(&self) -> Vec<Self::Item>;

    /// Wrapping sum of every row, index 0 holding row 1.
    fn sum_row(&self) -> Vec<Self::Item>;
}

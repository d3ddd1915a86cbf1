//! Algebra over [`SparseMatrix`]: every operation reads its operands and
//! links the result into a freshly allocated matrix.

use std::cmp::Ordering;

use log::debug;

use crate::{Direction, MatrixError, MatrixValue, Result};

use super::orthogonal::TailAppender;
use super::SparseMatrix;

fn ensure_same_size<T: MatrixValue>(a: &SparseMatrix<T>, b: &SparseMatrix<T>) -> Result<()> {
    if a.size() != b.size() {
        return Err(MatrixError::DimensionMismatch {
            left: a.size(),
            right: b.size(),
        });
    }
    Ok(())
}

/// `a + b`, merging the two row cycles of each row.
pub fn add<T: MatrixValue>(a: &SparseMatrix<T>, b: &SparseMatrix<T>) -> Result<SparseMatrix<T>> {
    ensure_same_size(a, b)?;
    let mut out = TailAppender::new(a.size())?;

    for row in 1..=a.size() {
        let mut left = a.line_unchecked(Direction::ROW, row).peekable();
        let mut right = b.line_unchecked(Direction::ROW, row).peekable();

        loop {
            let (col, value) = match (left.peek().copied(), right.peek().copied()) {
                (Some((lc, lv)), Some((rc, rv))) => match lc.cmp(&rc) {
                    Ordering::Less => {
                        left.next();
                        (lc, lv)
                    }
                    Ordering::Greater => {
                        right.next();
                        (rc, rv)
                    }
                    Ordering::Equal => {
                        left.next();
                        right.next();
                        (lc, lv.wrapping_add(&rv))
                    }
                },
                (Some(entry), None) => {
                    left.next();
                    entry
                }
                (None, Some(entry)) => {
                    right.next();
                    entry
                }
                (None, None) => break,
            };
            // cancelled sums are dropped by the appender
            out.push(row, col, value);
        }
    }

    let result = out.finish();
    debug!(
        "add: {}x{} with nnz {} + {} -> {}",
        a.size(),
        a.size(),
        a.nnz(),
        b.nnz(),
        result.nnz()
    );
    Ok(result)
}

/// `a * b`, row by row with a dense accumulator over the touched columns.
///
/// Only the non-zeros of row `i` of `a` and of the matching rows of `b` are
/// visited. Products and sums wrap on overflow.
pub fn multiply<T: MatrixValue>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<T>,
) -> Result<SparseMatrix<T>> {
    ensure_same_size(a, b)?;
    let size = a.size();
    let mut out = TailAppender::new(size)?;

    let mut accumulator = vec![T::zero(); size + 1];
    let mut occupied = vec![false; size + 1];
    let mut touched: Vec<usize> = Vec::new();

    for row in 1..=size {
        for (k, a_ik) in a.line_unchecked(Direction::ROW, row) {
            for (col, b_kj) in b.line_unchecked(Direction::ROW, k) {
                if !occupied[col] {
                    occupied[col] = true;
                    touched.push(col);
                }
                accumulator[col] = accumulator[col].wrapping_add(&a_ik.wrapping_mul(&b_kj));
            }
        }

        touched.sort_unstable();
        for &col in &touched {
            out.push(row, col, accumulator[col]);
            accumulator[col] = T::zero();
            occupied[col] = false;
        }
        touched.clear();
    }

    let result = out.finish();
    debug!(
        "multiply: {}x{} with nnz {} * {} -> {}",
        size,
        size,
        a.nnz(),
        b.nnz(),
        result.nnz()
    );
    Ok(result)
}

/// Transpose of `a`. Walking the column cycles yields the result in
/// row-major order, so every entry is appended at a tail.
pub fn transpose<T: MatrixValue>(a: &SparseMatrix<T>) -> Result<SparseMatrix<T>> {
    let mut out = TailAppender::new(a.size())?;
    for (row, col, value) in a.col_major_iter() {
        out.push(col, row, value);
    }
    let result = out.finish();
    debug!("transpose: {}x{} with nnz {}", a.size(), a.size(), result.nnz());
    Ok(result)
}

/// `scalar * a`. A zero scalar gives the empty matrix.
pub fn scalar_multiply<T: MatrixValue>(a: &SparseMatrix<T>, scalar: T) -> Result<SparseMatrix<T>> {
    let mut out = TailAppender::new(a.size())?;
    if !scalar.is_zero() {
        for (row, col, value) in a.iter() {
            out.push(row, col, value.wrapping_mul(&scalar));
        }
    }
    let result = out.finish();
    debug!(
        "scalar_multiply: {}x{} by {} with nnz {} -> {}",
        a.size(),
        a.size(),
        scalar,
        a.nnz(),
        result.nnz()
    );
    Ok(result)
}

impl<T: MatrixValue> SparseMatrix<T> {
    pub fn add(&self, other: &Self) -> Result<Self> {
        add(self, other)
    }

    pub fn multiply(&self, other: &Self) -> Result<Self> {
        multiply(self, other)
    }

    pub fn transpose(&self) -> Result<Self> {
        transpose(self)
    }

    pub fn scalar_multiply(&self, scalar: T) -> Result<Self> {
        scalar_multiply(self, scalar)
    }
}

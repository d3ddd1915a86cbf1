//! Conversions between [`SparseMatrix`] and the `nalgebra-sparse` / `ndarray`
//! representations. Those use 0-based indices; the conversions shift by one.

use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ndarray::{Array2, ArrayView2};

use crate::sparse::orthogonal::TailAppender;
use crate::{Direction, MatrixError, MatrixValue, Result, SparseMatrix};

fn ensure_square(rows: usize, cols: usize) -> Result<()> {
    if rows != cols {
        return Err(MatrixError::NotSquare { rows, cols });
    }
    Ok(())
}

impl<T: MatrixValue> SparseMatrix<T> {
    pub fn to_coo(&self) -> CooMatrix<T> {
        let mut coo = CooMatrix::new(self.size(), self.size());
        for (row, col, value) in self.iter() {
            coo.push(row - 1, col - 1, value);
        }
        coo
    }

    pub fn to_csr(&self) -> Result<CsrMatrix<T>> {
        let size = self.size();
        let mut row_offsets = Vec::with_capacity(size + 1);
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());

        row_offsets.push(0);
        for row in 1..=size {
            for (col, value) in self.line_unchecked(Direction::ROW, row) {
                col_indices.push(col - 1);
                values.push(value);
            }
            row_offsets.push(values.len());
        }

        CsrMatrix::try_from_csr_data(size, size, row_offsets, col_indices, values)
            .map_err(|e| MatrixError::Format(e.to_string()))
    }

    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros((self.size(), self.size()));
        for (row, col, value) in self.iter() {
            dense[[row - 1, col - 1]] = value;
        }
        dense
    }

    pub fn from_dense(dense: ArrayView2<T>) -> Result<Self> {
        let (rows, cols) = dense.dim();
        ensure_square(rows, cols)?;
        let mut out = TailAppender::new(rows)?;
        for ((row, col), &value) in dense.indexed_iter() {
            out.push(row + 1, col + 1, value);
        }
        Ok(out.finish())
    }
}

/// Duplicate COO entries are summed, matching how `nalgebra-sparse` reads them.
impl<T: MatrixValue> TryFrom<&CooMatrix<T>> for SparseMatrix<T> {
    type Error = MatrixError;

    fn try_from(coo: &CooMatrix<T>) -> Result<Self> {
        ensure_square(coo.nrows(), coo.ncols())?;
        let mut matrix: SparseMatrix<T> = SparseMatrix::new(coo.nrows())?;
        for (row, col, &value) in coo.triplet_iter() {
            let current = matrix.get(row + 1, col + 1)?;
            matrix.insert(row + 1, col + 1, current.wrapping_add(&value))?;
        }
        Ok(matrix)
    }
}

impl<T: MatrixValue> TryFrom<&CsrMatrix<T>> for SparseMatrix<T> {
    type Error = MatrixError;

    fn try_from(csr: &CsrMatrix<T>) -> Result<Self> {
        ensure_square(csr.nrows(), csr.ncols())?;
        let mut out = TailAppender::new(csr.nrows())?;
        for (row, col, &value) in csr.triplet_iter() {
            out.push(row + 1, col + 1, value);
        }
        Ok(out.finish())
    }
}

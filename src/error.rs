//! Error types for sparse matrix construction, access and algebra

use thiserror::Error;

/// Errors reported by [`crate::SparseMatrix`] and its operations.
///
/// Every failing call leaves the matrices it was given untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Invalid matrix size {size}: dimension must be positive")]
    InvalidSize { size: usize },

    #[error("Coordinate ({row}, {col}) is outside 1..={size}")]
    OutOfRange { row: usize, col: usize, size: usize },

    #[error("Dimension mismatch: {left}x{left} vs {right}x{right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Broken link structure: {detail}")]
    BrokenLink { detail: String },

    #[error("Sparse format error: {0}")]
    Format(String),
}

/// Result type for sparse matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;

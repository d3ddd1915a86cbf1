use std::fmt::{Debug, Display};
use std::ops::{AddAssign, MulAssign};
use std::num::ParseIntError;
use std::str::FromStr;

use num_traits::{PrimInt, Signed, WrappingAdd, WrappingMul};

/// Axis selector for line-wise queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ROW,
    COLUMN,
}

/// Integer types that can be stored in a [`crate::SparseMatrix`].
///
/// Arithmetic in the algebraic operations wraps on overflow, so results
/// outside the range of the chosen type are not meaningful.
pub trait MatrixValue:
    PrimInt
    + Signed
    + WrappingAdd
    + WrappingMul
    + AddAssign
    + MulAssign
    + Debug
    + Display
    + FromStr<Err = ParseIntError>
    + Default
    + Send
    + Sync
    + 'static
{
}

impl MatrixValue for i8 {}
impl MatrixValue for i16 {}
impl MatrixValue for i32 {}
impl MatrixValue for i64 {}
impl MatrixValue for i128 {}
impl MatrixValue for isize {}

pub mod convert;
pub mod error;
pub mod generate;
pub mod io;
pub mod sparse;
mod utils;

pub use error::{MatrixError, Result};
pub use generate::RandomMatrixBuilder;
pub use sparse::SparseMatrix;
pub use utils::Direction;
pub use utils::MatrixValue;

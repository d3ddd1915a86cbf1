use anyhow::bail;
use rand::distr::uniform::SampleUniform;
use rand::distr::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::sparse::orthogonal::TailAppender;
use crate::{MatrixValue, SparseMatrix};

/// Builder for reproducible random sparse matrices.
///
/// Each cell is stored with probability `density`, its value drawn uniformly
/// from `low..=high` excluding zero. The same seed always gives the same
/// matrix.
#[derive(Debug, Clone)]
pub struct RandomMatrixBuilder<T> {
    size: usize,
    density: f64,
    low: T,
    high: T,
    seed: u64,
}

impl<T: MatrixValue + SampleUniform> RandomMatrixBuilder<T> {
    pub fn new(size: usize) -> Self {
        let bound = T::from(9).unwrap_or_else(T::one);
        RandomMatrixBuilder {
            size,
            density: 0.1,
            low: -bound,
            high: bound,
            seed: 42,
        }
    }

    pub fn density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn values(mut self, low: T, high: T) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(&self) -> anyhow::Result<SparseMatrix<T>> {
        if !(0.0..=1.0).contains(&self.density) {
            bail!("Density {} is outside [0, 1]", self.density);
        }
        if self.low > self.high {
            bail!("Empty value range {}..={}", self.low, self.high);
        }
        if self.low.is_zero() && self.high.is_zero() {
            bail!("Value range 0..=0 has no non-zero values");
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let values = Uniform::new_inclusive(self.low, self.high)?;
        let mut out = TailAppender::new(self.size)?;

        for row in 1..=self.size {
            for col in 1..=self.size {
                if !rng.random_bool(self.density) {
                    continue;
                }
                let mut value = values.sample(&mut rng);
                while value.is_zero() {
                    value = values.sample(&mut rng);
                }
                out.push(row, col, value);
            }
        }

        Ok(out.finish())
    }
}

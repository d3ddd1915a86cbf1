//! Property-based tests for the orthogonal matrix and its algebra.

use proptest::collection::vec;
use proptest::prelude::*;

use super::SparseMatrix;

type Triplet = (usize, usize, i64);

// Small values keep dense reference sums far from overflow.
fn triplets(size: usize) -> impl Strategy<Value = Vec<Triplet>> {
    vec((1..=size, 1..=size, -9i64..=9), 0..=size * size)
}

fn sized_matrix(size: usize) -> impl Strategy<Value = SparseMatrix<i64>> {
    triplets(size).prop_map(move |t| SparseMatrix::from_triplets(size, t).unwrap())
}

fn matrix() -> impl Strategy<Value = SparseMatrix<i64>> {
    (1usize..=6).prop_flat_map(sized_matrix)
}

fn matrix_pair() -> impl Strategy<Value = (SparseMatrix<i64>, SparseMatrix<i64>)> {
    (1usize..=6).prop_flat_map(|n| (sized_matrix(n), sized_matrix(n)))
}

fn matrix_triple(
) -> impl Strategy<Value = (SparseMatrix<i64>, SparseMatrix<i64>, SparseMatrix<i64>)> {
    (1usize..=5).prop_flat_map(|n| (sized_matrix(n), sized_matrix(n), sized_matrix(n)))
}

fn dense(matrix: &SparseMatrix<i64>) -> Vec<Vec<i64>> {
    let n = matrix.size();
    (1..=n)
        .map(|i| (1..=n).map(|j| matrix.get(i, j).unwrap()).collect())
        .collect()
}

proptest! {
    #[test]
    fn insert_matches_last_write(size in 1usize..=6, writes in triplets(6)) {
        let mut matrix = SparseMatrix::new(size).unwrap();
        let mut reference = vec![vec![0i64; size + 1]; size + 1];
        for (row, col, value) in writes {
            if row > size || col > size {
                prop_assert!(matrix.insert(row, col, value).is_err());
                continue;
            }
            matrix.insert(row, col, value).unwrap();
            reference[row][col] = value;
            prop_assert_eq!(matrix.get(row, col).unwrap(), value);
        }
        matrix.check_links().unwrap();

        let stored = reference.iter().flatten().filter(|v| **v != 0).count();
        prop_assert_eq!(matrix.nnz(), stored);
        for row in 1..=size {
            for col in 1..=size {
                prop_assert_eq!(matrix.get(row, col).unwrap(), reference[row][col]);
            }
        }
    }

    #[test]
    fn add_matches_dense_scan((a, b) in matrix_pair()) {
        let sum = a.add(&b).unwrap();
        sum.check_links().unwrap();
        let (da, db, ds) = (dense(&a), dense(&b), dense(&sum));
        for i in 0..a.size() {
            for j in 0..a.size() {
                prop_assert_eq!(ds[i][j], da[i][j] + db[i][j]);
            }
        }
    }

    #[test]
    fn multiply_matches_dense_scan((a, b) in matrix_pair()) {
        let product = a.multiply(&b).unwrap();
        product.check_links().unwrap();
        let n = a.size();
        let (da, db, dp) = (dense(&a), dense(&b), dense(&product));
        for i in 0..n {
            for j in 0..n {
                let expected: i64 = (0..n).map(|k| da[i][k] * db[k][j]).sum();
                prop_assert_eq!(dp[i][j], expected);
            }
        }
    }

    #[test]
    fn transpose_round_trip(a in matrix()) {
        let transposed = a.transpose().unwrap();
        transposed.check_links().unwrap();
        for (row, col, value) in a.iter() {
            prop_assert_eq!(transposed.get(col, row).unwrap(), value);
        }
        prop_assert_eq!(transposed.nnz(), a.nnz());
        prop_assert_eq!(transposed.transpose().unwrap(), a);
    }

    #[test]
    fn identity_laws(a in matrix()) {
        let zero = SparseMatrix::new(a.size()).unwrap();
        prop_assert_eq!(&a.add(&zero).unwrap(), &a);
        prop_assert_eq!(&a.scalar_multiply(1).unwrap(), &a);
        prop_assert!(a.scalar_multiply(0).unwrap().is_empty());

        let identity = SparseMatrix::identity(a.size()).unwrap();
        prop_assert_eq!(&identity.multiply(&a).unwrap(), &a);
        prop_assert_eq!(&a.multiply(&identity).unwrap(), &a);
    }

    #[test]
    fn scalar_multiply_scales_every_entry(a in matrix(), scalar in -5i64..=5) {
        let scaled = a.scalar_multiply(scalar).unwrap();
        scaled.check_links().unwrap();
        for row in 1..=a.size() {
            for col in 1..=a.size() {
                prop_assert_eq!(scaled.get(row, col).unwrap(), a.get(row, col).unwrap() * scalar);
            }
        }
    }

    #[test]
    fn multiply_distributes_over_add((a, b, c) in matrix_triple()) {
        let left = a.multiply(&b.add(&c).unwrap()).unwrap();
        let right = a.multiply(&b).unwrap().add(&a.multiply(&c).unwrap()).unwrap();
        prop_assert_eq!(left, right);
    }
}

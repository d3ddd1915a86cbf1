//! Orthogonally linked sparse square matrix.
//!
//! Every stored entry sits on two circular lists at once: its row (ordered by
//! ascending column) and its column (ordered by ascending row). Each row and
//! column has a sentinel anchor, and a single origin sentinel closes the list
//! of row anchors and the list of column anchors into cycles.
//!
//! Nodes live in an arena owned by the matrix and link to each other by slot
//! index, so there is no shared ownership between nodes.

use std::fmt;
use std::ops::AddAssign;

use anyhow::anyhow;
use log::trace;
use num_traits::{PrimInt, Unsigned, Zero};

use crate::{Direction, MatrixError, MatrixValue, Result};

use super::{MatrixNonZero, MatrixSum};

/// Arena slot of the origin sentinel.
const ORIGIN: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind<T> {
    Origin,
    RowAnchor(usize),
    ColAnchor(usize),
    Element { row: usize, col: usize, value: T },
    /// Released slot waiting on the free list.
    Vacant,
}

#[derive(Debug, Clone)]
struct Node<T> {
    kind: NodeKind<T>,
    /// Next node in the row cycle (for anchors: the column-anchor cycle).
    right: usize,
    /// Next node in the column cycle (for anchors: the row-anchor cycle).
    down: usize,
}

/// Sparse `n x n` integer matrix with 1-based coordinates.
///
/// Only non-zero values are stored. Slots `1..=n` hold the row anchors and
/// slots `n + 1..=2n` the column anchors, so an anchor is reached without
/// walking the anchor cycle; the cycles are still maintained and are what
/// full traversals follow.
#[derive(Clone)]
pub struct SparseMatrix<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    size: usize,
    nnz: usize,
}

impl<T: MatrixValue> SparseMatrix<T> {
    /// Creates an empty `size x size` matrix.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MatrixError::InvalidSize { size });
        }

        let mut nodes = Vec::with_capacity(2 * size + 1);
        nodes.push(Node {
            kind: NodeKind::Origin,
            right: size + 1,
            down: 1,
        });

        // Row anchors: own row cycle empty, chained downwards through the origin.
        for row in 1..=size {
            nodes.push(Node {
                kind: NodeKind::RowAnchor(row),
                right: row,
                down: if row == size { ORIGIN } else { row + 1 },
            });
        }

        // Column anchors: own column cycle empty, chained rightwards through the origin.
        for col in 1..=size {
            let slot = size + col;
            nodes.push(Node {
                kind: NodeKind::ColAnchor(col),
                right: if col == size { ORIGIN } else { slot + 1 },
                down: slot,
            });
        }

        Ok(SparseMatrix {
            nodes,
            free: Vec::new(),
            size,
            nnz: 0,
        })
    }

    /// Identity matrix of the given size.
    pub fn identity(size: usize) -> Result<Self> {
        let mut out = TailAppender::new(size)?;
        for i in 1..=size {
            out.push(i, i, T::one());
        }
        Ok(out.finish())
    }

    /// Builds a matrix by inserting every triplet in order; later triplets
    /// overwrite earlier ones at the same coordinate.
    pub fn from_triplets<I>(size: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
    {
        let mut matrix = Self::new(size)?;
        for (row, col, value) in triplets {
            matrix.insert(row, col, value)?;
        }
        Ok(matrix)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    /// Sets the value at `(row, col)`.
    ///
    /// A non-zero value overwrites an existing entry in place or links a new
    /// one into its row and column. A zero value removes the existing entry,
    /// if any.
    pub fn insert(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_coords(row, col)?;

        let (row_prev, row_next) = self.row_position(row, col);
        let exists = matches!(
            self.nodes[row_next].kind,
            NodeKind::Element { col: c, .. } if c == col
        );

        if exists {
            if value.is_zero() {
                self.unlink(row_prev, row_next, row, col);
            } else if let NodeKind::Element { value: current, .. } = &mut self.nodes[row_next].kind
            {
                *current = value;
                trace!("Overwrote ({row}, {col}) with {value}");
            }
            return Ok(());
        }

        if value.is_zero() {
            return Ok(());
        }

        // Both positions are known before any link is touched.
        let (col_prev, col_next) = self.col_position(row, col);
        let slot = self.allocate(Node {
            kind: NodeKind::Element { row, col, value },
            right: row_next,
            down: col_next,
        });
        self.nodes[row_prev].right = slot;
        self.nodes[col_prev].down = slot;
        self.nnz += 1;
        trace!("Linked ({row}, {col}) = {value} at slot {slot}");
        Ok(())
    }

    /// Value at `(row, col)`, zero when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.check_coords(row, col)?;
        let (_, slot) = self.row_position(row, col);
        Ok(match self.nodes[slot].kind {
            NodeKind::Element { col: c, value, .. } if c == col => value,
            _ => T::zero(),
        })
    }

    /// Stored entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> Triplets<'_, T> {
        Triplets::new(self, Direction::ROW)
    }

    /// Stored entries as `(row, col, value)` in column-major order.
    pub fn col_major_iter(&self) -> Triplets<'_, T> {
        Triplets::new(self, Direction::COLUMN)
    }

    /// `(col, value)` pairs of one row in ascending column order.
    pub fn row(&self, row: usize) -> Result<LineIter<'_, T>> {
        self.line(Direction::ROW, row)
    }

    /// `(row, value)` pairs of one column in ascending row order.
    pub fn col(&self, col: usize) -> Result<LineIter<'_, T>> {
        self.line(Direction::COLUMN, col)
    }

    pub fn line(&self, direction: Direction, index: usize) -> Result<LineIter<'_, T>> {
        match direction {
            Direction::ROW => self.check_coords(index, 1)?,
            Direction::COLUMN => self.check_coords(1, index)?,
        }
        Ok(self.line_unchecked(direction, index))
    }

    pub(crate) fn line_unchecked(&self, direction: Direction, index: usize) -> LineIter<'_, T> {
        let anchor = self.anchor_slot(direction, index);
        LineIter {
            matrix: self,
            cursor: self.element_step(anchor, direction),
            direction,
        }
    }

    /// Walks every cycle and verifies the link structure: both anchor cycles
    /// hold exactly `size` anchors in order, every line is strictly ascending,
    /// and each element is reached exactly once from its row and once from
    /// its column.
    pub fn check_links(&self) -> Result<()> {
        let mut visits = vec![0u32; self.nodes.len()];
        let from_rows = self.check_axis(Direction::ROW, &mut visits)?;
        let from_cols = self.check_axis(Direction::COLUMN, &mut visits)?;

        if from_rows != self.nnz || from_cols != self.nnz {
            return Err(broken(format!(
                "row walk found {from_rows} and column walk {from_cols} elements, expected {}",
                self.nnz
            )));
        }

        for (slot, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Element { row, col, .. } = node.kind {
                if visits[slot] != 2 {
                    return Err(broken(format!(
                        "element ({row}, {col}) reached {} times instead of once per axis",
                        visits[slot]
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_axis(&self, direction: Direction, visits: &mut [u32]) -> Result<usize> {
        let axis = match direction {
            Direction::ROW => "row",
            Direction::COLUMN => "column",
        };
        let mut elements = 0;
        let mut anchor = self.anchor_step(ORIGIN, direction);

        for expected in 1..=self.size {
            if self.anchor_index(anchor, direction) != Some(expected) {
                return Err(broken(format!(
                    "expected {axis} anchor {expected}, found {:?}",
                    self.nodes[anchor].kind
                )));
            }

            let mut last = 0;
            let mut steps = 0;
            let mut cursor = self.element_step(anchor, direction);
            while cursor != anchor {
                let (line, cross) = match (self.nodes[cursor].kind, direction) {
                    (NodeKind::Element { row, col, .. }, Direction::ROW) => (row, col),
                    (NodeKind::Element { row, col, .. }, Direction::COLUMN) => (col, row),
                    (other, _) => {
                        return Err(broken(format!(
                            "{axis} {expected} cycle reached {other:?} before its anchor"
                        )))
                    }
                };
                if line != expected || cross <= last {
                    return Err(broken(format!(
                        "{axis} {expected} holds misplaced element at index {cross}"
                    )));
                }
                steps += 1;
                if steps > self.nnz {
                    return Err(broken(format!("{axis} {expected} cycle does not close")));
                }
                last = cross;
                visits[cursor] += 1;
                elements += 1;
                cursor = self.element_step(cursor, direction);
            }

            anchor = self.anchor_step(anchor, direction);
        }

        if anchor != ORIGIN {
            return Err(broken(format!("{axis} anchor cycle does not return to the origin")));
        }
        Ok(elements)
    }

    fn check_coords(&self, row: usize, col: usize) -> Result<()> {
        if row == 0 || col == 0 || row > self.size || col > self.size {
            return Err(MatrixError::OutOfRange {
                row,
                col,
                size: self.size,
            });
        }
        Ok(())
    }

    fn anchor_slot(&self, direction: Direction, index: usize) -> usize {
        match direction {
            Direction::ROW => index,
            Direction::COLUMN => self.size + index,
        }
    }

    fn anchor_index(&self, slot: usize, direction: Direction) -> Option<usize> {
        match (self.nodes[slot].kind, direction) {
            (NodeKind::RowAnchor(i), Direction::ROW) => Some(i),
            (NodeKind::ColAnchor(j), Direction::COLUMN) => Some(j),
            _ => None,
        }
    }

    /// Next anchor along the origin cycle of `direction`.
    fn anchor_step(&self, slot: usize, direction: Direction) -> usize {
        match direction {
            Direction::ROW => self.nodes[slot].down,
            Direction::COLUMN => self.nodes[slot].right,
        }
    }

    /// Next node inside a line of `direction`.
    fn element_step(&self, slot: usize, direction: Direction) -> usize {
        match direction {
            Direction::ROW => self.nodes[slot].right,
            Direction::COLUMN => self.nodes[slot].down,
        }
    }

    /// `(prev, next)` around the place `col` occupies in `row`: `next` is the
    /// first element with column `>= col`, or the row anchor.
    fn row_position(&self, row: usize, col: usize) -> (usize, usize) {
        let mut prev = self.anchor_slot(Direction::ROW, row);
        let mut next = self.nodes[prev].right;
        while let NodeKind::Element { col: c, .. } = self.nodes[next].kind {
            if c >= col {
                break;
            }
            prev = next;
            next = self.nodes[next].right;
        }
        (prev, next)
    }

    fn col_position(&self, row: usize, col: usize) -> (usize, usize) {
        let mut prev = self.anchor_slot(Direction::COLUMN, col);
        let mut next = self.nodes[prev].down;
        while let NodeKind::Element { row: r, .. } = self.nodes[next].kind {
            if r >= row {
                break;
            }
            prev = next;
            next = self.nodes[next].down;
        }
        (prev, next)
    }

    fn allocate(&mut self, node: Node<T>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Removes the element at `slot` from both of its cycles and recycles the slot.
    fn unlink(&mut self, row_prev: usize, slot: usize, row: usize, col: usize) {
        let (col_prev, _) = self.col_position(row, col);
        self.nodes[row_prev].right = self.nodes[slot].right;
        self.nodes[col_prev].down = self.nodes[slot].down;
        self.nodes[slot] = Node {
            kind: NodeKind::Vacant,
            right: slot,
            down: slot,
        };
        self.free.push(slot);
        self.nnz -= 1;
        trace!("Unlinked ({row}, {col}) from slot {slot}");
    }
}

fn broken(detail: String) -> MatrixError {
    MatrixError::BrokenLink { detail }
}

impl<T: MatrixValue> PartialEq for SparseMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.nnz == other.nnz && self.iter().eq(other.iter())
    }
}

impl<T: MatrixValue> Eq for SparseMatrix<T> {}

impl<T: MatrixValue> fmt::Debug for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMatrix")
            .field("size", &self.size)
            .field("nnz", &self.nnz)
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, T: MatrixValue> IntoIterator for &'a SparseMatrix<T> {
    type Item = (usize, usize, T);
    type IntoIter = Triplets<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over one row or column, stopping when it reaches the line's anchor.
pub struct LineIter<'a, T> {
    matrix: &'a SparseMatrix<T>,
    cursor: usize,
    direction: Direction,
}

impl<T: MatrixValue> Iterator for LineIter<'_, T> {
    /// `(cross index, value)`: the column for a row, the row for a column.
    type Item = (usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        let NodeKind::Element { row, col, value } = self.matrix.nodes[self.cursor].kind else {
            return None;
        };
        self.cursor = self.matrix.element_step(self.cursor, self.direction);
        Some(match self.direction {
            Direction::ROW => (col, value),
            Direction::COLUMN => (row, value),
        })
    }
}

/// Iterator over every stored entry, following the anchor cycle of one axis.
pub struct Triplets<'a, T> {
    matrix: &'a SparseMatrix<T>,
    anchor: usize,
    cursor: usize,
    direction: Direction,
}

impl<'a, T: MatrixValue> Triplets<'a, T> {
    fn new(matrix: &'a SparseMatrix<T>, direction: Direction) -> Self {
        Triplets {
            matrix,
            anchor: ORIGIN,
            cursor: ORIGIN,
            direction,
        }
    }
}

impl<T: MatrixValue> Iterator for Triplets<'_, T> {
    type Item = (usize, usize, T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let NodeKind::Element { row, col, value } = self.matrix.nodes[self.cursor].kind {
                self.cursor = self.matrix.element_step(self.cursor, self.direction);
                return Some((row, col, value));
            }

            let next_anchor = self.matrix.anchor_step(self.anchor, self.direction);
            if next_anchor == ORIGIN {
                return None;
            }
            self.anchor = next_anchor;
            self.cursor = self.matrix.element_step(next_anchor, self.direction);
        }
    }
}

/// Builds a matrix by linking entries at the tail of their row and column.
///
/// Entries must arrive in row-major order (or any order that is ascending in
/// both every row and every column), which is what the algebraic operations
/// and format conversions produce. Zero values are skipped.
pub(crate) struct TailAppender<T> {
    matrix: SparseMatrix<T>,
    row_tail: Vec<usize>,
    col_tail: Vec<usize>,
}

impl<T: MatrixValue> TailAppender<T> {
    pub(crate) fn new(size: usize) -> Result<Self> {
        let matrix = SparseMatrix::new(size)?;
        let row_tail = (0..=size).collect();
        let col_tail = (0..=size).map(|col| size + col).collect();
        Ok(TailAppender {
            matrix,
            row_tail,
            col_tail,
        })
    }

    pub(crate) fn push(&mut self, row: usize, col: usize, value: T) {
        if value.is_zero() {
            return;
        }
        debug_assert!(self.matrix.check_coords(row, col).is_ok());
        debug_assert!(
            !matches!(self.matrix.nodes[self.row_tail[row]].kind,
                NodeKind::Element { col: c, .. } if c >= col),
            "row {row} appended out of order at column {col}"
        );
        debug_assert!(
            !matches!(self.matrix.nodes[self.col_tail[col]].kind,
                NodeKind::Element { row: r, .. } if r >= row),
            "column {col} appended out of order at row {row}"
        );

        let size = self.matrix.size;
        let slot = self.matrix.allocate(Node {
            kind: NodeKind::Element { row, col, value },
            right: row,
            down: size + col,
        });
        self.matrix.nodes[self.row_tail[row]].right = slot;
        self.matrix.nodes[self.col_tail[col]].down = slot;
        self.row_tail[row] = slot;
        self.col_tail[col] = slot;
        self.matrix.nnz += 1;
    }

    pub(crate) fn finish(self) -> SparseMatrix<T> {
        self.matrix
    }
}

impl<T: MatrixValue> MatrixNonZero for SparseMatrix<T> {
    fn nonzero_row<U>(&self) -> anyhow::Result<Vec<U>>
    where
        U: PrimInt + Unsigned + Zero + AddAssign,
    {
        count_lines(self, Direction::ROW)
    }

    fn nonzero_col<U>(&self) -> anyhow::Result<Vec<U>>
    where
        U: PrimInt + Unsigned + Zero + AddAssign,
    {
        count_lines(self, Direction::COLUMN)
    }
}

fn count_lines<T, U>(matrix: &SparseMatrix<T>, direction: Direction) -> anyhow::Result<Vec<U>>
where
    T: MatrixValue,
    U: PrimInt + Unsigned + Zero + AddAssign,
{
    (1..=matrix.size)
        .map(|i| {
            let count = matrix.line_unchecked(direction, i).count();
            U::from(count).ok_or_else(|| anyhow!("Failed to convert to target type"))
        })
        .collect()
}

impl<T: MatrixValue> MatrixSum for SparseMatrix<T> {
    type Item = T;

    fn sum_row(&self) -> Vec<T> {
        sum_lines(self, Direction::ROW)
    }

    fn sum_col(&self) -> Vec<T> {
        sum_lines(self, Direction::COLUMN)
    }
}

fn sum_lines<T: MatrixValue>(matrix: &SparseMatrix<T>, direction: Direction) -> Vec<T> {
    (1..=matrix.size)
        .map(|i| {
            matrix
                .line_unchecked(direction, i)
                .fold(T::zero(), |acc, (_, value)| acc.wrapping_add(&value))
        })
        .collect()
}

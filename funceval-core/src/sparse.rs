//! Sparse matrix storage for annotation and prediction matrices.
//!
//! [`SparseMatrix`] stores non-zero entries as `(row, col, value)` triplets.
//! This format is cheap to build from annotation records and to reindex
//! onto a new object list. [`CompressedMatrix`] is the lane-oriented
//! (CSR or CSC) form used when a whole row or column is consumed at once, and
//! [`SparseVector`] is a borrowed view of one such lane.

use crate::{EvalError, Result, Summarizable};

/// Which axis a [`CompressedMatrix`] is compressed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// One lane per row (CSR).
    Row,
    /// One lane per column (CSC).
    Column,
}

/// A sparse matrix in COO (coordinate) format.
///
/// Every `(row, col)` pair is stored at most once.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseMatrix {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl SparseMatrix {
    /// Create an empty sparse matrix with the given dimensions.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            n_rows,
            n_cols,
        }
    }

    /// Create a sparse matrix from triplet vectors.
    ///
    /// All three vectors must have the same length, all indices must be
    /// within bounds, every value must be finite, and no `(row, col)` pair
    /// may appear twice.
    pub fn from_triplets(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
        n_rows: usize,
        n_cols: usize,
    ) -> Result<Self> {
        if rows.len() != cols.len() || cols.len() != values.len() {
            return Err(EvalError::InputValidation(
                "rows, cols, and values must have the same length".into(),
            ));
        }
        for (i, ((&r, &c), &v)) in rows.iter().zip(cols.iter()).zip(values.iter()).enumerate() {
            if r >= n_rows || c >= n_cols {
                return Err(EvalError::InputValidation(format!(
                    "triplet {i} index ({r}, {c}) out of bounds for ({n_rows}, {n_cols})"
                )));
            }
            if !v.is_finite() {
                return Err(EvalError::InputValidation(format!(
                    "triplet {i} at ({r}, {c}) has non-finite value {v}"
                )));
            }
        }

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_unstable_by_key(|&i| (rows[i], cols[i]));
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if rows[a] == rows[b] && cols[a] == cols[b] {
                return Err(EvalError::InputValidation(format!(
                    "duplicate entry at ({}, {})",
                    rows[a], cols[a]
                )));
            }
        }

        Ok(Self {
            rows,
            cols,
            values,
            n_rows,
            n_cols,
        })
    }

    fn position(&self, row: usize, col: usize) -> Option<usize> {
        (0..self.values.len()).find(|&i| self.rows[i] == row && self.cols[i] == col)
    }

    /// Get the value at `(row, col)`. Returns 0.0 if no entry is stored.
    ///
    /// This is an O(nnz) scan.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.position(row, col).map_or(0.0, |i| self.values[i])
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of entries that are stored: `nnz / (n_rows * n_cols)`.
    pub fn density(&self) -> f64 {
        let total = self.n_rows as f64 * self.n_cols as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.values.len() as f64 / total
    }

    /// (n_rows, n_cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Convert to a dense 2D vector.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n_cols]; self.n_rows];
        for (r, c, v) in self.iter() {
            dense[r][c] = v;
        }
        dense
    }

    /// Per-row count of stored entries satisfying `pred`.
    pub fn row_counts(&self, pred: impl Fn(f64) -> bool) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_rows];
        for (r, _, v) in self.iter() {
            if pred(v) {
                counts[r] += 1;
            }
        }
        counts
    }

    /// Reindex rows through `mapping`, where `mapping[old_row]` is the new
    /// row index or `None` to drop the row. The result has `n_rows` rows.
    ///
    /// Entries whose new row is out of bounds are rejected, as is a mapping
    /// that sends two old rows to the same new row.
    pub fn remap_rows(&self, mapping: &[Option<usize>], n_rows: usize) -> Result<Self> {
        if mapping.len() != self.n_rows {
            return Err(EvalError::InputValidation(format!(
                "row mapping length ({}) must equal n_rows ({})",
                mapping.len(),
                self.n_rows
            )));
        }
        let mut claimed = vec![false; n_rows];
        for &new in mapping.iter().flatten() {
            if new >= n_rows {
                return Err(EvalError::InputValidation(format!(
                    "mapped row {new} out of bounds for {n_rows} rows"
                )));
            }
            if claimed[new] {
                return Err(EvalError::InputValidation(format!(
                    "two rows map onto row {new}"
                )));
            }
            claimed[new] = true;
        }

        let mut out = Self::new(n_rows, self.n_cols);
        for (r, c, v) in self.iter() {
            if let Some(new) = mapping[r] {
                out.rows.push(new);
                out.cols.push(c);
                out.values.push(v);
            }
        }
        Ok(out)
    }

    /// Compress along `axis`. Indices inside every lane are ascending.
    pub fn compress(&self, axis: Axis) -> CompressedMatrix {
        let (major, minor, n_lanes) = match axis {
            Axis::Row => (&self.rows, &self.cols, self.n_rows),
            Axis::Column => (&self.cols, &self.rows, self.n_cols),
        };
        let nnz = self.values.len();
        let mut order: Vec<usize> = (0..nnz).collect();
        order.sort_unstable_by_key(|&i| (major[i], minor[i]));

        let mut values = Vec::with_capacity(nnz);
        let mut indices = Vec::with_capacity(nnz);
        let mut indptr = vec![0usize; n_lanes + 1];

        for &i in &order {
            values.push(self.values[i]);
            indices.push(minor[i]);
            indptr[major[i] + 1] += 1;
        }

        // Cumulative sum to build indptr
        for i in 1..=n_lanes {
            indptr[i] += indptr[i - 1];
        }

        CompressedMatrix {
            axis,
            indptr,
            indices,
            values,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }

    /// Iterate over stored triplets `(row, col, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .zip(self.values.iter())
            .map(|((&r, &c), &v)| (r, c, v))
    }
}

impl Summarizable for SparseMatrix {
    fn summary(&self) -> String {
        format!(
            "SparseMatrix: {}\u{00d7}{}, {} nonzeros ({:.2}% density)",
            self.n_rows,
            self.n_cols,
            self.nnz(),
            self.density() * 100.0
        )
    }
}

/// A sparse matrix compressed into lanes (CSR when `axis` is
/// [`Axis::Row`], CSC when it is [`Axis::Column`]).
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedMatrix {
    axis: Axis,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl CompressedMatrix {
    /// Axis the lanes run along.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of lanes (rows for CSR, columns for CSC).
    pub fn n_lanes(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Length of each lane (columns for CSR, rows for CSC).
    pub fn lane_len(&self) -> usize {
        match self.axis {
            Axis::Row => self.n_cols,
            Axis::Column => self.n_rows,
        }
    }

    /// (n_rows, n_cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Borrow lane `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_lanes()`.
    pub fn lane(&self, i: usize) -> SparseVector<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseVector {
            len: self.lane_len(),
            indices: &self.indices[start..end],
            values: &self.values[start..end],
        }
    }
}

/// Borrowed view of one sparse lane: `values[j]` sits at position
/// `indices[j]` of a vector of length `len`; every other position is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseVector<'a> {
    /// Logical length of the vector.
    pub len: usize,
    /// Positions of stored entries, ascending.
    pub indices: &'a [usize],
    /// Stored values, parallel to `indices`.
    pub values: &'a [f64],
}

impl<'a> SparseVector<'a> {
    /// Build a view, checking that the slices are parallel, indices are
    /// strictly ascending and every index is below `len`.
    pub fn new(len: usize, indices: &'a [usize], values: &'a [f64]) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(EvalError::InputValidation(format!(
                "sparse vector has {} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EvalError::InputValidation(
                "sparse vector indices must be strictly ascending".into(),
            ));
        }
        if let Some(&last) = indices.last() {
            if last >= len {
                return Err(EvalError::InputValidation(format!(
                    "sparse vector index {last} out of bounds for length {len}"
                )));
            }
        }
        Ok(Self {
            len,
            indices,
            values,
        })
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(position, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of stored values strictly greater than zero.
    pub fn count_positive(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0.0).count()
    }

    /// Expand into a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.len];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

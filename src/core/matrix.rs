//! Sparse contact matrix assembly
//!
//! Workers emit one `(row, col)` triplet per valid pair; depending on which
//! mate came first a contact between bins i and j may land in either triangle.
//! Final assembly folds both triangles into a symmetric matrix as
//! `M + Mᵗ − diag(M)`, so the diagonal is never double-counted, and returns
//! the entries in sorted order so the output is identical for any worker
//! count.

use std::collections::HashMap;

/// One entry of the sparse matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixTriplet {
    pub row: u32,
    pub col: u32,
    pub weight: u32,
}

/// Accumulator for contact counts
#[derive(Debug, Clone)]
pub struct ContactMatrix {
    size: u32,
    cells: HashMap<(u32, u32), u32>,
}

impl ContactMatrix {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            cells: HashMap::new(),
        }
    }

    /// Matrix dimension (number of bins)
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of non-zero cells before symmetrization
    pub fn nnz(&self) -> usize {
        self.cells.len()
    }

    pub fn add(&mut self, row: u32, col: u32, weight: u32) {
        debug_assert!(row < self.size && col < self.size);
        *self.cells.entry((row, col)).or_insert(0) += weight;
    }

    /// Fold a worker's triplet list into the accumulator
    pub fn add_pairs(&mut self, pairs: &[(u32, u32)]) {
        for &(row, col) in pairs {
            self.add(row, col, 1);
        }
    }

    /// Produce the symmetric matrix `M + Mᵗ − diag(M)` as sorted triplets.
    pub fn finalize_symmetric(self) -> Vec<MatrixTriplet> {
        let mut folded: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.cells.len() * 2);
        for ((row, col), weight) in self.cells {
            *folded.entry((row, col)).or_insert(0) += weight;
            if row != col {
                *folded.entry((col, row)).or_insert(0) += weight;
            }
        }
        let mut triplets: Vec<MatrixTriplet> = folded
            .into_iter()
            .map(|((row, col), weight)| MatrixTriplet { row, col, weight })
            .collect();
        triplets.sort_by_key(|t| (t.row, t.col));
        triplets
    }
}

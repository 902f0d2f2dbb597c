//! Square, symmetric distance matrix over a set of named taxa.
//!
//! Entries are stored row-major in a single `Vec<f64>`, so that row `i` is the
//! contiguous slice `data[i * n .. (i + 1) * n]`. Taxon names are kept in
//! insertion order, which is also the row/column order.

use crate::error::{Invariant, Result};

/// A validated distance matrix.
///
/// Construction checks that the diagonal is zero, that the matrix is
/// symmetric and that every entry is a finite, non-negative number. Once
/// built, the matrix is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    data: Vec<f64>,
    names: Vec<String>,
}

impl DistanceMatrix {
    /// Build a matrix from taxon names and row-major entries.
    ///
    /// # Errors
    /// Returns an [`Invariant`] violation if `data.len() != names.len()^2` or
    /// if any of the matrix invariants do not hold.
    pub fn new(names: Vec<String>, data: Vec<f64>) -> Result<Self> {
        let size = names.len();
        if data.len() != size * size {
            return Err(Invariant::ShapeMismatch {
                names: size,
                entries: data.len(),
            }
            .into());
        }

        let matrix = DistanceMatrix { size, data, names };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a matrix from one `Vec` per row.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(names.len() * names.len())?;
        for row in rows {
            if row.len() != names.len() {
                return Err(Invariant::ShapeMismatch {
                    names: names.len(),
                    entries: row.len(),
                }
                .into());
            }
            data.extend(row);
        }
        Self::new(names, data)
    }

    /// Check the diagonal, symmetry and value range of every entry.
    pub fn validate(&self) -> Result<()> {
        let n = self.size;
        for i in 0..n {
            if self.get(i, i) != 0.0 {
                return Err(Invariant::NonZeroDiagonal { taxon: i }.into());
            }
            for j in 0..n {
                let value = self.get(i, j);
                if !value.is_finite() || value < 0.0 {
                    return Err(Invariant::InvalidDistance {
                        row: i,
                        col: j,
                        value,
                    }
                    .into());
                }
                if j > i && value != self.get(j, i) {
                    return Err(Invariant::Asymmetric { row: i, col: j }.into());
                }
            }
        }
        Ok(())
    }

    /// Number of taxa.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, taxon: usize) -> &str {
        &self.names[taxon]
    }

    /// Distance between taxa `i` and `j`.
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// All distances from taxon `i`, in taxon order.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// The raw row-major entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

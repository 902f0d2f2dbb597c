//! Neighbor-joining tree construction.
//!
//! # Algorithm
//! Classic agglomerative neighbor joining on a private copy of the matrix:
//!
//! 1. For every active cluster `i` compute `r_i = Σ_j M[i][j] / (n - 2)`.
//! 2. Pick the pair minimising `Q(i,j) = M[i][j] - r_i - r_j`. The scan is
//!    row-major and only a strictly smaller value replaces the current best,
//!    so ties resolve to the first pair in scan order.
//! 3. Join the pair under a new internal node with branch lengths
//!    `(M[i][j] ± (r_i - r_j)) / 2`.
//! 4. Replace row/column `i` with the reduced distances
//!    `(M[i][k] + M[j][k] - M[i][j]) / 2`, move the last active cluster into
//!    slot `j` and shrink the active set by one.
//!
//! When three clusters remain they become the children of a trifurcating
//! root. Each step depends on the previous reduction, so the whole procedure
//! runs sequentially in `O(n^3)` time and `O(n^2)` space.

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;
use crate::tree::{Branch, NodeId, TreeArena, TreeBuilder};

/// Smallest matrix neighbor joining accepts.
pub const MIN_TAXA: usize = 3;

/// Working copy of the distances, indexed by active cluster slot.
struct Working {
    stride: usize,
    data: Vec<f64>,
}

impl Working {
    fn copy_of(matrix: &DistanceMatrix) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(matrix.as_slice().len())?;
        data.extend_from_slice(matrix.as_slice());
        Ok(Working {
            stride: matrix.size(),
            data,
        })
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.stride + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.stride + j] = value;
        self.data[j * self.stride + i] = value;
    }
}

/// Build a neighbor-joining tree from `matrix`.
///
/// The caller's matrix is not modified. The returned tree has `n` leaves,
/// `n - 3` binary internal nodes and a trifurcating root.
///
/// # Errors
/// * [`Error::InsufficientTaxa`] if the matrix has fewer than three taxa.
/// * [`Error::Allocation`] if the working copy or the arena cannot be allocated.
pub fn neighbor_joining(matrix: &DistanceMatrix) -> Result<TreeArena> {
    let size = matrix.size();
    if size < MIN_TAXA {
        return Err(Error::InsufficientTaxa {
            required: MIN_TAXA,
            found: size,
        });
    }

    let mut m = Working::copy_of(matrix)?;
    let mut builder = TreeBuilder::new(size)?;
    let mut unjoined: Vec<NodeId> = (0..size).collect();
    let mut r = vec![0.0; size];
    let mut n = size;

    while n > 3 {
        for (i, ri) in r.iter_mut().enumerate().take(n) {
            let sum: f64 = (0..n).map(|j| m.get(i, j)).sum();
            *ri = sum / (n - 2) as f64;
        }

        let (i, j) = closest_pair(&m, &r, n);
        let mij = m.get(i, j);

        let node = builder.join(
            Branch::new(unjoined[i], (mij + r[i] - r[j]) / 2.0),
            Branch::new(unjoined[j], (mij - r[i] + r[j]) / 2.0),
        );

        for k in 0..n {
            if k == i || k == j {
                continue;
            }
            let reduced = (m.get(i, k) + m.get(j, k) - mij) / 2.0;
            m.set(i, k, reduced);
        }
        m.set(i, i, 0.0);
        unjoined[i] = node;

        // compact: the last active slot takes the place of j
        let last = n - 1;
        if j != last {
            for k in 0..n {
                let value = m.get(last, k);
                m.set(j, k, value);
            }
            m.set(j, j, 0.0);
            unjoined[j] = unjoined[last];
        }

        n -= 1;
    }

    let (m01, m02, m12) = (m.get(0, 1), m.get(0, 2), m.get(1, 2));
    Ok(builder.finish(
        Branch::new(unjoined[0], (m01 + m02 - m12) / 2.0),
        Branch::new(unjoined[1], (m01 + m12 - m02) / 2.0),
        Branch::new(unjoined[2], (m02 + m12 - m01) / 2.0),
    ))
}

/// Active pair `(i, j)` with `i < j` minimising `M[i][j] - r_i - r_j`.
fn closest_pair(m: &Working, r: &[f64], n: usize) -> (usize, usize) {
    let mut best = (0, 1);
    let mut best_value = m.get(0, 1) - r[0] - r[1];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let value = m.get(i, j) - r[i] - r[j];
            if value < best_value {
                best = (i, j);
                best_value = value;
            }
        }
    }

    let (i, j) = best;
    if j < i { (j, i) } else { (i, j) }
}

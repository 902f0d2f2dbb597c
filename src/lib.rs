//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Pipeline: [`DistanceMatrix`] → [`neighbor_joining`] → [`TreeArena`] →
//! [`annotate`] (quartet support, in place) → [`to_newick`] / consense report.
//!
//! Modules:
//! - `matrix`: validated symmetric distance matrix with taxon names.
//! - `io`: reading (possibly gzipped, possibly concatenated) matrix streams.
//! - `tree`: arena tree with a trifurcating root, builder and traversal.
//! - `nj`: neighbor-joining construction.
//! - `parallel`: worker-pool configuration for the support phase.
//! - `quartet`: four-point condition support values.
//! - `bitset` / `splits`: supported splits as compact taxon sets.
//! - `newick`, `consense`: text output.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod consense;
pub mod error;
pub mod io;
pub mod matrix;
pub mod newick;
pub mod nj;
pub mod parallel;
pub mod quartet;
pub mod splits;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use error::{Error, FormatError, Invariant, Result};
pub use io::{MatrixReader, open_input, read_matrices};
pub use matrix::DistanceMatrix;
pub use newick::{to_newick, write_newick};
pub use nj::neighbor_joining;
pub use parallel::{ParallelConfig, Schedule};
pub use quartet::{annotate, annotate_with};
pub use tree::{Branch, Node, NodeId, Parent, Root, Side, TreeArena, TreeBuilder, Visitor};

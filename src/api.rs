//! Python binding layer for quartet-annotated neighbor-joining trees.
//!
//! Provides Python functions that build a tree from a distance matrix (given
//! directly or read from a file) and return it as annotated Newick or as a
//! list of supported splits.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::Error;
use crate::io::read_matrices;
use crate::matrix::DistanceMatrix;
use crate::newick::to_newick;
use crate::nj::neighbor_joining;
use crate::parallel::ParallelConfig;
use crate::quartet::annotate_with;
use crate::splits::supported_splits;
use crate::tree::TreeArena;

/// Build an annotated tree from a distance matrix.
///
/// Args:
///     names: Taxon names, in matrix row order
///     matrix: Square, symmetric distance matrix with zero diagonal
///     threads: Number of worker threads for the support phase (default: all processors)
///
/// Returns:
///     The tree as a Newick string with percent support labels
///
/// Raises:
///     ValueError: If the matrix is malformed or has fewer than four taxa
#[pyfunction]
#[pyo3(signature = (names, matrix, threads=None))]
fn quartet_tree(names: Vec<String>, matrix: Vec<Vec<f64>>, threads: Option<usize>) -> PyResult<String> {
    let matrix = DistanceMatrix::from_rows(names, matrix).map_err(to_py_err)?;
    let tree = build_annotated(&matrix, threads)?;
    Ok(to_newick(&tree, matrix.names()))
}

/// List the supported splits of the annotated tree.
///
/// Args:
///     names: Taxon names, in matrix row order
///     matrix: Square, symmetric distance matrix with zero diagonal
///     threads: Number of worker threads for the support phase (default: all processors)
///
/// Returns:
///     A list of (mask, support) tuples where mask marks taxa below the
///     split's edge with '*' and all others with '.', and support is in [0, 1]
///
/// Raises:
///     ValueError: If the matrix is malformed or has fewer than four taxa
#[pyfunction]
#[pyo3(signature = (names, matrix, threads=None))]
fn quartet_splits(
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
    threads: Option<usize>,
) -> PyResult<Vec<(String, f64)>> {
    let matrix = DistanceMatrix::from_rows(names, matrix).map_err(to_py_err)?;
    let tree = build_annotated(&matrix, threads)?;
    Ok(supported_splits(&tree)
        .into_iter()
        .map(|split| (split.members.to_mask(matrix.size()), split.support))
        .collect())
}

/// Build one annotated tree per matrix in a file.
///
/// Args:
///     path: Path to a (possibly gzipped) file of concatenated matrices
///     threads: Number of worker threads for the support phase (default: all processors)
///
/// Returns:
///     One Newick string per matrix, in file order
///
/// Raises:
///     ValueError: If the file cannot be read, a matrix is malformed, or has fewer than four taxa
#[pyfunction]
#[pyo3(signature = (path, threads=None))]
fn quartet_trees_from_file(path: String, threads: Option<usize>) -> PyResult<Vec<String>> {
    let matrices = read_matrices(&path).map_err(to_py_err)?;
    if matrices.is_empty() {
        return Err(PyValueError::new_err(format!("No matrices found in file '{}'", path)));
    }

    matrices
        .iter()
        .map(|matrix| {
            let tree = build_annotated(matrix, threads)?;
            Ok(to_newick(&tree, matrix.names()))
        })
        .collect()
}

fn build_annotated(matrix: &DistanceMatrix, threads: Option<usize>) -> PyResult<TreeArena> {
    let config = ParallelConfig::with_workers(threads.unwrap_or(0));
    let mut tree = neighbor_joining(matrix).map_err(to_py_err)?;
    annotate_with(&mut tree, matrix, &config).map_err(to_py_err)?;
    Ok(tree)
}

fn to_py_err(e: Error) -> PyErr {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(cause) = source {
        msg.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    PyValueError::new_err(msg)
}

/// Python module definition
#[pymodule]
fn quartet_nj(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(quartet_tree, m)?)?;
    m.add_function(wrap_pyfunction!(quartet_splits, m)?)?;
    m.add_function(wrap_pyfunction!(quartet_trees_from_file, m)?)?;
    Ok(())
}

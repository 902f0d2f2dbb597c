use std::io::Cursor;

use itertools::{Itertools, iproduct};
use phylotree::tree::Tree as PhyloTree;
use quartet_nj::{
    Branch, DistanceMatrix, MatrixReader, ParallelConfig, Schedule, TreeArena, TreeBuilder,
    annotate, annotate_with, neighbor_joining, to_newick,
};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{i}")).collect()
}

/// A 10-taxon tree with distinct, strictly positive branch lengths.
///
/// ```text
///                    root
///          /          |        \
///        u13         u16        t9
///       /   \       /    \
///     u11   u12   u14    u15
///    /  \   / \   / \    / \
///  u10  t2 t3 t4 t5 t6  t7 t8
///  / \
/// t0 t1
/// ```
fn reference_tree() -> TreeArena {
    let mut b = TreeBuilder::new(10).unwrap();
    let u10 = b.join(Branch::new(0, 1.0), Branch::new(1, 0.5));
    let u11 = b.join(Branch::new(u10, 0.75), Branch::new(2, 1.5));
    let u12 = b.join(Branch::new(3, 0.25), Branch::new(4, 1.0));
    let u13 = b.join(Branch::new(u11, 1.0), Branch::new(u12, 0.5));
    let u14 = b.join(Branch::new(5, 2.0), Branch::new(6, 0.5));
    let u15 = b.join(Branch::new(7, 1.0), Branch::new(8, 0.75));
    let u16 = b.join(Branch::new(u14, 0.25), Branch::new(u15, 1.25));
    b.finish(Branch::new(u13, 0.5), Branch::new(u16, 0.75), Branch::new(9, 1.0))
}

fn additive_matrix() -> DistanceMatrix {
    DistanceMatrix::from_rows(names(10), reference_tree().path_distances()).unwrap()
}

fn noisy_matrix(n: usize) -> DistanceMatrix {
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        let (a, b) = (i.min(j), i.max(j));
                        2.0 + ((a * 31 + b * 17 + a * b) % 23) as f64 / 8.0
                    }
                })
                .collect()
        })
        .collect();
    DistanceMatrix::from_rows(names(n), rows).unwrap()
}

fn supports(tree: &TreeArena) -> Vec<Option<f64>> {
    tree.edges().iter().map(|e| e.branch.support).collect()
}

#[test]
fn additive_matrix_round_trips() {
    let matrix = additive_matrix();
    let mut tree = neighbor_joining(&matrix).unwrap();

    assert_eq!(tree.leaf_count(), 10);
    assert_eq!(tree.internal_count() + 1, 10 - 2);

    let induced = tree.path_distances();
    for (i, j) in (0..10).tuple_combinations() {
        assert!(
            (induced[i][j] - matrix.get(i, j)).abs() < 1e-9,
            "path {i}-{j}: {} != {}",
            induced[i][j],
            matrix.get(i, j)
        );
    }

    annotate(&mut tree, &matrix).unwrap();
    let values: Vec<f64> = supports(&tree).into_iter().flatten().collect();
    assert_eq!(values.len(), 10 - 3);
    assert!(values.iter().all(|&s| s == 1.0));
}

#[test]
fn branch_lengths_are_finite() {
    for n in [3, 4, 7, 15] {
        let tree = neighbor_joining(&noisy_matrix(n)).unwrap();
        assert_eq!(tree.leaf_count(), n);
        assert_eq!(tree.internal_count(), n - 3);
        assert!(tree.edges().iter().all(|e| e.branch.length.is_finite()));
    }
}

#[test]
fn support_independent_of_worker_count() {
    let matrix = noisy_matrix(14);
    let mut reference = neighbor_joining(&matrix).unwrap();
    annotate_with(&mut reference, &matrix, &ParallelConfig::with_workers(1)).unwrap();

    for (workers, schedule) in iproduct!(
        [2, 5, 8],
        [Schedule::WorkStealing, Schedule::Chunked { min_len: 3 }]
    ) {
        let mut tree = neighbor_joining(&matrix).unwrap();
        annotate_with(
            &mut tree,
            &matrix,
            &ParallelConfig::with_workers(workers).with_schedule(schedule),
        )
        .unwrap();

        let lengths = |t: &TreeArena| t.edges().iter().map(|e| e.branch.length).collect::<Vec<_>>();
        assert_eq!(lengths(&tree), lengths(&reference));
        assert_eq!(supports(&tree), supports(&reference));
    }

    let values: Vec<f64> = supports(&reference).into_iter().flatten().collect();
    assert!(values.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn four_taxa_newick() {
    let text = "4\nA 0 2 3 3\nB 2 0 3 3\nC 3 3 0 2\nD 3 3 2 0\n";
    let matrix = MatrixReader::new(Cursor::new(text)).next().unwrap().unwrap();
    let mut tree = neighbor_joining(&matrix).unwrap();
    annotate(&mut tree, &matrix).unwrap();

    assert_eq!(
        to_newick(&tree, matrix.names()),
        "((A:1.000000,B:1.000000):1.000000,D:1.000000,C:1.000000);"
    );
}

#[test]
fn newick_parses_back() {
    let matrix = noisy_matrix(9);
    let mut tree = neighbor_joining(&matrix).unwrap();
    annotate(&mut tree, &matrix).unwrap();

    let newick = to_newick(&tree, matrix.names());
    let parsed = PhyloTree::from_newick(&newick).unwrap();

    let leaves: Vec<String> = parsed
        .get_leaves()
        .iter()
        .filter_map(|id| parsed.get(id).ok()?.name.clone())
        .sorted()
        .collect();
    assert_eq!(leaves, names(9));
}

//! Quartet (four-point condition) support values for tree edges.
//!
//! # Per-edge test
//! For an edge above an internal node `u` with children `a` and `b`, and with
//! `w` the sibling subtree on the other side of the edge, every leaf gets one
//! of four classes:
//!
//! ```text
//!        A   B              A = leaves below a
//!         \ /               B = leaves below b
//!          u                C = leaves below w (the witness)
//!          |  <- edge       D = every other leaf
//!          p
//!         / \
//!        w   ...D
//!        C
//! ```
//!
//! Each quartet `(a, b, c, d) ∈ A×B×C×D` is checked against the topology
//! `ab|cd`: it does not support the edge if `M(a,c)+M(b,d)` or `M(a,d)+M(b,c)`
//! is strictly smaller than `M(a,b)+M(c,d)`. The support is the fraction of
//! supporting quartets. If one class is empty no quartet exists and the
//! support is `None` (not applicable) rather than `0/0`.
//!
//! # Parallel evaluation
//! Internal nodes are independent of each other: they read the shared matrix
//! and tree and produce two values each. They are evaluated on a worker pool
//! with dynamic scheduling since subtree sizes vary widely; each worker owns a
//! reusable [`ColorContext`]. Once all of them are done, the root's three
//! edges are evaluated. Results are written back in a fixed order, so the
//! outcome does not depend on the number of workers.

use itertools::iproduct;

use crate::error::{Error, Invariant, Result};
use crate::matrix::DistanceMatrix;
use crate::parallel::ParallelConfig;
use crate::tree::{Node, NodeId, Parent, Side, TreeArena, Visitor};

/// Smallest matrix for which quartet support is defined.
pub const MIN_TAXA: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    A,
    B,
    C,
    D,
}

impl Class {
    fn slot(self) -> usize {
        match self {
            Class::A => 0,
            Class::B => 1,
            Class::C => 2,
            Class::D => 3,
        }
    }
}

/// Scratch buffer assigning each taxon to a [`Class`] for one edge at a time.
///
/// Meant to be reused: [`reset`](ColorContext::reset) puts every taxon back
/// into class D without reallocating.
#[derive(Debug, Clone)]
pub struct ColorContext {
    classes: Vec<Class>,
    members: [Vec<usize>; 4],
}

impl ColorContext {
    pub fn new(taxa: usize) -> Self {
        ColorContext {
            classes: vec![Class::D; taxa],
            members: Default::default(),
        }
    }

    pub fn reset(&mut self) {
        self.classes.fill(Class::D);
    }

    /// Assign every leaf below `subtree` to `class`.
    pub fn paint(&mut self, tree: &TreeArena, subtree: NodeId, class: Class) {
        tree.traverse(subtree, &Painter(class), &mut self.classes);
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Taxa of `class`, in taxon order, as of the last call to [`support`](ColorContext::support).
    pub fn members(&self, class: Class) -> &[usize] {
        &self.members[class.slot()]
    }

    /// Quartet support of the current coloring.
    pub fn support(&mut self, matrix: &DistanceMatrix) -> Option<f64> {
        for members in &mut self.members {
            members.clear();
        }
        for (taxon, class) in self.classes.iter().enumerate() {
            self.members[class.slot()].push(taxon);
        }

        let [a, b, c, d] = &self.members;
        quartet_support(matrix, a, b, c, d)
    }
}

struct Painter(Class);

impl Visitor for Painter {
    type Context = Vec<Class>;

    fn process(&self, tree: &TreeArena, node: NodeId, classes: &mut Vec<Class>) {
        if let Node::Leaf { taxon } = tree.node(node) {
            classes[*taxon] = self.0;
        }
    }
}

/// Fraction of quartets in `A×B×C×D` consistent with the topology `ab|cd`.
///
/// Returns `None` if any class is empty.
pub fn quartet_support(
    matrix: &DistanceMatrix,
    class_a: &[usize],
    class_b: &[usize],
    class_c: &[usize],
    class_d: &[usize],
) -> Option<f64> {
    let total = class_a.len() * class_b.len() * class_c.len() * class_d.len();
    if total == 0 {
        return None;
    }

    let m = |i: usize, j: usize| matrix.get(i, j);
    let conflicting = iproduct!(class_a, class_b, class_c, class_d)
        .filter(|&(&a, &b, &c, &d)| {
            let ab_cd = m(a, b) + m(c, d);
            m(a, c) + m(b, d) < ab_cd || m(a, d) + m(b, c) < ab_cd
        })
        .count();

    Some(1.0 - conflicting as f64 / total as f64)
}

/// Support of the split separating the leaves below `a` and `b` from the rest,
/// using the leaves below `witness` as class C.
pub fn split_support(
    tree: &TreeArena,
    matrix: &DistanceMatrix,
    ctx: &mut ColorContext,
    a: NodeId,
    b: NodeId,
    witness: NodeId,
) -> Option<f64> {
    ctx.reset();
    ctx.paint(tree, a, Class::A);
    ctx.paint(tree, b, Class::B);
    ctx.paint(tree, witness, Class::C);
    ctx.support(matrix)
}

/// Support of the edge above `child`; `None` when `child` is a leaf.
pub fn edge_support(
    tree: &TreeArena,
    matrix: &DistanceMatrix,
    ctx: &mut ColorContext,
    child: NodeId,
    witness: NodeId,
) -> Option<f64> {
    let (a, b) = tree.node(child).children()?;
    split_support(tree, matrix, ctx, a, b, witness)
}

/// Annotate every edge of `tree` using one worker per processor.
pub fn annotate(tree: &mut TreeArena, matrix: &DistanceMatrix) -> Result<()> {
    annotate_with(tree, matrix, &ParallelConfig::default())
}

/// Annotate every edge of `tree` with its quartet support.
///
/// Edges to internal nodes receive `Some(support)` in `[0, 1]`; edges to
/// leaves receive `None`.
///
/// # Errors
/// * [`Error::InsufficientTaxa`] if the matrix has fewer than four taxa.
/// * [`Invariant::LeafCountMismatch`] if the tree was not built from a matrix of this size.
/// * [`Error::ThreadPool`] if the worker pool cannot be started.
pub fn annotate_with(
    tree: &mut TreeArena,
    matrix: &DistanceMatrix,
    config: &ParallelConfig,
) -> Result<()> {
    let taxa = matrix.size();
    if taxa < MIN_TAXA {
        return Err(Error::InsufficientTaxa {
            required: MIN_TAXA,
            found: taxa,
        });
    }
    if tree.leaf_count() != taxa {
        return Err(Invariant::LeafCountMismatch {
            leaves: tree.leaf_count(),
            taxa,
        }
        .into());
    }

    let pool = config.build_pool()?;
    let nodes: Vec<NodeId> = tree.internal_nodes().collect();

    let inner = {
        let tree: &TreeArena = tree;
        config.map_init(
            &pool,
            &nodes,
            || ColorContext::new(taxa),
            |ctx, &id| match tree.node(id).children() {
                Some((left, right)) => (
                    edge_support(tree, matrix, ctx, left, right),
                    edge_support(tree, matrix, ctx, right, left),
                ),
                None => (None, None),
            },
        )
    };
    for (&id, (left, right)) in nodes.iter().zip(inner) {
        tree.set_support(Parent::Node(id), Side::Left, left);
        tree.set_support(Parent::Node(id), Side::Right, right);
    }

    let root = *tree.root();
    let root_edges = [
        (Side::Left, root.left.child, root.right.child),
        (Side::Right, root.right.child, root.left.child),
        (Side::Extra, root.extra.child, root.left.child),
    ];
    let outer = {
        let tree: &TreeArena = tree;
        config.map_init(
            &pool,
            &root_edges,
            || ColorContext::new(taxa),
            |ctx, &(_, child, witness)| edge_support(tree, matrix, ctx, child, witness),
        )
    };
    for (&(side, _, _), support) in root_edges.iter().zip(outer) {
        tree.set_support(Parent::Root, side, support);
    }

    Ok(())
}

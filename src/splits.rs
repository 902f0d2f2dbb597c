//! Extract the supported splits of an annotated tree.
//!
//! # What is a split?
//! Removing an edge divides the leaves into two groups. For the edge above
//! an internal node `u` we record the group below `u`:
//! ```text
//!      root
//!     /  |  \
//!    u   C   D
//!   / \
//!  A   B      ← edge above u creates the split {A,B} | {C,D}
//! ```
//!
//! Only edges that carry a support value produce a split, so trivial
//! single-leaf splits never appear.
//!
//! # Order
//! Splits are listed in the order the consensus report prints them: an
//! in-order walk that treats the root as a binary node over its left and
//! right subtrees, followed by the extra subtree and finally the root's extra
//! edge.

use crate::bitset::Bitset;
use crate::tree::{Branch, Node, NodeId, Parent, Side, TreeArena, Visitor};

/// One side of a supported split together with the edge that induces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub parent: Parent,
    pub side: Side,
    /// Taxa below the edge.
    pub members: Bitset,
    pub support: f64,
}

/// All splits with a support value, in report order.
pub fn supported_splits(tree: &TreeArena) -> Vec<Split> {
    let mut splits = Vec::new();
    let root = tree.root();

    tree.traverse(root.left.child, &SplitCollector, &mut splits);
    push_split(tree, &mut splits, Parent::Root, Side::Left, &root.left);
    push_split(tree, &mut splits, Parent::Root, Side::Right, &root.right);
    tree.traverse(root.right.child, &SplitCollector, &mut splits);
    tree.traverse(root.extra.child, &SplitCollector, &mut splits);
    push_split(tree, &mut splits, Parent::Root, Side::Extra, &root.extra);

    splits
}

struct SplitCollector;

impl Visitor for SplitCollector {
    type Context = Vec<Split>;

    fn process(&self, tree: &TreeArena, node: NodeId, splits: &mut Vec<Split>) {
        if let Node::Internal { left, right } = tree.node(node) {
            push_split(tree, splits, Parent::Node(node), Side::Left, left);
            push_split(tree, splits, Parent::Node(node), Side::Right, right);
        }
    }
}

fn push_split(tree: &TreeArena, splits: &mut Vec<Split>, parent: Parent, side: Side, branch: &Branch) {
    if let Some(support) = branch.support {
        splits.push(Split {
            parent,
            side,
            members: Bitset::from_taxa(tree.leaf_count(), tree.leaves_under(branch.child)),
            support,
        });
    }
}

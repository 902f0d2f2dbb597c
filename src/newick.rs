//! Annotated Newick output.
//!
//! Leaves are written by taxon name and every edge carries its length with
//! six decimals. An edge whose lower node has at least one internal child is
//! prefixed with its support as an integer percentage; edges above a cherry
//! (two leaves) and edges above a leaf are left unlabeled:
//!
//! ```text
//! (((A:1.000000,B:1.000000):0.500000,C:1.000000)87:1.500000,D:1.000000,E:2.000000);
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::tree::{Branch, Node, NodeId, TreeArena, Visitor};

/// Render `tree` as a single Newick line, terminated by `;` (no newline).
///
/// `names` maps taxon index to label and must cover every leaf.
pub fn to_newick(tree: &TreeArena, names: &[String]) -> String {
    let writer = NewickWriter { names };
    let root = tree.root();
    let mut out = String::new();

    out.push('(');
    for (k, branch) in [&root.left, &root.right, &root.extra].into_iter().enumerate() {
        if k > 0 {
            out.push(',');
        }
        tree.traverse(branch.child, &writer, &mut out);
        push_edge(tree, branch, &mut out);
    }
    out.push_str(");");
    out
}

/// Write the Newick line for `tree` followed by a newline.
pub fn write_newick<W: Write>(out: &mut W, tree: &TreeArena, names: &[String]) -> io::Result<()> {
    writeln!(out, "{}", to_newick(tree, names))
}

struct NewickWriter<'a> {
    names: &'a [String],
}

impl Visitor for NewickWriter<'_> {
    type Context = String;

    fn pre(&self, tree: &TreeArena, node: NodeId, out: &mut String) {
        if !tree.node(node).is_leaf() {
            out.push('(');
        }
    }

    fn process(&self, tree: &TreeArena, node: NodeId, out: &mut String) {
        match tree.node(node) {
            Node::Leaf { taxon } => out.push_str(&self.names[*taxon]),
            Node::Internal { left, .. } => {
                push_edge(tree, left, out);
                out.push(',');
            }
        }
    }

    fn post(&self, tree: &TreeArena, node: NodeId, out: &mut String) {
        if let Node::Internal { right, .. } = tree.node(node) {
            push_edge(tree, right, out);
            out.push(')');
        }
    }
}

/// Append `[support]:length` for the edge `branch`.
fn push_edge(tree: &TreeArena, branch: &Branch, out: &mut String) {
    let has_internal_grandchild = tree
        .node(branch.child)
        .children()
        .is_some_and(|(l, r)| !tree.node(l).is_leaf() || !tree.node(r).is_leaf());

    if has_internal_grandchild {
        if let Some(support) = branch.support {
            let _ = write!(out, "{}", (support * 100.0).round() as i64);
        }
    }
    let _ = write!(out, ":{:.6}", branch.length);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Parent, Side, TreeBuilder};

    fn names(n: usize) -> Vec<String> {
        ["A", "B", "C", "D", "E", "F", "G"][..n]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_star() {
        let tree = TreeBuilder::new(3).unwrap().finish(
            Branch::new(0, 1.0),
            Branch::new(1, 2.0),
            Branch::new(2, 0.25),
        );
        assert_eq!(to_newick(&tree, &names(3)), "(A:1.000000,B:2.000000,C:0.250000);");
    }

    #[test]
    fn test_labels_only_above_internal_grandchildren() {
        let mut b = TreeBuilder::new(5).unwrap();
        let u5 = b.join(Branch::new(0, 1.0), Branch::new(1, 1.0));
        let u6 = b.join(Branch::new(u5, 0.5), Branch::new(2, 1.0));
        let mut tree = b.finish(Branch::new(u6, 1.5), Branch::new(3, 1.0), Branch::new(4, 2.0));
        tree.set_support(Parent::Node(u6), Side::Left, Some(0.9));
        tree.set_support(Parent::Root, Side::Left, Some(0.866));

        assert_eq!(
            to_newick(&tree, &names(5)),
            "(((A:1.000000,B:1.000000):0.500000,C:1.000000)87:1.500000,D:1.000000,E:2.000000);"
        );
    }

    #[test]
    fn test_write_newick_appends_newline() {
        let tree = TreeBuilder::new(3).unwrap().finish(
            Branch::new(0, 1.0),
            Branch::new(1, 1.0),
            Branch::new(2, 1.0),
        );
        let mut buf = Vec::new();
        write_newick(&mut buf, &tree, &names(3)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "(A:1.000000,B:1.000000,C:1.000000);\n"
        );
    }
}

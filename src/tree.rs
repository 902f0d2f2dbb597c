//! Arena-backed unrooted binary tree with a trifurcating root.
//!
//! # Layout
//! All nodes live in one pre-sized `Vec<Node>` and refer to each other by
//! [`NodeId`] (an index into that vector), never by pointer. Leaves occupy the
//! first `n` slots, so the leaf for taxon `i` always has id `i`. Internal nodes
//! are appended in the order they are joined. The root is not stored in the
//! arena: it is a separate [`Root`] record with three children.
//!
//! ```text
//!              root
//!           /   |    \
//!        left extra  right
//!        /  \
//!       A    B
//! ```
//!
//! # Traversal
//! [`TreeArena::traverse`] walks a subtree depth-first and calls the
//! [`Visitor`] hooks in the order pre, left subtree, process, right subtree,
//! post. The context is an explicit `&mut` value owned by the caller, so
//! walks over disjoint subtrees can run on different threads against the same
//! `&TreeArena`.

use crate::error::Result;

/// Index of a node in a [`TreeArena`].
pub type NodeId = usize;

/// An edge from a parent down to `child`.
///
/// `support` is `None` until the support phase has run, and stays `None` for
/// edges where no quartet test applies (e.g. edges leading to a leaf).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub child: NodeId,
    pub length: f64,
    pub support: Option<f64>,
}

impl Branch {
    pub fn new(child: NodeId, length: f64) -> Self {
        Branch {
            child,
            length,
            support: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Leaf { taxon: usize },
    Internal { left: Branch, right: Branch },
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Ids of the two children, or `None` for a leaf.
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right } => Some((left.child, right.child)),
        }
    }
}

/// Which of a parent's branches an edge is. `Extra` only exists at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Extra,
}

/// The upper end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Root,
    Node(NodeId),
}

/// A branch together with the position it hangs from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub parent: Parent,
    pub side: Side,
    pub branch: Branch,
}

/// The trifurcation left over after the last neighbor-joining step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub left: Branch,
    pub right: Branch,
    pub extra: Branch,
}

impl Root {
    pub fn branch(&self, side: Side) -> &Branch {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
            Side::Extra => &self.extra,
        }
    }

    fn branch_mut(&mut self, side: Side) -> &mut Branch {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
            Side::Extra => &mut self.extra,
        }
    }
}

/// Hooks invoked by [`TreeArena::traverse`].
///
/// All hooks default to doing nothing; implement only the ones needed.
pub trait Visitor {
    type Context;

    fn pre(&self, _tree: &TreeArena, _node: NodeId, _ctx: &mut Self::Context) {}
    fn process(&self, _tree: &TreeArena, _node: NodeId, _ctx: &mut Self::Context) {}
    fn post(&self, _tree: &TreeArena, _node: NodeId, _ctx: &mut Self::Context) {}
}

/// A fully built tree: `n` leaves, `n - 3` binary internal nodes and a root.
#[derive(Debug, Clone)]
pub struct TreeArena {
    nodes: Vec<Node>,
    leaves: usize,
    root: Root,
}

impl TreeArena {
    /// Number of leaves (taxa).
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Number of binary internal nodes, not counting the root.
    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaves
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Ids of the binary internal nodes in join order.
    pub fn internal_nodes(&self) -> std::ops::Range<NodeId> {
        self.leaves..self.nodes.len()
    }

    /// Every edge of the tree: internal nodes' branches in join order, then the
    /// root's left, right and extra branches.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(2 * self.internal_count() + 3);
        for id in self.internal_nodes() {
            if let Node::Internal { left, right } = self.nodes[id] {
                edges.push(Edge {
                    parent: Parent::Node(id),
                    side: Side::Left,
                    branch: left,
                });
                edges.push(Edge {
                    parent: Parent::Node(id),
                    side: Side::Right,
                    branch: right,
                });
            }
        }
        for side in [Side::Left, Side::Right, Side::Extra] {
            edges.push(Edge {
                parent: Parent::Root,
                side,
                branch: *self.root.branch(side),
            });
        }
        edges
    }

    /// The branch hanging from `parent` on `side`.
    ///
    /// Panics if `parent` is a leaf, or if `side` is `Extra` on a non-root node.
    pub fn branch(&self, parent: Parent, side: Side) -> &Branch {
        match (parent, side) {
            (Parent::Root, side) => self.root.branch(side),
            (Parent::Node(id), Side::Left) => match &self.nodes[id] {
                Node::Internal { left, .. } => left,
                Node::Leaf { .. } => panic!("leaf {id} has no branches"),
            },
            (Parent::Node(id), Side::Right) => match &self.nodes[id] {
                Node::Internal { right, .. } => right,
                Node::Leaf { .. } => panic!("leaf {id} has no branches"),
            },
            (Parent::Node(id), Side::Extra) => panic!("node {id} has no extra branch"),
        }
    }

    /// Overwrite the support value of one edge. Topology and lengths are untouched.
    pub fn set_support(&mut self, parent: Parent, side: Side, support: Option<f64>) {
        let branch = match (parent, side) {
            (Parent::Root, side) => self.root.branch_mut(side),
            (Parent::Node(id), side) => match (&mut self.nodes[id], side) {
                (Node::Internal { left, .. }, Side::Left) => left,
                (Node::Internal { right, .. }, Side::Right) => right,
                _ => panic!("node {id} has no {side:?} branch"),
            },
        };
        branch.support = support;
    }

    /// Depth-first walk of the subtree below `start`.
    ///
    /// Calls `pre`, walks the left child, calls `process`, walks the right child
    /// and finally calls `post`. Uses an explicit stack, so deep caterpillar
    /// trees do not exhaust the call stack.
    pub fn traverse<V: Visitor>(&self, start: NodeId, visitor: &V, ctx: &mut V::Context) {
        enum Step {
            Enter(NodeId),
            Process(NodeId),
            Leave(NodeId),
        }

        let mut stack = vec![Step::Enter(start)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => {
                    visitor.pre(self, node, ctx);
                    stack.push(Step::Leave(node));
                    match self.nodes[node].children() {
                        Some((left, right)) => {
                            stack.push(Step::Enter(right));
                            stack.push(Step::Process(node));
                            stack.push(Step::Enter(left));
                        }
                        None => stack.push(Step::Process(node)),
                    }
                }
                Step::Process(node) => visitor.process(self, node, ctx),
                Step::Leave(node) => visitor.post(self, node, ctx),
            }
        }
    }

    /// Taxon indices of all leaves below `node`, in left-to-right order.
    pub fn leaves_under(&self, node: NodeId) -> Vec<usize> {
        let mut taxa = Vec::new();
        self.traverse(node, &LeafCollector, &mut taxa);
        taxa
    }

    /// Leaf-to-leaf path lengths through the tree.
    ///
    /// Entry `[i][j]` is the sum of branch lengths on the path between taxa `i`
    /// and `j`. For an additive input matrix this reproduces the input.
    pub fn path_distances(&self) -> Vec<Vec<f64>> {
        // root gets the id one past the arena
        let root_id = self.nodes.len();
        let mut adjacent: Vec<Vec<(NodeId, f64)>> = vec![Vec::new(); root_id + 1];
        let mut link = |a: NodeId, b: &Branch| {
            adjacent[a].push((b.child, b.length));
            adjacent[b.child].push((a, b.length));
        };
        for id in self.internal_nodes() {
            if let Node::Internal { left, right } = &self.nodes[id] {
                link(id, left);
                link(id, right);
            }
        }
        link(root_id, &self.root.left);
        link(root_id, &self.root.right);
        link(root_id, &self.root.extra);

        let mut out = vec![vec![0.0; self.leaves]; self.leaves];
        let mut dist = vec![0.0; root_id + 1];
        for (from, row) in out.iter_mut().enumerate() {
            let mut stack = vec![(from, usize::MAX)];
            dist[from] = 0.0;
            while let Some((node, came_from)) = stack.pop() {
                for &(next, length) in &adjacent[node] {
                    if next == came_from {
                        continue;
                    }
                    dist[next] = dist[node] + length;
                    stack.push((next, node));
                }
            }
            row.copy_from_slice(&dist[..self.leaves]);
        }
        out
    }
}

struct LeafCollector;

impl Visitor for LeafCollector {
    type Context = Vec<usize>;

    fn process(&self, tree: &TreeArena, node: NodeId, taxa: &mut Vec<usize>) {
        if let Node::Leaf { taxon } = tree.node(node) {
            taxa.push(*taxon);
        }
    }
}

/// Incremental construction of a [`TreeArena`].
///
/// Leaves `0..n` exist from the start; internal nodes are added with
/// [`join`](TreeBuilder::join) and the tree is closed with the three
/// remaining subtrees in [`finish`](TreeBuilder::finish).
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    leaves: usize,
}

impl TreeBuilder {
    /// Prepare an arena for `leaves` taxa.
    ///
    /// # Errors
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the arena
    /// cannot be reserved.
    pub fn new(leaves: usize) -> Result<Self> {
        let mut nodes = Vec::new();
        nodes.try_reserve_exact((2 * leaves).saturating_sub(1))?;
        nodes.extend((0..leaves).map(|taxon| Node::Leaf { taxon }));
        Ok(TreeBuilder { nodes, leaves })
    }

    /// Add an internal node above `left` and `right` and return its id.
    pub fn join(&mut self, left: Branch, right: Branch) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::Internal { left, right });
        id
    }

    /// Close the tree with a trifurcating root.
    pub fn finish(self, left: Branch, right: Branch, extra: Branch) -> TreeArena {
        TreeArena {
            nodes: self.nodes,
            leaves: self.leaves,
            root: Root { left, right, extra },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///            root
    ///         /   |    \
    ///       u6    C:1   D:2
    ///      /  \
    ///    u5    E:1
    ///   /  \
    ///  A:1  B:2
    /// ```
    /// Leaves A=0, B=1, C=2, D=3, E=4; u5 hangs at 0.5, u6 at 1.5.
    pub(crate) fn sample_tree() -> TreeArena {
        let mut builder = TreeBuilder::new(5).unwrap();
        let u5 = builder.join(Branch::new(0, 1.0), Branch::new(1, 2.0));
        let u6 = builder.join(Branch::new(u5, 0.5), Branch::new(4, 1.0));
        builder.finish(Branch::new(u6, 1.5), Branch::new(2, 1.0), Branch::new(3, 2.0))
    }

    struct Recorder;

    impl Visitor for Recorder {
        type Context = Vec<String>;

        fn pre(&self, _tree: &TreeArena, node: NodeId, ctx: &mut Vec<String>) {
            ctx.push(format!("pre{node}"));
        }
        fn process(&self, _tree: &TreeArena, node: NodeId, ctx: &mut Vec<String>) {
            ctx.push(format!("in{node}"));
        }
        fn post(&self, _tree: &TreeArena, node: NodeId, ctx: &mut Vec<String>) {
            ctx.push(format!("post{node}"));
        }
    }

    #[test]
    fn test_counts() {
        let tree = sample_tree();
        assert_eq!(tree.leaf_count(), 5);
        assert_eq!(tree.internal_count(), 2);
        assert_eq!(tree.internal_nodes(), 5..7);
        assert_eq!(tree.edges().len(), 7);
    }

    #[test]
    fn test_traversal_order() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        tree.traverse(6, &Recorder, &mut seen);
        assert_eq!(
            seen,
            vec![
                "pre6", "pre5", "pre0", "in0", "post0", "in5", "pre1", "in1", "post1", "post5",
                "in6", "pre4", "in4", "post4", "post6",
            ]
        );
    }

    #[test]
    fn test_leaves_under() {
        let tree = sample_tree();
        assert_eq!(tree.leaves_under(6), vec![0, 1, 4]);
        assert_eq!(tree.leaves_under(5), vec![0, 1]);
        assert_eq!(tree.leaves_under(3), vec![3]);
    }

    #[test]
    fn test_path_distances() {
        let tree = sample_tree();
        let d = tree.path_distances();
        assert_eq!(d[0][1], 3.0);
        assert_eq!(d[0][4], 2.5);
        assert_eq!(d[0][2], 1.0 + 0.5 + 1.5 + 1.0);
        assert_eq!(d[2][3], 3.0);
        for i in 0..5 {
            assert_eq!(d[i][i], 0.0);
            for j in 0..5 {
                assert_eq!(d[i][j], d[j][i]);
            }
        }
    }

    #[test]
    fn test_set_support() {
        let mut tree = sample_tree();
        tree.set_support(Parent::Node(6), Side::Left, Some(0.75));
        tree.set_support(Parent::Root, Side::Left, Some(1.0));

        assert_eq!(tree.branch(Parent::Node(6), Side::Left).support, Some(0.75));
        assert_eq!(tree.branch(Parent::Node(6), Side::Right).support, None);
        assert_eq!(tree.root().left.support, Some(1.0));
        assert_eq!(tree.root().left.length, 1.5);
    }
}

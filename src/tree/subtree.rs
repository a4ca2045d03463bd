//! Subtree Submodule (of Tree)
//!
//! Projects a tree onto the rows of a node and everything below it. The
//! node's own row keeps its parent, which becomes the implicit root of the
//! extracted tree. A node with nothing below it (a leaf, or a name not in
//! the tree) has no subtree.
//!
use std::collections::HashSet;

use crate::tree::Edge;
use crate::tree::TreeError;
use crate::tree::TreeModel;

// --------------------------- PUBLIC
pub(crate) fn subtree(tree: &TreeModel, node: &str) -> Result<TreeModel, TreeError> {
    let mut members: HashSet<String> = tree.descendants(node, false)?.into_iter().collect();
    if members.is_empty() {
        return Err(TreeError::NodeNotFound(node.to_owned()));
    }
    members.insert(node.to_owned());
    let edges: Vec<Edge> = tree
        .edges()
        .iter()
        .filter(|edge| members.contains(&edge.child))
        .cloned()
        .collect();
    TreeModel::new(edges)
}

//! Simplify Submodule (of Tree)
//!
//! A pass-through node has exactly one child. Pruned subtrees are full of
//! them; simplifying links the parent of such a node directly to its child
//! and drops the node.
//!
use itertools::Itertools;
use log::debug;

use crate::tree::TreeError;
use crate::tree::TreeModel;
use crate::tree::ROOT_SENTINEL;

// --------------------------- PUBLIC
pub(crate) fn simplify(tree: &TreeModel, skip_nodes: Option<Vec<String>>) -> Result<(TreeModel, Vec<String>), TreeError> {
    let skip_nodes = skip_nodes.unwrap_or_else(|| pass_through_nodes(tree));
    let mut edges = tree.edges().to_vec();
    for node in &skip_nodes {
        //row-less nodes are roots, so are rows on the sentinel
        let Some(row) = edges.iter().position(|edge| edge.child == *node) else {
            continue;
        };
        if edges[row].is_root() {
            continue;
        }
        let parent = edges[row].parent.clone();
        debug!("remove {} and link its children to {}", node, parent);
        for edge in edges.iter_mut().filter(|edge| edge.parent == *node) {
            edge.parent.clone_from(&parent);
        }
        edges.remove(row);
    }
    Ok((TreeModel::new(edges)?, skip_nodes))
}

/// Parents (sentinel excluded) occurring in exactly one row, in order of first appearance
pub fn pass_through_nodes(tree: &TreeModel) -> Vec<String> {
    let parents = || {
        tree.edges()
            .iter()
            .map(|edge| edge.parent.as_str())
            .filter(|parent| *parent != ROOT_SENTINEL)
    };
    let counts = parents().counts();
    parents()
        .unique()
        .filter(|parent| counts[parent] == 1)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Edge;

    #[test]
    fn chain_of_pass_through_nodes_collapses() {
        //R - P - Q - {q1, q2}, R - r1
        let tree = TreeModel::new(vec![
            Edge::new_leaf("q1", "Q", 0.0),
            Edge::new_leaf("q2", "Q", 1.0),
            Edge::new_leaf("r1", "R", 2.0),
            Edge::new_internal("Q", "P", 0.5, 1.0),
            Edge::new_internal("P", "R", 0.5, 2.0),
            Edge::new_internal("R", ROOT_SENTINEL, 1.25, 3.0),
        ])
        .unwrap();
        let (simple, removed) = simplify(&tree, None).unwrap();
        assert_eq!(removed, vec!["P"]);
        assert!(!simple.contains("P"));
        assert_eq!(simple.parent_of("Q"), Some("R"));
        assert_eq!(simple.len(), 5);
    }

    #[test]
    fn root_with_single_child_stays() {
        let tree = TreeModel::new(vec![
            Edge::new_leaf("a", "A", 0.0),
            Edge::new_leaf("b", "A", 1.0),
            Edge::new_internal("A", "R", 0.5, 1.0),
            Edge::new_internal("R", ROOT_SENTINEL, 0.5, 2.0),
        ])
        .unwrap();
        let (simple, removed) = simplify(&tree, None).unwrap();
        assert_eq!(removed, vec!["R"]);
        assert_eq!(simple, tree);
    }

    #[test]
    fn explicit_skip_nodes_are_used() {
        let tree = TreeModel::new(vec![
            Edge::new_leaf("a", "A", 0.0),
            Edge::new_leaf("b", "B", 1.0),
            Edge::new_internal("A", "R", 0.0, 1.0),
            Edge::new_internal("B", "R", 1.0, 1.0),
        ])
        .unwrap();
        let (simple, removed) = simplify(&tree, Some(vec!["A".to_owned()])).unwrap();
        assert_eq!(removed, vec!["A"]);
        assert_eq!(simple.parent_of("a"), Some("R"));
        assert_eq!(simple.parent_of("b"), Some("B"));
    }
}

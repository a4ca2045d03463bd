//! Traversal Submodule (of Tree)
//!
//! Descendant (breadth-first, downward) and ancestor (upward) enumeration.
//!
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::tree::MalformedTree;
use crate::tree::TreeError;
use crate::tree::TreeModel;

// --------------------------- PUBLIC
pub(crate) fn descendants(tree: &TreeModel, node: &str, leafonly: bool) -> Result<Vec<String>, TreeError> {
    let child_map = tree.child_map();
    let mut result = vec![];
    let mut seen: HashSet<&str> = HashSet::from([node]);
    let mut work_list: VecDeque<&str> = child_map.get(node).cloned().unwrap_or_default().into();
    while let Some(cur) = work_list.pop_front() {
        if !seen.insert(cur) {
            return Err(MalformedTree::Cycle(cur.to_owned()).into());
        }
        result.push(cur.to_owned());
        if let Some(children) = child_map.get(cur) {
            work_list.extend(children);
        }
    }
    if leafonly {
        result.retain(|name| tree.is_leaf(name));
    }
    Ok(result)
}
pub(crate) fn all_descendants(tree: &TreeModel, leafonly: bool) -> Result<Vec<(String, Vec<String>)>, TreeError> {
    tree.nodes()
        .into_iter()
        .map(|name| Ok((name.to_owned(), descendants(tree, name, leafonly)?)))
        .collect()
}
pub(crate) fn ancestors(tree: &TreeModel, node: &str, rootnode: Option<&str>) -> Result<Vec<String>, TreeError> {
    if !tree.contains(node) {
        return Err(TreeError::NodeNotFound(node.to_owned()));
    }
    let mut result = vec![];
    let mut cur = node;
    while let Some(parent) = tree.parent_of(cur) {
        if rootnode == Some(parent) {
            break;
        }
        //a walk longer than the tree went around a cycle
        if result.len() >= tree.len() {
            return Err(MalformedTree::Cycle(parent.to_owned()).into());
        }
        result.push(parent.to_owned());
        cur = parent;
    }
    Ok(result)
}

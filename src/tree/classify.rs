//! Classify Submodule (of Tree)
//!
//! A classification is a set of nodes partitioning the leaves below a root:
//! starting from the root alone, any node of the set may be replaced by its
//! children. The number of classifications grows exponentially with the
//! tree, so this is meant for small subtrees.
//!
use std::collections::HashSet;

use crate::tree::TreeError;
use crate::tree::TreeModel;

// --------------------------- PUBLIC
pub(crate) fn valid_classifications(tree: &TreeModel, root: &str) -> Result<Vec<Vec<String>>, TreeError> {
    if !tree.contains(root) {
        return Err(TreeError::NodeNotFound(root.to_owned()));
    }
    let child_map = tree.child_map();
    let start = vec![root.to_owned()];
    let mut seen: HashSet<Vec<String>> = HashSet::from([start.clone()]);
    let mut result = vec![];
    let mut work_list = vec![start];
    while let Some(current) = work_list.pop() {
        let mut expanded = vec![];
        for (i, name) in current.iter().enumerate() {
            let Some(children) = child_map.get(name.as_str()) else {
                continue;
            };
            let mut next: Vec<String> = current
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i)
                .map(|(_, other)| other.clone())
                .chain(children.iter().map(|child| child.to_string()))
                .collect();
            next.sort();
            if seen.insert(next.clone()) {
                expanded.push(next);
            }
        }
        result.push(current);
        //reversed so the first expansion is explored next
        work_list.extend(expanded.into_iter().rev());
    }
    Ok(result)
}

//! Layout Submodule (of Tree)
//!
//! Recomputes horizontal positions after the leaf set changed: leaves are
//! spread evenly keeping their left-to-right order, internal nodes sit at the
//! mean position of the leaves below them. Heights are left alone.
//!
use std::collections::HashMap;

use itertools::Itertools;

use crate::tree::TreeError;
use crate::tree::TreeModel;

// --------------------------- PUBLIC
pub(crate) fn update_layout(tree: &mut TreeModel) -> Result<(), TreeError> {
    //leaves ranked by current x, ties keep row order
    let leaf_rows: Vec<usize> = tree
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.isleaf)
        .sorted_by(|(_, a), (_, b)| a.x.total_cmp(&b.x))
        .map(|(row, _)| row)
        .collect();
    let mut leaf_x: HashMap<String, f64> = HashMap::with_capacity(leaf_rows.len());
    for (rank, row) in leaf_rows.into_iter().enumerate() {
        leaf_x.insert(tree.edges()[row].child.clone(), rank as f64);
    }
    //internal x only reads leaf x, so the order of updates is free
    let mut internal_x: Vec<(usize, f64)> = vec![];
    for (row, edge) in tree.edges().iter().enumerate().filter(|(_, edge)| !edge.isleaf) {
        let below = tree.descendants(&edge.child, true)?;
        if below.is_empty() {
            continue;
        }
        let sum: f64 = below.iter().filter_map(|leaf| leaf_x.get(leaf)).sum();
        internal_x.push((row, sum / below.len() as f64));
    }
    let edges = tree.edges_mut();
    for edge in edges.iter_mut().filter(|edge| edge.isleaf) {
        if let Some(&x) = leaf_x.get(&edge.child) {
            edge.x = x;
        }
    }
    for (row, x) in internal_x {
        edges[row].x = x;
    }
    Ok(())
}

//! Merge Submodule (of Tree)
//!
//! A merge collapses all children of an internal node into that node. Ordered
//! by height, lowest first, the merges of a tree describe successive
//! horizontal cuts of the dendrogram.
//!
//! `merge` submodule derives the merge sequence of a tree and applies a
//! prefix of it to an array of sample labels.
//!
//! This module contains the types: `MergeRecord`, `MergeReport`,
//! `MergeSequenceExhausted`
//!
use std::collections::BTreeSet;

use itertools::Itertools;
use log::debug;
use log::warn;
use thiserror::Error;

use crate::tree::TreeModel;
use crate::tree::ROOT_SENTINEL;

/// Roots merge after everything else: their height is the tree maximum plus this.
const ROOT_MERGE_OFFSET: f64 = 1.0;

/// One step of the merge sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord {
    /// labels consumed by this merge
    pub children: BTreeSet<String>,
    /// label they collapse into
    pub parent: String,
    /// distinct labels left after this merge, starting from the leaf set
    pub remaining: usize,
}

/// More merges were requested than the sequence holds.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("requested {requested} merges but only {available} are available")]
pub struct MergeSequenceExhausted {
    pub requested: usize,
    pub available: usize,
}

/// Outcome of `apply_merges`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub requested: usize,
    pub applied: usize,
    pub exhausted: Option<MergeSequenceExhausted>,
}

// --------------------------- PUBLIC
pub(crate) fn merge_sequence(tree: &TreeModel) -> Vec<MergeRecord> {
    let child_map = tree.child_map();
    let root_height = tree.max_height() + ROOT_MERGE_OFFSET;
    let mut candidates: Vec<(&str, f64)> = tree
        .edges()
        .iter()
        .map(|edge| edge.parent.as_str())
        .filter(|parent| *parent != ROOT_SENTINEL && !tree.is_leaf(parent))
        .unique()
        .map(|parent| (parent, merge_height(tree, parent, root_height)))
        .collect();
    //stable: equal heights keep row order
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    //the last candidate is never merged away
    let n_merges = candidates.len().saturating_sub(1);
    let mut remaining = tree.leaves().len();
    candidates
        .into_iter()
        .take(n_merges)
        .map(|(parent, _)| {
            let children: BTreeSet<String> = child_map
                .get(parent)
                .map(|children| children.iter().map(|child| child.to_string()).collect())
                .unwrap_or_default();
            remaining = (remaining + 1).saturating_sub(children.len());
            MergeRecord {
                children,
                parent: parent.to_owned(),
                remaining,
            }
        })
        .collect()
}

/// Applies the first `n_merges` records of `merges`, in order, relabelling
/// every label equal to a merged child into its parent.
/// # Arguments
/// * `labels` - sample labels, rewritten in place
/// * `merges` - output of `TreeModel::merge_sequence`
/// * `n_merges` - merges to apply; clamped to the sequence length
///
/// Asking for more merges than available is not an error: all merges are
/// applied and the shortfall is reported in the returned `MergeReport`.
pub fn apply_merges(labels: &mut [String], merges: &[MergeRecord], n_merges: usize) -> MergeReport {
    let applied = n_merges.min(merges.len());
    for record in &merges[..applied] {
        for child in &record.children {
            let mut moved = 0;
            for label in labels.iter_mut().filter(|label| label.as_str() == child.as_str()) {
                label.clone_from(&record.parent);
                moved += 1;
            }
            debug!("{} in {} --> {}", moved, child, record.parent);
        }
    }
    let exhausted = (n_merges > merges.len()).then_some(MergeSequenceExhausted {
        requested: n_merges,
        available: merges.len(),
    });
    if let Some(shortfall) = &exhausted {
        warn!("{shortfall}; stopped after {applied} merges");
    }
    MergeReport {
        requested: n_merges,
        applied,
        exhausted,
    }
}

// --------------------------- helpers
fn merge_height(tree: &TreeModel, name: &str, root_height: f64) -> f64 {
    match tree.edge(name) {
        Some(edge) if !edge.is_root() => edge.y,
        _ => root_height,
    }
}

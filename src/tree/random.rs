//! Random Submodule (of Tree)
//!
//! Generates random binary dendrograms by agglomeration: clusters are joined
//! two at a time in random order, each join strictly higher than the last,
//! so every generated tree is a valid ultrametric dendrogram.
//!
use rand::seq::SliceRandom;
use rand::Rng;

use crate::tree::Edge;
use crate::tree::TreeError;
use crate::tree::TreeModel;
use crate::tree::DEFAULT_COLOR;
use crate::tree::ROOT_SENTINEL;

// --------------------------- PUBLIC
/// Generates a random dendrogram with `n_leaves` leaves named `leaf0..`
/// and internal nodes named `n0..` in merge order; the root hangs from the
/// sentinel.
/// # Arguments
/// * `n_leaves` - number of leaves, at least 2
/// * `rng` - source of randomness; seed it for reproducible trees
///
/// # Panics
/// Panics if `n_leaves < 2`.
pub fn random_dendrogram<R: Rng>(n_leaves: usize, rng: &mut R) -> Result<TreeModel, TreeError> {
    assert!(n_leaves >= 2, "cannot construct a dendrogram with less than 2 leaves");
    let v = 2 * n_leaves - 1;
    let mut names: Vec<String> = Vec::with_capacity(v);
    let mut xs: Vec<f64> = Vec::with_capacity(v);
    let mut ys: Vec<f64> = Vec::with_capacity(v);
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(v);
    //leaves at shuffled positions
    let mut positions: Vec<usize> = (0..n_leaves).collect();
    positions.shuffle(rng);
    for (i, position) in positions.into_iter().enumerate() {
        names.push(format!("leaf{i}"));
        xs.push(position as f64);
        ys.push(0.0);
        parents.push(None);
    }
    //------------------------join clusters
    let mut active: Vec<usize> = (0..n_leaves).collect();
    let mut height = 0.0;
    while active.len() > 1 {
        let a = active.swap_remove(rng.gen_range(0..active.len()));
        let b = active.swap_remove(rng.gen_range(0..active.len()));
        height += rng.gen_range(0.1..1.0);
        let id = names.len();
        names.push(format!("n{}", id - n_leaves));
        xs.push((xs[a] + xs[b]) / 2.0);
        ys.push(height);
        parents.push(None);
        parents[a] = Some(id);
        parents[b] = Some(id);
        active.push(id);
    }
    let edges = (0..names.len())
        .map(|i| Edge {
            x: xs[i],
            y: ys[i],
            isleaf: i < n_leaves,
            child: names[i].clone(),
            parent: parents[i].map_or_else(|| ROOT_SENTINEL.to_owned(), |p| names[p].clone()),
            color: DEFAULT_COLOR.to_owned(),
        })
        .collect();
    TreeModel::new(edges)
}

//! Cophenetic Submodule (of Tree)
//!
//! The cophenetic distance of two leaves is the height of their lowest common
//! ancestor. On a dendrogram whose heights grow towards the root the
//! resulting matrix is an ultrametric.
//!
//! This module contains the type: `DistanceMatrix`
//!
use std::collections::HashSet;
use std::fmt::Display;

use itertools::Itertools;

use crate::tree::TreeError;
use crate::tree::TreeModel;

/// Square, label-indexed matrix of non-negative distances
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<String>,

    /// row-major, labels.len() squared
    values: Vec<f64>,
}

// --------------------------- PUBLIC
pub(crate) fn cophenetic_distances(tree: &TreeModel) -> Result<DistanceMatrix, TreeError> {
    let leaves = tree.leaves();
    //leaf first, then its ancestors upwards
    let chains: Vec<Vec<String>> = leaves
        .iter()
        .map(|leaf| ancestor_chain(tree, leaf))
        .collect::<Result<_, _>>()?;
    let members: Vec<HashSet<&str>> = chains
        .iter()
        .map(|chain| chain.iter().map(String::as_str).collect())
        .collect();
    let mut matrix = DistanceMatrix::zeros(leaves.iter().map(|leaf| leaf.to_string()).collect());
    //diagonal: a leaf is its own lca, leaves have height 0
    for (i, j) in (0..leaves.len()).tuple_combinations() {
        let lca = first_common(&chains[i], &members[j])
            .ok_or_else(|| TreeError::NoCommonAncestor(leaves[i].to_owned(), leaves[j].to_owned()))?;
        let height = tree
            .height(lca)
            .ok_or_else(|| TreeError::MissingHeight(lca.to_owned()))?;
        matrix.set(i, j, height);
        matrix.set(j, i, height);
    }
    Ok(matrix)
}
pub(crate) fn lowest_common_ancestor(tree: &TreeModel, a: &str, b: &str) -> Result<String, TreeError> {
    let chain_a = ancestor_chain(tree, a)?;
    let chain_b = ancestor_chain(tree, b)?;
    let members: HashSet<&str> = chain_b.iter().map(String::as_str).collect();
    first_common(&chain_a, &members)
        .map(str::to_owned)
        .ok_or_else(|| TreeError::NoCommonAncestor(a.to_owned(), b.to_owned()))
}

// --------------------------- helpers
fn ancestor_chain(tree: &TreeModel, node: &str) -> Result<Vec<String>, TreeError> {
    let mut chain = vec![node.to_owned()];
    chain.extend(tree.ancestors(node, None)?);
    Ok(chain)
}
/// first node of `chain` (scanned from the leaf end) that is also in `other`
fn first_common<'a>(chain: &'a [String], other: &HashSet<&str>) -> Option<&'a str> {
    chain
        .iter()
        .map(String::as_str)
        .find(|node| other.contains(node))
}

//   ------------------------------- DISTANCE MATRIX Implementation
impl DistanceMatrix {
    /// all-zero matrix over `labels`
    pub fn zeros(labels: Vec<String>) -> Self {
        let n = labels.len();
        DistanceMatrix {
            labels,
            values: vec![0.0; n * n],
        }
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
    /// distance by index
    /// # Panics
    /// Panics if `i` or `j` is out of bounds.
    pub fn value(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.len() && j < self.len(), "index out of bounds");
        self.values[i * self.len() + j]
    }
    /// distance by label, `None` for unknown labels
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.value(self.index_of(a)?, self.index_of(b)?))
    }
    pub fn rows(&self) -> Vec<Vec<f64>> {
        if self.is_empty() {
            return vec![];
        }
        self.values.chunks(self.len()).map(<[f64]>::to_vec).collect()
    }
    /// The matrix restricted to `labels`, in the given order.
    /// Fails with `NodeNotFound` for labels not in the matrix.
    pub fn restrict<S: AsRef<str>>(&self, labels: &[S]) -> Result<DistanceMatrix, TreeError> {
        let indices: Vec<usize> = labels
            .iter()
            .map(|label| {
                self.index_of(label.as_ref())
                    .ok_or_else(|| TreeError::NodeNotFound(label.as_ref().to_owned()))
            })
            .collect::<Result<_, _>>()?;
        let mut result = DistanceMatrix::zeros(labels.iter().map(|l| l.as_ref().to_owned()).collect());
        for (a, &i) in indices.iter().enumerate() {
            for (b, &j) in indices.iter().enumerate() {
                result.set(a, b, self.value(i, j));
            }
        }
        Ok(result)
    }
    pub fn is_symmetric(&self) -> bool {
        (0..self.len())
            .tuple_combinations()
            .all(|(i, j)| self.value(i, j) == self.value(j, i))
    }
    fn set(&mut self, i: usize, j: usize, value: f64) {
        let n = self.len();
        self.values[i * n + j] = value;
    }
}
//  ----------------------  Matrix Display
impl Display for DistanceMatrix {
    /// comma separated, header row and label column
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ",{}", self.labels.join(","))?;
        for (label, row) in self.labels.iter().zip(self.rows()) {
            writeln!(f, "{},{}", label, row.iter().join(","))?;
        }
        Ok(())
    }
}

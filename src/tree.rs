//! Tree Module
//!
//! A tree is a labelled dendrogram over cell-type labels, stored as an
//! ordered list of edges: one row per named node pointing at its parent.
//!
//! `tree` module contains the `TreeModel` and all algorithms operating on it,
//! split into submodules for traversal, merging, simplification, subtree
//! extraction, layout, cophenetic distances, classification enumeration,
//! tabular import/export and random generation.
//!
//! This module contains 3 main types: `TreeModel`, `Edge`, `Node`
//!
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::tree::cophenetic::DistanceMatrix;
use crate::tree::merge::MergeRecord;

mod classify;
pub mod cophenetic;
mod layout;
pub mod merge;
pub mod random;
pub mod simplify;
mod subtree;
pub mod table;
mod traversal;

/// Parent value marking a root row. The sentinel is a marker, never a node.
pub const ROOT_SENTINEL: &str = "root";
/// Colour given to rows without one.
pub const DEFAULT_COLOR: &str = "#000000";

/// A single row of the tree: a named node and its parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// horizontal layout position
    pub x: f64,
    /// height of the node, doubles as its merge height
    pub y: f64,
    pub isleaf: bool,
    pub child: String,
    pub parent: String,
    #[serde(rename = "col")]
    pub color: String,
}

/// Why a set of edges does not form a valid tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedTree {
    #[error("tree has no edges")]
    Empty,
    #[error("node {0} appears as child more than once")]
    DuplicateChild(String),
    #[error("node name {0} is reserved for the root marker")]
    ReservedName(String),
    #[error("parent {parent} of node {child} is not in the tree")]
    DanglingParent { parent: String, child: String },
    #[error("cycle through node {0}")]
    Cycle(String),
    #[error("leaf {0} has children")]
    LeafHasChildren(String),
    #[error("node {0} has no children but is not flagged as a leaf")]
    UnflaggedLeaf(String),
    #[error("leaf {0} has non-zero height {1}")]
    LeafHeight(String, f64),
    #[error("node {0} has a non-finite position or height")]
    NonFiniteCoordinate(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("malformed tree: {0}")]
    Malformed(#[from] MalformedTree),
    #[error("node {0} not found in tree")]
    NodeNotFound(String),
    #[error("leaves {0} and {1} share no common ancestor")]
    NoCommonAncestor(String, String),
    #[error("node {0} has no row, its height is unknown")]
    MissingHeight(String),
}

/// A validated dendrogram.
///
/// Rows are kept in the order they were given; that order is observable
/// (leaf order of distance matrices, tie-breaking of the merge sequence).
#[derive(Debug, Clone, PartialEq)]
pub struct TreeModel {
    edges: Vec<Edge>,

    /// (k,v) = (child name, row index in edges)
    rows: HashMap<String, usize>,
}

/// A node with its direct neighbourhood, derived on demand from a tree.
/// Two nodes are equal when their names are.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    children: Vec<String>,
    parent: Option<String>,
}

//   ------------------------------- EDGE Implementation
impl Edge {
    /// A leaf row; leaves sit at height 0
    pub fn new_leaf(child: &str, parent: &str, x: f64) -> Self {
        Edge {
            x,
            y: 0.0,
            isleaf: true,
            child: child.to_owned(),
            parent: parent.to_owned(),
            color: DEFAULT_COLOR.to_owned(),
        }
    }
    /// An internal row at height `y`
    pub fn new_internal(child: &str, parent: &str, x: f64, y: f64) -> Self {
        Edge {
            x,
            y,
            isleaf: false,
            child: child.to_owned(),
            parent: parent.to_owned(),
            color: DEFAULT_COLOR.to_owned(),
        }
    }
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_owned();
        self
    }
    /// true when the row hangs from the root sentinel
    pub fn is_root(&self) -> bool {
        self.parent == ROOT_SENTINEL
    }
}

//   ------------------------------- TREE Implementation
impl TreeModel {
    // ----- Constructors
    /// Builds a tree from its rows, checking every structural invariant.
    /// # Arguments
    /// * `edges` - one row per named node
    ///
    /// Fails with `TreeError::Malformed` on duplicate children, dangling
    /// parents, cycles, wrong leaf flags, non-zero leaf heights or
    /// NaN/infinite coordinates.
    pub fn new(edges: Vec<Edge>) -> Result<Self, TreeError> {
        if edges.is_empty() {
            return Err(MalformedTree::Empty.into());
        }
        let mut rows = HashMap::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            if edge.child == ROOT_SENTINEL {
                return Err(MalformedTree::ReservedName(edge.child.clone()).into());
            }
            if rows.insert(edge.child.clone(), i).is_some() {
                return Err(MalformedTree::DuplicateChild(edge.child.clone()).into());
            }
            if !edge.x.is_finite() || !edge.y.is_finite() {
                return Err(MalformedTree::NonFiniteCoordinate(edge.child.clone()).into());
            }
        }
        let tree = TreeModel { edges, rows };
        tree.check_roots()?;
        tree.check_leaves()?;
        tree.check_acyclic()?;
        Ok(tree)
    }

    // ------ Getters
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
    /// number of rows
    pub fn len(&self) -> usize {
        self.edges.len()
    }
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
    /// the row of a node, `None` for unknown names and row-less roots
    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.rows.get(name).map(|&i| &self.edges[i])
    }
    pub fn height(&self, name: &str) -> Option<f64> {
        self.edge(name).map(|edge| edge.y)
    }
    pub fn max_height(&self) -> f64 {
        self.edges.iter().map(|edge| edge.y).fold(f64::MIN, f64::max)
    }
    /// true if the name is a node, i.e. appears as child or (non-sentinel) parent
    pub fn contains(&self, name: &str) -> bool {
        name != ROOT_SENTINEL
            && (self.rows.contains_key(name) || self.edges.iter().any(|edge| edge.parent == name))
    }
    /// direct children, in row order
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        if name == ROOT_SENTINEL {
            return vec![];
        }
        self.edges
            .iter()
            .filter(|edge| edge.parent == name)
            .map(|edge| edge.child.as_str())
            .collect()
    }
    /// direct parent, `None` for roots and unknown names
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.edge(name)
            .filter(|edge| !edge.is_root())
            .map(|edge| edge.parent.as_str())
    }
    pub fn is_leaf(&self, name: &str) -> bool {
        self.edge(name).is_some_and(|edge| edge.isleaf)
    }
    /// leaf names in row order
    pub fn leaves(&self) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.isleaf)
            .map(|edge| edge.child.as_str())
            .collect()
    }
    /// every node name (child or parent, sentinel excluded) in order of first appearance
    pub fn nodes(&self) -> Vec<&str> {
        self.edges
            .iter()
            .flat_map(|edge| [edge.child.as_str(), edge.parent.as_str()])
            .filter(|name| *name != ROOT_SENTINEL)
            .unique()
            .collect()
    }
    /// nodes without a parent: rows on the sentinel or the row-less top node
    pub fn roots(&self) -> Vec<&str> {
        self.nodes()
            .into_iter()
            .filter(|name| self.parent_of(name).is_none())
            .collect()
    }
    pub fn node(&self, name: &str) -> Result<Node, TreeError> {
        if !self.contains(name) {
            return Err(TreeError::NodeNotFound(name.to_owned()));
        }
        let children = self.children_of(name).into_iter().map(str::to_owned).collect();
        let parent = self.parent_of(name).map(str::to_owned);
        Ok(Node::new(name, children, parent))
    }

    // ----------------------- public functions
    /// All nodes below `node` in breadth-first order, `node` excluded.
    /// # Arguments
    /// * `node` - start of the expansion; unknown names have no descendants
    /// * `leafonly` - keep only leaves
    pub fn descendants(&self, node: &str, leafonly: bool) -> Result<Vec<String>, TreeError> {
        traversal::descendants(self, node, leafonly)
    }
    /// `descendants` for every node, keyed by name in order of first appearance
    pub fn all_descendants(&self, leafonly: bool) -> Result<Vec<(String, Vec<String>)>, TreeError> {
        traversal::all_descendants(self, leafonly)
    }
    /// Walks up from `node`, collecting ancestors nearest first.
    /// # Arguments
    /// * `node` - start of the walk, must be in the tree
    /// * `rootnode` - stop before reaching this node (exclusive)
    pub fn ancestors(&self, node: &str, rootnode: Option<&str>) -> Result<Vec<String>, TreeError> {
        traversal::ancestors(self, node, rootnode)
    }
    /// Deterministic bottom-up order of merges, lowest first. See `merge`.
    pub fn merge_sequence(&self) -> Vec<MergeRecord> {
        merge::merge_sequence(self)
    }
    /// Removes pass-through nodes. See `simplify`.
    /// # Arguments
    /// * `skip_nodes` - nodes to remove; computed from parent counts if `None`
    pub fn simplify(&self, skip_nodes: Option<Vec<String>>) -> Result<(TreeModel, Vec<String>), TreeError> {
        simplify::simplify(self, skip_nodes)
    }
    /// The induced subtree of `node` and everything below it.
    pub fn subtree(&self, node: &str) -> Result<TreeModel, TreeError> {
        subtree::subtree(self, node)
    }
    /// Re-indexes leaf x positions and centres internal nodes over their leaves.
    pub fn update_layout(&mut self) -> Result<(), TreeError> {
        layout::update_layout(self)
    }
    /// Heights of the lowest common ancestors of all leaf pairs.
    pub fn cophenetic_distances(&self) -> Result<DistanceMatrix, TreeError> {
        cophenetic::cophenetic_distances(self)
    }
    pub fn lowest_common_ancestor(&self, a: &str, b: &str) -> Result<String, TreeError> {
        cophenetic::lowest_common_ancestor(self, a, b)
    }
    /// Every cut of the tree below `root`. See `classify`.
    pub fn valid_classifications(&self, root: &str) -> Result<Vec<Vec<String>>, TreeError> {
        classify::valid_classifications(self, root)
    }

    // ------ crate internals
    /// (k,v) = (parent name, children in row order), sentinel excluded
    pub(crate) fn child_map(&self) -> HashMap<&str, Vec<&str>> {
        let mut result: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in self.edges.iter().filter(|edge| !edge.is_root()) {
            result
                .entry(edge.parent.as_str())
                .or_default()
                .push(edge.child.as_str());
        }
        result
    }
    /// only for rewrites that keep the structure (positions)
    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    // ------------------------ TREE TESTS
    fn check_roots(&self) -> Result<(), MalformedTree> {
        //either sentinel rows or exactly one row-less parent on top
        let has_sentinel = self.edges.iter().any(Edge::is_root);
        let mut implicit_root: Option<&str> = None;
        for edge in &self.edges {
            if edge.is_root() || self.rows.contains_key(&edge.parent) {
                continue;
            }
            if has_sentinel || implicit_root.is_some_and(|root| root != edge.parent) {
                return Err(MalformedTree::DanglingParent {
                    parent: edge.parent.clone(),
                    child: edge.child.clone(),
                });
            }
            implicit_root = Some(edge.parent.as_str());
        }
        Ok(())
    }
    fn check_leaves(&self) -> Result<(), MalformedTree> {
        let parents: HashSet<&str> = self.edges.iter().map(|edge| edge.parent.as_str()).collect();
        for edge in &self.edges {
            let has_children = parents.contains(edge.child.as_str());
            if edge.isleaf && has_children {
                return Err(MalformedTree::LeafHasChildren(edge.child.clone()));
            }
            if !edge.isleaf && !has_children {
                return Err(MalformedTree::UnflaggedLeaf(edge.child.clone()));
            }
            if edge.isleaf && edge.y != 0.0 {
                return Err(MalformedTree::LeafHeight(edge.child.clone(), edge.y));
            }
        }
        Ok(())
    }
    fn check_acyclic(&self) -> Result<(), MalformedTree> {
        //walk up from every row; paths already known to reach a root are settled
        let mut settled: HashSet<&str> = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            let mut path: Vec<&str> = vec![];
            let mut on_path: HashSet<&str> = HashSet::new();
            let mut cur = edge.child.as_str();
            loop {
                if settled.contains(cur) {
                    break;
                }
                if !on_path.insert(cur) {
                    return Err(MalformedTree::Cycle(cur.to_owned()));
                }
                path.push(cur);
                match self.parent_of(cur) {
                    Some(parent) => cur = parent,
                    None => break,
                }
            }
            settled.extend(path);
        }
        Ok(())
    }
    // ---- printing the tree
    fn display_helper<'a>(&self, root: &'a str, child_map: &HashMap<&'a str, Vec<&'a str>>, result: &mut String) {
        //(node, index of its next child to print)
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        while let Some((cur, next)) = stack.pop() {
            let children = child_map.get(cur).map_or(&[][..], Vec::as_slice);
            if next < children.len() {
                result.push(if next == 0 { '(' } else { ',' });
                stack.push((cur, next + 1));
                stack.push((children[next], 0));
                continue;
            }
            if !children.is_empty() {
                result.push(')');
            }
            result.push_str(cur);
        }
    }
}

//  ----------------------  Tree Display
impl Display for TreeModel {
    /// Newick-like topology, one `;`-terminated line per root
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let child_map = self.child_map();
        let mut result = String::new();
        for root in self.roots() {
            self.display_helper(root, &child_map, &mut result);
            result.push(';');
        }
        write!(f, "{}", result)
    }
}

//   ------------------------------- NODE Implementation
impl Node {
    pub fn new(name: &str, children: Vec<String>, parent: Option<String>) -> Self {
        Node {
            name: name.to_owned(),
            children,
            parent,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn children(&self) -> &[String] {
        &self.children
    }
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Node {}
impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

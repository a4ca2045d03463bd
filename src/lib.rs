//! Celltree
//!
//! Algorithms over labelled cell-type dendrograms: traversal, merge
//! scheduling, simplification, subtree extraction, layout, cophenetic
//! distances between leaves and Wasserstein distances between label
//! distributions placed on the tree.
//!
//! The crate contains 2 main modules: `tree` (the `TreeModel` and everything
//! operating on it) and `transport` (the optimal transport solver).
//!
pub mod transport;
pub mod tree;

pub use transport::{wasserstein, TransportError, TransportOptions, TransportPlan, TransportSolver};
pub use tree::cophenetic::DistanceMatrix;
pub use tree::merge::{apply_merges, MergeRecord, MergeReport, MergeSequenceExhausted};
pub use tree::{Edge, MalformedTree, Node, TreeError, TreeModel, DEFAULT_COLOR, ROOT_SENTINEL};

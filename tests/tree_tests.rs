use celltree::tree::simplify::pass_through_nodes;
use celltree::{apply_merges, Edge, MalformedTree, MergeSequenceExhausted, TreeError, TreeModel, ROOT_SENTINEL};

/// R - {A, B}, A - {a1, a2}; A at height 1, R at height 2
fn small_tree() -> TreeModel {
    TreeModel::new(vec![
        Edge::new_leaf("a1", "A", 0.0),
        Edge::new_leaf("a2", "A", 1.0),
        Edge::new_leaf("B", "R", 2.0),
        Edge::new_internal("A", "R", 0.5, 1.0),
        Edge::new_internal("R", ROOT_SENTINEL, 1.25, 2.0),
    ])
    .unwrap()
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

// ============= Construction =============

#[test]
fn test_building_tree() {
    let tree = small_tree();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.leaves(), vec!["a1", "a2", "B"]);
    assert_eq!(tree.roots(), vec!["R"]);
    assert!(tree.contains("A"));
    assert!(!tree.contains(ROOT_SENTINEL));
    assert_eq!(tree.parent_of("R"), None);
    assert_eq!(tree.parent_of("a1"), Some("A"));

    let node = tree.node("A").unwrap();
    assert_eq!(node.children(), ["a1", "a2"]);
    assert_eq!(node.parent(), Some("R"));
    assert!(!node.is_leaf());
    assert_eq!(tree.to_string(), "(B,(a1,a2)A)R;");
}

#[test]
fn test_display_deep_chain() {
    //n0 - n1 - ... - n4999 - leaf, one child per level
    let depth = 5000;
    let mut edges = vec![Edge::new_leaf("leaf", &format!("n{}", depth - 1), 0.0)];
    for i in (0..depth).rev() {
        let parent = if i == 0 { ROOT_SENTINEL.to_owned() } else { format!("n{}", i - 1) };
        edges.push(Edge::new_internal(&format!("n{i}"), &parent, 0.0, (depth - i) as f64));
    }
    let tree = TreeModel::new(edges).unwrap();
    let printed = tree.to_string();
    assert!(printed.starts_with(&"(".repeat(depth)));
    assert!(printed.ends_with(")n0;"));
    assert_eq!(printed.matches('(').count(), depth);
    assert_eq!(printed.matches(')').count(), depth);
}

#[test]
fn test_implicit_root() {
    //no sentinel rows: the row-less parent is the root
    let tree = TreeModel::new(vec![
        Edge::new_leaf("x", "P", 0.0),
        Edge::new_leaf("y", "P", 1.0),
    ])
    .unwrap();
    assert_eq!(tree.roots(), vec!["P"]);
    assert_eq!(tree.descendants("P", true).unwrap(), labels(&["x", "y"]));
    assert!(tree.node("P").unwrap().is_root());
}

#[test]
fn test_malformed_trees() {
    let malformed = |edges: Vec<Edge>| match TreeModel::new(edges) {
        Err(TreeError::Malformed(reason)) => reason,
        other => panic!("expected a malformed tree, got {other:?}"),
    };
    assert_eq!(malformed(vec![]), MalformedTree::Empty);
    assert_eq!(
        malformed(vec![Edge::new_leaf("a", "A", 0.0), Edge::new_leaf("a", "A", 1.0)]),
        MalformedTree::DuplicateChild("a".to_owned())
    );
    assert_eq!(
        malformed(vec![Edge::new_leaf(ROOT_SENTINEL, "A", 0.0)]),
        MalformedTree::ReservedName(ROOT_SENTINEL.to_owned())
    );
    assert_eq!(
        malformed(vec![Edge::new_leaf("a", "X", 0.0), Edge::new_leaf("b", "Y", 1.0)]),
        MalformedTree::DanglingParent {
            parent: "Y".to_owned(),
            child: "b".to_owned()
        }
    );
    assert_eq!(
        malformed(vec![
            Edge::new_leaf("a", "A", 0.0),
            Edge::new_internal("A", "B", 0.0, 1.0),
            Edge::new_internal("B", "A", 0.0, 2.0),
        ]),
        MalformedTree::Cycle("A".to_owned())
    );
    assert_eq!(
        malformed(vec![
            Edge::new_leaf("a", ROOT_SENTINEL, 0.0),
            Edge::new_leaf("b", "a", 1.0),
        ]),
        MalformedTree::LeafHasChildren("a".to_owned())
    );
    assert_eq!(
        malformed(vec![
            Edge::new_leaf("a", "A", 0.0),
            Edge::new_internal("A", ROOT_SENTINEL, 0.0, 1.0),
            Edge::new_internal("C", "A", 0.0, 0.5),
        ]),
        MalformedTree::UnflaggedLeaf("C".to_owned())
    );
    let mut high_leaf = Edge::new_leaf("a", "A", 0.0);
    high_leaf.y = 0.5;
    assert_eq!(malformed(vec![high_leaf]), MalformedTree::LeafHeight("a".to_owned(), 0.5));
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(
            malformed(vec![
                Edge::new_leaf("a", "A", 0.0),
                Edge::new_leaf("b", "A", 1.0),
                Edge::new_internal("A", ROOT_SENTINEL, 0.5, bad),
            ]),
            MalformedTree::NonFiniteCoordinate("A".to_owned())
        );
        assert_eq!(
            malformed(vec![Edge::new_leaf("a", "A", bad), Edge::new_leaf("b", "A", 1.0)]),
            MalformedTree::NonFiniteCoordinate("a".to_owned())
        );
    }
}

// ============= Traversal =============

#[test]
fn test_descendants_and_ancestors() {
    let tree = small_tree();
    assert_eq!(tree.descendants("R", false).unwrap(), labels(&["B", "A", "a1", "a2"]));
    assert_eq!(tree.descendants("R", true).unwrap(), labels(&["B", "a1", "a2"]));
    assert!(tree.descendants("a1", false).unwrap().is_empty());
    assert!(tree.descendants("nope", false).unwrap().is_empty());

    assert_eq!(tree.ancestors("a1", None).unwrap(), labels(&["A", "R"]));
    assert_eq!(tree.ancestors("a1", Some("R")).unwrap(), labels(&["A"]));
    assert!(tree.ancestors("R", None).unwrap().is_empty());
    assert_eq!(tree.ancestors("nope", None), Err(TreeError::NodeNotFound("nope".to_owned())));
}

#[test]
fn test_all_descendants() {
    let tree = small_tree();
    let all = tree.all_descendants(true).unwrap();
    let names: Vec<&str> = all.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["a1", "A", "a2", "B", "R"]);
    assert_eq!(all[1].1, labels(&["a1", "a2"]));
    assert!(all[0].1.is_empty());
}

// ============= Merges =============

#[test]
fn test_worked_example_merges() {
    let tree = small_tree();
    let merges = tree.merge_sequence();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].children.iter().collect::<Vec<_>>(), vec!["a1", "a2"]);
    assert_eq!(merges[0].parent, "A");
    assert_eq!(merges[0].remaining, 2);

    let mut cells = labels(&["a1", "a2", "B"]);
    let report = apply_merges(&mut cells, &merges, 1);
    assert_eq!(cells, labels(&["A", "A", "B"]));
    assert_eq!(report.applied, 1);
    assert_eq!(report.exhausted, None);
}

#[test]
fn test_exhausted_merges_are_truncated() {
    let tree = small_tree();
    let merges = tree.merge_sequence();
    let mut cells = labels(&["a1", "B", "a2", "a1"]);
    let report = apply_merges(&mut cells, &merges, 4);
    assert_eq!(cells, labels(&["A", "B", "A", "A"]));
    assert_eq!(report.applied, 1);
    assert_eq!(
        report.exhausted,
        Some(MergeSequenceExhausted {
            requested: 4,
            available: 1
        })
    );
}

#[test]
fn test_zero_merges_leave_labels() {
    let merges = small_tree().merge_sequence();
    let mut cells = labels(&["a1", "a2"]);
    let report = apply_merges(&mut cells, &merges, 0);
    assert_eq!(cells, labels(&["a1", "a2"]));
    assert_eq!(report.applied, 0);
}

// ============= Simplify, subtree, layout =============

#[test]
fn test_explicit_skip_nodes() {
    let tree = small_tree();
    //removing A links a1 and a2 to R
    let (simple, removed) = tree.simplify(Some(vec!["A".to_owned()])).unwrap();
    assert_eq!(removed, vec!["A"]);
    assert_eq!(simple.children_of("R"), vec!["a1", "a2", "B"]);
    assert!(pass_through_nodes(&simple).is_empty());
}

#[test]
fn test_subtree_of_small_tree() {
    let tree = small_tree();
    let mut sub = tree.subtree("A").unwrap();
    assert_eq!(sub.len(), 3);
    assert_eq!(sub.roots(), vec!["R"]);
    assert_eq!(sub.leaves(), vec!["a1", "a2"]);
    sub.update_layout().unwrap();
    assert_eq!(sub.edge("a2").unwrap().x, 1.0);
    assert_eq!(sub.edge("A").unwrap().x, 0.5);
    assert_eq!(tree.subtree("nope"), Err(TreeError::NodeNotFound("nope".to_owned())));
    //a leaf has nothing below it
    assert_eq!(tree.subtree("B"), Err(TreeError::NodeNotFound("B".to_owned())));
}

// ============= Distances =============

#[test]
fn test_worked_example_distances() {
    let tree = small_tree();
    let matrix = tree.cophenetic_distances().unwrap();
    assert_eq!(matrix.labels(), ["a1", "a2", "B"]);
    assert_eq!(matrix.get("a1", "a2"), Some(1.0));
    assert_eq!(matrix.get("a1", "B"), Some(2.0));
    assert_eq!(matrix.get("B", "a2"), Some(2.0));
    assert_eq!(matrix.get("B", "B"), Some(0.0));
    assert_eq!(tree.lowest_common_ancestor("a1", "a2").unwrap(), "A");
    assert_eq!(tree.lowest_common_ancestor("a1", "B").unwrap(), "R");

    let restricted = matrix.restrict(&["B", "a1"]).unwrap();
    assert_eq!(restricted.rows(), vec![vec![0.0, 2.0], vec![2.0, 0.0]]);
    assert_eq!(
        matrix.restrict(&["a1", "Z"]),
        Err(TreeError::NodeNotFound("Z".to_owned()))
    );
    assert_eq!(matrix.to_string(), ",a1,a2,B\na1,0,1,2\na2,1,0,2\nB,2,2,0\n");
}

#[test]
fn test_lca_without_height() {
    //implicit root P has no row, hence no height
    let tree = TreeModel::new(vec![
        Edge::new_leaf("x", "P", 0.0),
        Edge::new_leaf("y", "P", 1.0),
    ])
    .unwrap();
    assert_eq!(tree.cophenetic_distances(), Err(TreeError::MissingHeight("P".to_owned())));
}

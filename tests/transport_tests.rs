use celltree::tree::random::random_dendrogram;
use celltree::{wasserstein, TransportOptions, TransportSolver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-6;

fn random_distribution(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let weights: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0) + 0.01).collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

#[test]
fn test_identical_distributions_cost_nothing() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..5 {
        let tree = random_dendrogram(6, &mut rng).unwrap();
        let cost = tree.cophenetic_distances().unwrap().rows();
        let p = random_distribution(6, &mut rng);
        let result = wasserstein(&p, &p, &cost, &TransportOptions::default()).unwrap();
        assert!(result.cost().abs() < TOL);
    }
}

#[test]
fn test_marginals_match() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..5 {
        let tree = random_dendrogram(5, &mut rng).unwrap();
        let cost = tree.cophenetic_distances().unwrap().rows();
        let p = random_distribution(5, &mut rng);
        let q = random_distribution(5, &mut rng);
        let result = wasserstein(&p, &q, &cost, &TransportOptions::default()).unwrap();
        for (sum, expected) in result.row_sums().iter().zip(&p) {
            assert!((sum - expected).abs() < TOL);
        }
        for (sum, expected) in result.col_sums().iter().zip(&q) {
            assert!((sum - expected).abs() < TOL);
        }
        assert!(result.plan().iter().flatten().all(|t| *t >= 0.0));
        assert!(result.cost() >= 0.0);
        //symmetric cost matrix: moving q onto p costs the same
        let back = wasserstein(&q, &p, &cost, &TransportOptions::default()).unwrap();
        assert!((back.cost() - result.cost()).abs() < TOL);
    }
}

#[test]
fn test_restricted_tree_costs() {
    //R - {A, B}, A - {a1, a2}; A at height 1, R at height 2
    let tree = celltree::TreeModel::new(vec![
        celltree::Edge::new_leaf("a1", "A", 0.0),
        celltree::Edge::new_leaf("a2", "A", 1.0),
        celltree::Edge::new_leaf("B", "R", 2.0),
        celltree::Edge::new_internal("A", "R", 0.5, 1.0),
        celltree::Edge::new_internal("R", celltree::ROOT_SENTINEL, 1.25, 2.0),
    ])
    .unwrap();
    let matrix = tree.cophenetic_distances().unwrap();
    let cost = matrix.restrict(&["a1", "B"]).unwrap().rows();
    let result = wasserstein(&[1.0, 0.0], &[0.0, 1.0], &cost, &TransportOptions::default()).unwrap();
    assert!((result.cost() - 2.0).abs() < TOL);

    //moving mass within A is cheaper than across R
    let cost = matrix.rows();
    let within = wasserstein(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &cost, &TransportOptions::default()).unwrap();
    let across = wasserstein(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0], &cost, &TransportOptions::default()).unwrap();
    assert!((within.cost() - 1.0).abs() < TOL);
    assert!((across.cost() - 2.0).abs() < TOL);
}

#[test]
fn test_large_tree_with_default_options() {
    let mut rng = StdRng::seed_from_u64(150);
    let tree = random_dendrogram(160, &mut rng).unwrap();
    let cost = tree.cophenetic_distances().unwrap().rows();
    let p = random_distribution(160, &mut rng);
    let q = random_distribution(160, &mut rng);
    let options = TransportOptions::default();

    let same = wasserstein(&p, &p, &cost, &options).unwrap();
    assert!(same.cost().abs() < TOL);

    let result = wasserstein(&p, &q, &cost, &options).unwrap();
    assert!(result.cost() > 0.0);
    assert!(result.iterations() < options.max_iterations);
    for (sum, expected) in result.row_sums().iter().zip(&p) {
        assert!((sum - expected).abs() < TOL);
    }
    for (sum, expected) in result.col_sums().iter().zip(&q) {
        assert!((sum - expected).abs() < TOL);
    }
}

#[test]
fn test_dense_simplex_matches_transportation() {
    let mut rng = StdRng::seed_from_u64(21);
    let dense = TransportOptions {
        solver: TransportSolver::DenseSimplex,
        ..TransportOptions::default()
    };
    for _ in 0..5 {
        let tree = random_dendrogram(8, &mut rng).unwrap();
        let cost = tree.cophenetic_distances().unwrap().rows();
        let p = random_distribution(8, &mut rng);
        let q = random_distribution(8, &mut rng);
        let a = wasserstein(&p, &q, &cost, &TransportOptions::default()).unwrap();
        let b = wasserstein(&p, &q, &cost, &dense).unwrap();
        assert!((a.cost() - b.cost()).abs() < TOL);
    }
}

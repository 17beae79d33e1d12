use approx::assert_relative_eq;

use crate::eigen::{
    AutoEigensolver, DenseEigensolver, PowerIteration, SymmetricEigensolver, DEFAULT_DENSE_LIMIT,
};
use crate::exact::von_neumann_entropy;
use crate::finger::{finger_hat, finger_hat_with, finger_tilde, quadratic_q};
use crate::generators::{complete, empty, star};
use crate::graph::Graph;
use crate::laplacian::{build_adjacency, build_laplacian, LaplacianMode};
use crate::tests::init;
use crate::tests::test_data::{make_ba, make_er, make_weighted_small};

fn exact(g: &Graph) -> f64 {
    von_neumann_entropy(g, LaplacianMode::Combinatorial).unwrap()
}

#[test]
fn edgeless_graph_gives_zero() {
    init();
    let g = empty(7).unwrap();
    assert_eq!(quadratic_q(&g), 0.0);
    assert_eq!(finger_hat(&g).unwrap(), 0.0);
    assert_eq!(finger_tilde(&g), 0.0);
}

#[test]
fn quadratic_term_of_unit_weight_graph() {
    init();
    // star K_{1,4}: Σd² = 16 + 4, m = 4, vol = 8
    let g = star(5).unwrap();
    assert_relative_eq!(quadratic_q(&g), 1.0 - (20.0 + 8.0) / 64.0, epsilon = 1e-12);
}

#[test]
fn quadratic_term_uses_squared_weights() {
    init();
    let g = make_weighted_small();
    let sum_square = 9.0 + 6.25 + 20.25 + 20.25 + 2.25;
    let expected = 1.0 - (sum_square + 2.0 * g.sum_squared_weights()) / 256.0;
    assert_relative_eq!(quadratic_q(&g), expected, epsilon = 1e-12);
}

#[test]
fn estimates_are_ordered_below_exact() {
    init();
    // λmax ≤ 2·dmax and every eigenvalue ≤ λmax
    for g in [
        make_ba(100, 2, 1),
        make_ba(200, 3, 2),
        make_er(100, 0.05, 3),
        make_er(150, 0.1, 4),
        star(30).unwrap(),
    ] {
        let hat = finger_hat(&g).unwrap();
        let tilde = finger_tilde(&g);
        let h = exact(&g);
        assert!(tilde >= 0.0);
        assert!(tilde <= hat + 1e-9, "tilde {} > hat {}", tilde, hat);
        assert!(hat <= h + 1e-9, "hat {} > exact {}", hat, h);
    }
}

#[test]
fn finger_hat_tracks_exact_on_dense_random_graphs() {
    init();
    for (n, p, seed) in [(100, 0.3, 5), (120, 0.2, 6), (150, 0.15, 7)] {
        let g = make_er(n, p, seed);
        let h = exact(&g);
        let hat = finger_hat(&g).unwrap();
        let tilde = finger_tilde(&g);
        assert!((h - hat) / h < 0.15, "hat error {:.3}", (h - hat) / h);
        assert!((h - tilde) / h < 0.30, "tilde error {:.3}", (h - tilde) / h);
    }
}

#[test]
fn complete_graph_hat() {
    init();
    // λmax = N, vol = N(N−1): Ĥ = Q·log2(N−1)
    let n = 10usize;
    let g = complete(n).unwrap();
    let q = quadratic_q(&g);
    assert_relative_eq!(
        finger_hat(&g).unwrap(),
        q * ((n - 1) as f64).log2(),
        epsilon = 1e-9
    );
    // 2·dmax = 2(N−1) overestimates λmax
    assert!(finger_tilde(&g) < finger_hat(&g).unwrap());
}

#[test]
fn power_iteration_agrees_with_dense_solver() {
    init();
    let g = make_ba(300, 3, 9);
    let lap = build_laplacian(&build_adjacency(&g), false);
    let dense = DenseEigensolver.largest_eigenvalue(&lap).unwrap();
    let power = PowerIteration::default().largest_eigenvalue(&lap).unwrap();
    assert_relative_eq!(power, dense, max_relative = 1e-4);

    let sparse_only = AutoEigensolver::with_dense_limit(10);
    let hat_power = finger_hat_with(&g, &sparse_only).unwrap();
    let hat_dense = finger_hat_with(&g, &DenseEigensolver).unwrap();
    assert_relative_eq!(hat_power, hat_dense, max_relative = 1e-4);
}

#[test]
fn default_hat_matches_dense_solver_on_large_graph() {
    init();
    assert_eq!(AutoEigensolver::default().dense_limit, DEFAULT_DENSE_LIMIT);
    let g = make_ba(1500, 3, 1);
    assert!(g.nvertices() > DEFAULT_DENSE_LIMIT);
    let hat = finger_hat(&g).unwrap();
    let dense = finger_hat_with(&g, &DenseEigensolver).unwrap();
    assert_relative_eq!(hat, dense, max_relative = 1e-6);
}

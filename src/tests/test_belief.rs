use approx::assert_relative_eq;

use crate::belief::{delta_con, fast_belief_propagation, FastBeliefPropagation, DELTACON_GROUPS};
use crate::errors::EntropyError;
use crate::generators::{empty, path};
use crate::graph::Graph;
use crate::laplacian::{build_adjacency, sparse_matvec};
use crate::tests::init;
use crate::tests::test_data::{make_ba, make_er, rng};

#[test]
fn edgeless_graph_returns_prior() {
    init();
    let adjacency = build_adjacency(&empty(5).unwrap());
    let prior = vec![1.0, 0.0, 0.5, 0.0, 2.0];
    assert_eq!(fast_belief_propagation(&adjacency, &prior).unwrap(), prior);
}

#[test]
fn beliefs_approximately_solve_the_linear_system() {
    init();
    let adjacency = build_adjacency(&make_ba(60, 2, 4));
    let fabp = FastBeliefPropagation::new(&adjacency);
    assert!(fabp.homophily > 0.0 && fabp.homophily < 0.5);

    let mut prior = vec![0.0; 60];
    prior[3] = 1.0;
    prior[17] = 1.0;
    let x = fabp.solve(&prior);

    // (I − W)x = y up to the truncated tail W^{11} y
    let wx = sparse_matvec(fabp.propagation(), &x);
    let residual: f64 = x
        .iter()
        .zip(&wx)
        .zip(&prior)
        .map(|((xi, wi), yi)| (xi - wi - yi).abs())
        .fold(0.0, f64::max);
    assert!(residual < 1e-3, "residual {}", residual);
    // seeds keep most of their own belief
    assert!(x[3] > 0.9 && x[17] > 0.9);
}

#[test]
fn path_graph_parameters() {
    init();
    // path of 3: degrees (1, 2, 1), dmax = 2
    let fabp = FastBeliefPropagation::new(&build_adjacency(&path(3).unwrap()));
    let h1 = 1.0 / 6.0;
    let (c1, c2) = (6.0_f64, 5.0_f64);
    let h2 = ((-c1 + (c1 * c1 + 4.0 * c2).sqrt()) / (8.0 * c2)).sqrt();
    let h = f64::max(h1, h2);
    assert_relative_eq!(fabp.homophily, h, epsilon = 1e-15);
    assert_relative_eq!(fabp.degree_factor, 4.0 * h * h / (1.0 - 4.0 * h * h), epsilon = 1e-15);
    assert_relative_eq!(fabp.coupling, 2.0 * h / (1.0 - 4.0 * h * h), epsilon = 1e-15);
}

#[test]
fn prior_length_must_match() {
    init();
    let adjacency = build_adjacency(&path(4).unwrap());
    assert!(matches!(
        fast_belief_propagation(&adjacency, &[1.0, 0.0]),
        Err(EntropyError::InvalidArgument(_))
    ));
}

#[test]
fn delta_con_of_identical_graphs_is_one() {
    init();
    let adjacency = build_adjacency(&make_er(80, 0.08, 2));
    let similarity = delta_con(&adjacency, &adjacency, DELTACON_GROUPS, &mut rng(1)).unwrap();
    assert_eq!(similarity, 1.0);
}

#[test]
fn delta_con_decreases_with_perturbation() {
    init();
    let base = make_ba(100, 3, 5);
    let edges: Vec<(usize, usize, f64)> = base.edges().iter().map(|e| (e.u, e.v, e.weight)).collect();
    let small = Graph::new(100, edges[..edges.len() - 5].to_vec()).unwrap();
    let large = Graph::new(100, edges[..edges.len() / 2].to_vec()).unwrap();

    let a = build_adjacency(&base);
    let near = delta_con(&a, &build_adjacency(&small), DELTACON_GROUPS, &mut rng(3)).unwrap();
    let far = delta_con(&a, &build_adjacency(&large), DELTACON_GROUPS, &mut rng(3)).unwrap();
    assert!(near > 0.0 && near < 1.0);
    assert!(far < near, "far {} >= near {}", far, near);
}

#[test]
fn delta_con_rejects_bad_input() {
    init();
    let a = build_adjacency(&path(4).unwrap());
    let b = build_adjacency(&path(5).unwrap());
    assert!(matches!(
        delta_con(&a, &b, 4, &mut rng(0)),
        Err(EntropyError::InvalidArgument(_))
    ));
    assert!(matches!(
        delta_con(&a, &a, 0, &mut rng(0)),
        Err(EntropyError::InvalidArgument(_))
    ));
}

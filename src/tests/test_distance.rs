use approx::assert_relative_eq;

use crate::belief::DELTACON_GROUPS;
use crate::distance::{
    anomaly_order, anomaly_rank, anomaly_scores, delta_con_distance, pairwise_distances,
    structural_information_distance, veo_score, von_neumann_distance,
};
use crate::eigen::DenseEigensolver;
use crate::errors::EntropyError;
use crate::generators::{complete, cycle, empty, path, star};
use crate::graph::Graph;
use crate::tests::init;
use crate::tests::test_data::{make_ba, rng};

#[test]
fn identical_graphs_are_at_distance_zero() {
    init();
    let g = make_ba(60, 2, 3);
    assert!(structural_information_distance(&g, &g).unwrap() < 1e-6);
    assert!(von_neumann_distance(&g, &g, &DenseEigensolver).unwrap() < 1e-6);
    assert_relative_eq!(veo_score(&g, &g).unwrap(), 0.0, epsilon = 1e-15);
    assert_eq!(
        delta_con_distance(&g, &g, DELTACON_GROUPS, &mut rng(1)).unwrap(),
        0.0
    );
}

#[test]
fn distances_are_symmetric_and_bounded() {
    init();
    let (a, b) = (star(12).unwrap(), path(12).unwrap());
    let d_ab = structural_information_distance(&a, &b).unwrap();
    let d_ba = structural_information_distance(&b, &a).unwrap();
    assert_relative_eq!(d_ab, d_ba, epsilon = 1e-12);
    assert!(d_ab > 0.0 && d_ab <= 1.0);

    let q_ab = von_neumann_distance(&a, &b, &DenseEigensolver).unwrap();
    let q_ba = von_neumann_distance(&b, &a, &DenseEigensolver).unwrap();
    assert_relative_eq!(q_ab, q_ba, epsilon = 1e-9);
    assert!(q_ab > 0.0 && q_ab <= 1.0);
}

#[test]
fn veo_counts_shared_edges() {
    init();
    // path 0–1–2–3 and cycle on the same vertices share 3 edges
    let (p, c) = (path(4).unwrap(), cycle(4).unwrap());
    let expected = 1.0 - 2.0 * (4.0 + 3.0) / (8.0 + 3.0 + 4.0);
    assert_relative_eq!(veo_score(&p, &c).unwrap(), expected, epsilon = 1e-12);

    // no shared edges with the empty graph
    let e = empty(4).unwrap();
    assert_relative_eq!(
        veo_score(&p, &e).unwrap(),
        1.0 - 8.0 / 11.0,
        epsilon = 1e-12
    );
}

#[test]
fn edgeless_graph_contributes_zero_distribution() {
    init();
    let (e, k) = (empty(5).unwrap(), complete(5).unwrap());
    // mixture masses are 1/10 each: 0.5·log2(10) − 0.5·log2(5) = 0.5
    let expected = 0.5_f64.sqrt();
    let d = structural_information_distance(&e, &k).unwrap();
    assert_relative_eq!(d, expected, epsilon = 1e-9);
    assert_eq!(structural_information_distance(&e, &e).unwrap(), 0.0);
    assert_eq!(
        von_neumann_distance(&e, &e, &DenseEigensolver).unwrap(),
        0.0
    );
}

#[test]
fn entropy_distances_agree_against_edgeless_graph() {
    init();
    let (e, k) = (empty(5).unwrap(), complete(5).unwrap());
    // ρ(K5) has spectrum {1/4 (x4), 0}: H(ρ) = 2, H(ρ/2) = 1.5
    let vn = von_neumann_distance(&e, &k, &DenseEigensolver).unwrap();
    assert_relative_eq!(vn, 0.5_f64.sqrt(), epsilon = 1e-9);
    assert_relative_eq!(
        von_neumann_distance(&k, &e, &DenseEigensolver).unwrap(),
        vn,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        vn,
        structural_information_distance(&e, &k).unwrap(),
        epsilon = 1e-9
    );
}

#[test]
fn mismatched_vertex_sets_are_rejected() {
    init();
    let (a, b) = (path(4).unwrap(), path(5).unwrap());
    assert!(matches!(
        structural_information_distance(&a, &b),
        Err(EntropyError::InvalidArgument(_))
    ));
    assert!(matches!(
        von_neumann_distance(&a, &b, &DenseEigensolver),
        Err(EntropyError::InvalidArgument(_))
    ));
    assert!(veo_score(&a, &b).is_err());
    assert!(delta_con_distance(&a, &b, 3, &mut rng(0)).is_err());
}

#[test]
fn anomaly_scores_average_adjacent_distances() {
    init();
    let distances = [0.1, 0.5, 0.2, 0.2];
    let scores = anomaly_scores(&distances);
    assert_eq!(scores.len(), 5);
    assert_relative_eq!(scores[0], 0.1);
    assert_relative_eq!(scores[1], 0.3);
    assert_relative_eq!(scores[2], 0.35);
    assert_relative_eq!(scores[3], 0.2);
    assert_relative_eq!(scores[4], 0.2);

    // ties keep index order
    assert_eq!(anomaly_order(&scores), vec![2, 1, 3, 4, 0]);
    assert_eq!(anomaly_rank(&scores, 2), Some(0));
    assert_eq!(anomaly_rank(&scores, 4), Some(3));
    assert_eq!(anomaly_rank(&scores, 9), None);

    assert!(anomaly_scores(&[]).is_empty());
    assert_eq!(anomaly_scores(&[0.4]), vec![0.4, 0.4]);
}

#[test]
fn injected_anomaly_stands_out() {
    init();
    let base = make_ba(40, 2, 8);
    let edges: Vec<(usize, usize, f64)> = base.edges().iter().map(|e| (e.u, e.v, e.weight)).collect();
    let mut sequence: Vec<Graph> = (0..5)
        .map(|i| Graph::new(40, edges[..edges.len() - i].to_vec()).unwrap())
        .collect();
    sequence[2] = star(40).unwrap();

    let distances = pairwise_distances(&sequence, structural_information_distance).unwrap();
    assert_eq!(distances.len(), 4);
    let scores = anomaly_scores(&distances);
    assert_eq!(anomaly_order(&scores)[0], 2);
}

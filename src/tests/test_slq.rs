use approx::assert_relative_eq;

use crate::errors::EntropyError;
use crate::exact::von_neumann_entropy;
use crate::generators::{complete, empty};
use crate::laplacian::{build_adjacency, build_laplacian, LaplacianMode};
use crate::slq::{
    default_timescales, estimate_traces, logspace, netlsd, vnge, NetLsdNormalization, SlqParams,
    SpectralFn,
};
use crate::tests::init;
use crate::tests::test_data::{make_ba, make_er};

#[test]
fn vnge_converges_to_exact_entropy() {
    init();
    for g in [make_ba(200, 2, 3), make_er(200, 0.05, 4)] {
        let exact = von_neumann_entropy(&g, LaplacianMode::Combinatorial).unwrap();
        let runs = 10;
        let mean: f64 = (0..runs)
            .map(|r| vnge(&g, &SlqParams::default().with_seed(100 + r)).unwrap())
            .sum::<f64>()
            / runs as f64;
        let relative = (mean - exact).abs() / exact;
        assert!(relative < 0.05, "SLQ {} vs exact {} ({:.3})", mean, exact, relative);
    }
}

#[test]
fn vnge_of_edgeless_graph_is_zero() {
    init();
    assert_eq!(vnge(&empty(20).unwrap(), &SlqParams::default()).unwrap(), 0.0);
}

#[test]
fn seeded_estimates_are_reproducible() {
    init();
    let g = make_ba(120, 3, 8);
    let params = SlqParams::default().with_nvectors(20).with_seed(42);
    assert_relative_eq!(
        vnge(&g, &params).unwrap(),
        vnge(&g, &params).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn trace_of_identity_function_is_exact_in_expectation() {
    init();
    // tr(L) = vol; with 200 probes the estimate lands close to it
    let g = make_ba(100, 2, 6);
    let lap = build_laplacian(&build_adjacency(&g), false);
    let identity = |x: f64| x;
    let square = |x: f64| x * x;
    let functions: [SpectralFn; 2] = [&identity, &square];
    let params = SlqParams::default().with_nvectors(200).with_seed(1);
    let traces = estimate_traces(&lap, &params, &functions, &[1.0, 2.0]).unwrap();

    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0].len(), 2);
    assert_relative_eq!(traces[0][0], g.volume(), max_relative = 0.1);
    // linear in the scale
    assert_relative_eq!(traces[0][1], 2.0 * traces[0][0], max_relative = 1e-12);
    // tr(L²) = Σd² + 2m for unit weights
    let sum_square: f64 = g.degrees().iter().map(|d| d * d).sum();
    let expected = sum_square + 2.0 * g.ecount() as f64;
    assert_relative_eq!(traces[1][0], expected, max_relative = 0.15);
}

#[test]
fn netlsd_signature_shape_and_limits() {
    init();
    let g = make_ba(100, 2, 9);
    let n = g.nvertices() as f64;
    let times = default_timescales();
    let params = SlqParams::default().with_nvectors(30).with_seed(2);

    let raw = netlsd(&g, &times, &params, NetLsdNormalization::None).unwrap();
    assert_eq!(raw.len(), 256);
    // h(t) → N as t → 0 for a graph without isolated vertices
    assert_relative_eq!(raw[0], n, max_relative = 0.02);
    // heat trace decays with time
    assert!(raw[255] < raw[0]);

    let empty_norm = netlsd(&g, &times, &params, NetLsdNormalization::Empty).unwrap();
    assert_relative_eq!(empty_norm[10], raw[10] / n, max_relative = 1e-12);

    let complete_norm = netlsd(&g, &times, &params, NetLsdNormalization::Complete).unwrap();
    let t = times[100];
    assert_relative_eq!(
        complete_norm[100],
        raw[100] / (1.0 + (n - 1.0) * (-t).exp()),
        max_relative = 1e-12
    );
}

#[test]
fn netlsd_of_complete_graph() {
    init();
    // normalized Laplacian of K_n: eigenvalue n/(n−1) with multiplicity n − 1
    let n = 12usize;
    let g = complete(n).unwrap();
    let times = [0.5, 1.0, 3.0];
    let params = SlqParams::default().with_nvectors(50).with_seed(3);
    let signature = netlsd(&g, &times, &params, NetLsdNormalization::None).unwrap();
    for (h, &t) in signature.iter().zip(&times) {
        let lambda = n as f64 / (n - 1) as f64;
        let expected = 1.0 + (n - 1) as f64 * (-t * lambda).exp();
        assert_relative_eq!(*h, expected, max_relative = 0.1);
    }
}

#[test]
fn normalization_names() {
    init();
    assert_eq!(
        "none".parse::<NetLsdNormalization>().unwrap(),
        NetLsdNormalization::None
    );
    assert_eq!(
        "complete".parse::<NetLsdNormalization>().unwrap(),
        NetLsdNormalization::Complete
    );
    assert!(matches!(
        "full".parse::<NetLsdNormalization>(),
        Err(EntropyError::InvalidArgument(_))
    ));
    assert_eq!(NetLsdNormalization::Empty.to_string(), "empty");
}

#[test]
fn logspace_endpoints() {
    init();
    let grid = logspace(-2.0, 2.0, 5);
    assert_eq!(grid.len(), 5);
    assert_relative_eq!(grid[0], 0.01, epsilon = 1e-15);
    assert_relative_eq!(grid[2], 1.0, epsilon = 1e-12);
    assert_relative_eq!(grid[4], 100.0, epsilon = 1e-10);
    assert!(logspace(0.0, 1.0, 0).is_empty());
    assert_eq!(logspace(1.0, 3.0, 1), vec![10.0]);
}

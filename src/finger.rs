//! FINGER approximations of von Neumann graph entropy.
//!
//! Both estimators share the quadratic correction
//! `Q = 1 − (Σ d_v² + 2 Σ w_e²) / vol²` and differ in the extremal term:
//!
//! - `finger_hat`: `−Q · log2(λmax / vol)`, `λmax` the largest eigenvalue of the
//!   combinatorial Laplacian (one extremal eigen-query)
//! - `finger_tilde`: `−Q · log2(2·dmax / vol)`, closed form
//!
//! With unit weights `Σ w_e² = m`, giving the familiar `Q = 1 − (Σd² + 2m)/vol²`.

use log::debug;

use crate::eigen::{AutoEigensolver, SymmetricEigensolver};
use crate::errors::EntropyResult;
use crate::graph::Graph;
use crate::laplacian::{build_adjacency, build_laplacian};

/// Quadratic approximation `Q` of the von Neumann entropy.
pub fn quadratic_q(graph: &Graph) -> f64 {
    let volume = graph.volume();
    if volume <= 0.0 {
        return 0.0;
    }
    let sum_square: f64 = graph.degrees().iter().map(|d| d * d).sum();
    1.0 - (sum_square + 2.0 * graph.sum_squared_weights()) / (volume * volume)
}

/// FINGER-Ĥ with the default eigensolver.
pub fn finger_hat(graph: &Graph) -> EntropyResult<f64> {
    finger_hat_with(graph, &AutoEigensolver::default())
}

/// FINGER-Ĥ with an injected eigensolver for `λmax`.
pub fn finger_hat_with(graph: &Graph, solver: &dyn SymmetricEigensolver) -> EntropyResult<f64> {
    let volume = graph.volume();
    if graph.ecount() == 0 || volume <= 0.0 {
        return Ok(0.0);
    }
    let q = quadratic_q(graph);
    let laplacian = build_laplacian(&build_adjacency(graph), false);
    let lambda_max = solver.largest_eigenvalue(&laplacian)?;
    let entropy = -q * (lambda_max / volume).log2();
    debug!(
        "FINGER-hat: Q={:.6}, λmax={:.6}, vol={:.1}, H={:.7}",
        q, lambda_max, volume, entropy
    );
    Ok(entropy)
}

/// FINGER-H̃: closed form from the maximum degree.
pub fn finger_tilde(graph: &Graph) -> f64 {
    let volume = graph.volume();
    if graph.ecount() == 0 || volume <= 0.0 {
        return 0.0;
    }
    let q = quadratic_q(graph);
    let max_degree = graph
        .degrees()
        .into_iter()
        .fold(0.0_f64, f64::max);
    let entropy = -q * (2.0 * max_degree / volume).log2();
    debug!(
        "FINGER-tilde: Q={:.6}, dmax={:.1}, vol={:.1}, H={:.7}",
        q, max_degree, volume, entropy
    );
    entropy
}

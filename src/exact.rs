//! Exact entropies: structural information and von Neumann graph entropy.
//!
//! - `structural_entropy`: `H = −Σ_v (d_v/vol)·log2(d_v/vol)`, no eigensolver.
//! - `von_neumann_entropy`: Shannon entropy of the Laplacian spectrum
//!   normalised by its sum. Requires a full symmetric eigendecomposition.
//!
//! Both return 0 for a graph without edges.

use log::{debug, info, log_enabled, trace, Level};
use sprs::CsMat;

use crate::eigen::{AutoEigensolver, SymmetricEigensolver};
use crate::errors::EntropyResult;
use crate::graph::Graph;
use crate::kernel::{shannon_entropy, xlog2x};
use crate::laplacian::{GraphLaplacian, LaplacianMode};

/// One-dimensional structural entropy (structural information) of `graph`.
pub fn structural_entropy(graph: &Graph) -> f64 {
    let degrees = graph.degrees();
    let volume: f64 = degrees.iter().sum();
    if graph.ecount() == 0 || volume <= 0.0 {
        trace!("structural_entropy: no edges, returning 0");
        return 0.0;
    }
    shannon_entropy(degrees, volume)
}

/// Entropy of a spectrum normalised by its sum.
pub fn spectral_entropy(eigenvalues: &[f64]) -> f64 {
    let eigsum: f64 = eigenvalues.iter().sum();
    if eigsum <= 0.0 {
        return 0.0;
    }
    -eigenvalues.iter().map(|&l| xlog2x(l / eigsum)).sum::<f64>()
}

/// Von Neumann entropy of a precomputed Laplacian.
pub fn laplacian_entropy(
    laplacian: &CsMat<f64>,
    solver: &dyn SymmetricEigensolver,
) -> EntropyResult<f64> {
    if laplacian.nnz() == 0 {
        return Ok(0.0);
    }
    let eigenvalues = solver.eigenvalues(laplacian)?;
    trace!(
        "Spectrum: {} eigenvalues in [{:.3e}, {:.3e}]",
        eigenvalues.len(),
        eigenvalues.first().copied().unwrap_or(0.0),
        eigenvalues.last().copied().unwrap_or(0.0)
    );
    Ok(spectral_entropy(&eigenvalues))
}

/// Exact von Neumann graph entropy using the default eigensolver.
pub fn von_neumann_entropy(graph: &Graph, mode: LaplacianMode) -> EntropyResult<f64> {
    von_neumann_entropy_with(graph, mode, &AutoEigensolver::default())
}

/// Exact von Neumann graph entropy with the mode given by name
/// (`"laplacian"` or `"normalized laplacian"`).
pub fn von_neumann_entropy_str(graph: &Graph, mode: &str) -> EntropyResult<f64> {
    von_neumann_entropy(graph, mode.parse()?)
}

/// Exact von Neumann graph entropy with an injected eigensolver.
pub fn von_neumann_entropy_with(
    graph: &Graph,
    mode: LaplacianMode,
    solver: &dyn SymmetricEigensolver,
) -> EntropyResult<f64> {
    if graph.ecount() == 0 {
        debug!("von_neumann_entropy: graph has no edges, returning 0");
        return Ok(0.0);
    }
    let laplacian = GraphLaplacian::from_graph(graph, mode);
    if log_enabled!(Level::Debug) {
        laplacian.verify_properties(1e-9);
        debug!("{}", laplacian);
    }
    let entropy = laplacian_entropy(&laplacian.matrix, solver)?;
    info!(
        "von Neumann entropy ({}) of {} vertices / {} edges: {:.7}",
        mode,
        graph.nvertices(),
        graph.ecount(),
        entropy
    );
    Ok(entropy)
}

//! # Sparse adjacency and Laplacian matrices
//!
//! Converts a [`Graph`] into CSR matrices:
//!
//! 1. **Adjacency**: `A[u][v] = A[v][u] = w(u, v)`, zero elsewhere
//! 2. **Combinatorial Laplacian**: `L = D − A`, `D` the diagonal strength matrix
//! 3. **Normalized Laplacian**: `L_sym = I − D^{-1/2} A D^{-1/2}`
//! 4. **Density matrix**: `ρ = L / tr(L)`, unit trace, used for VNGE
//!
//! Vertices of degree zero map their normalisation factor to 0, so their
//! row and column of the normalized Laplacian are entirely zero (as in
//! `scipy.sparse.csgraph.laplacian(normed=True)`).
//!
//! All builders are pure functions of their input; calling them twice on the
//! same input yields bit-identical matrices.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use crate::errors::EntropyError;
use crate::graph::Graph;

/// Which Laplacian the spectrum is taken from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaplacianMode {
    /// `L = D − A`
    #[default]
    Combinatorial,
    /// `I − D^{-1/2} A D^{-1/2}`
    Normalized,
}

impl LaplacianMode {
    pub fn is_normalized(&self) -> bool {
        matches!(self, LaplacianMode::Normalized)
    }
}

impl FromStr for LaplacianMode {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "laplacian" | "Laplacian" => Ok(LaplacianMode::Combinatorial),
            "normalized laplacian" | "Normalized Laplacian" => Ok(LaplacianMode::Normalized),
            other => Err(EntropyError::invalid(format!(
                "unknown Laplacian mode '{}': expected 'laplacian' or 'normalized laplacian'",
                other
            ))),
        }
    }
}

impl fmt::Display for LaplacianMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaplacianMode::Combinatorial => write!(f, "laplacian"),
            LaplacianMode::Normalized => write!(f, "normalized laplacian"),
        }
    }
}

/// Symmetric sparse adjacency matrix of `graph`.
pub fn build_adjacency(graph: &Graph) -> CsMat<f64> {
    let n = graph.nvertices();
    let mut triplets = TriMat::with_capacity((n, n), 2 * graph.ecount());
    for e in graph.edges() {
        triplets.add_triplet(e.u, e.v, e.weight);
        triplets.add_triplet(e.v, e.u, e.weight);
    }
    let adjacency: CsMat<f64> = triplets.to_csr();
    trace!(
        "Built adjacency {}x{} with {} non-zeros",
        n,
        n,
        adjacency.nnz()
    );
    adjacency
}

/// Row sums of a sparse matrix (vertex strengths for an adjacency matrix).
pub fn row_sums(matrix: &CsMat<f64>) -> Vec<f64> {
    let mut sums = vec![0.0; matrix.rows()];
    for (i, row) in matrix.outer_iterator().enumerate() {
        sums[i] = row.iter().map(|(_, &w)| w).sum();
    }
    sums
}

/// Laplacian of a symmetric adjacency matrix.
///
/// `normalized == false` gives `D − A`; `normalized == true` gives
/// `I − D^{-1/2} A D^{-1/2}` with zero rows/columns for isolated vertices.
pub fn build_laplacian(adjacency: &CsMat<f64>, normalized: bool) -> CsMat<f64> {
    let n = adjacency.rows();
    let degrees = row_sums(adjacency);

    let inv_sqrt: Vec<f64> = degrees
        .iter()
        .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
        .collect();

    let mut triplets = TriMat::with_capacity((n, n), adjacency.nnz() + n);
    for (i, row) in adjacency.outer_iterator().enumerate() {
        let diagonal = if normalized {
            if degrees[i] > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            degrees[i]
        };
        if diagonal != 0.0 {
            triplets.add_triplet(i, i, diagonal);
        }

        for (j, &w) in row.iter() {
            if i == j {
                continue;
            }
            let value = if normalized {
                -w * inv_sqrt[i] * inv_sqrt[j]
            } else {
                -w
            };
            if value != 0.0 {
                triplets.add_triplet(i, j, value);
            }
        }
    }

    let laplacian: CsMat<f64> = triplets.to_csr();
    trace!(
        "Built {} Laplacian {}x{} with {} non-zeros",
        if normalized { "normalized" } else { "combinatorial" },
        n,
        n,
        laplacian.nnz()
    );
    laplacian
}

/// Trace of a square sparse matrix.
pub fn trace(matrix: &CsMat<f64>) -> f64 {
    (0..matrix.rows().min(matrix.cols()))
        .map(|i| matrix.get(i, i).copied().unwrap_or(0.0))
        .sum()
}

/// `L / tr(L)` for a combinatorial Laplacian, or `None` if the trace is zero.
pub fn density_matrix(laplacian: &CsMat<f64>) -> Option<CsMat<f64>> {
    let tr = trace(laplacian);
    if tr <= 0.0 {
        return None;
    }
    Some(laplacian.map(|&x| x / tr))
}

/// Dense row-major copy of a sparse matrix.
pub fn sparse_to_dense(sparse: &CsMat<f64>) -> nalgebra::DMatrix<f64> {
    let (rows, cols) = sparse.shape();
    let mut dense = nalgebra::DMatrix::<f64>::zeros(rows, cols);
    for (i, row) in sparse.outer_iterator().enumerate() {
        for (j, &value) in row.iter() {
            dense[(i, j)] += value;
        }
    }
    dense
}

/// `y = M x` for a CSR matrix.
pub fn sparse_matvec(matrix: &CsMat<f64>, x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(matrix.cols(), x.len());
    let mut y = vec![0.0; matrix.rows()];
    for (i, row) in matrix.outer_iterator().enumerate() {
        y[i] = row.iter().map(|(j, &m)| m * x[j]).sum();
    }
    y
}

/// A Laplacian together with the bookkeeping needed to inspect it.
#[derive(Debug, Clone)]
pub struct GraphLaplacian {
    pub matrix: CsMat<f64>,
    pub nnodes: usize,
    pub mode: LaplacianMode,
}

impl GraphLaplacian {
    /// Build the Laplacian of `graph` in the requested mode.
    pub fn from_graph(graph: &Graph, mode: LaplacianMode) -> Self {
        debug!(
            "Building {} for {} vertices, {} edges",
            mode,
            graph.nvertices(),
            graph.ecount()
        );
        let adjacency = build_adjacency(graph);
        let matrix = build_laplacian(&adjacency, mode.is_normalized());
        trace!(
            "Laplacian {}x{} with {} non-zeros",
            matrix.rows(),
            matrix.cols(),
            matrix.nnz()
        );
        Self {
            nnodes: graph.nvertices(),
            matrix,
            mode,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.nnodes && j < self.nnodes,
            "Index out of bounds: ({}, {}) for {}x{} matrix",
            i,
            j,
            self.nnodes,
            self.nnodes
        );
        self.matrix.get(i, j).copied().unwrap_or(0.0)
    }

    /// Diagonal entries.
    pub fn degrees(&self) -> Vec<f64> {
        (0..self.nnodes).map(|i| self.get(i, i)).collect()
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        for (i, row) in self.matrix.outer_iterator().enumerate() {
            for (j, &v) in row.iter() {
                let mirrored = self.matrix.get(j, i).copied().unwrap_or(0.0);
                if (v - mirrored).abs() > tolerance {
                    trace!("Asymmetry at ({}, {}): {} vs {}", i, j, v, mirrored);
                    return false;
                }
            }
        }
        true
    }

    /// Check the structural properties of the Laplacian.
    ///
    /// Row sums must vanish for the combinatorial form only; the normalized form
    /// annihilates `D^{1/2}·1` instead of the constant vector.
    pub fn verify_properties(&self, tolerance: f64) -> LaplacianValidation {
        let mut validation = LaplacianValidation::new();

        for (i, row) in self.matrix.outer_iterator().enumerate() {
            let row_sum: f64 = row.iter().map(|(_, &v)| v).sum();
            validation.max_row_sum_error = validation.max_row_sum_error.max(row_sum.abs());
            if self.mode == LaplacianMode::Combinatorial && row_sum.abs() > tolerance {
                validation.row_sum_violations.push((i, row_sum));
            }
            let diagonal = self.matrix.get(i, i).copied().unwrap_or(0.0);
            if diagonal < 0.0 {
                validation.negative_diagonal.push((i, diagonal));
            }
        }

        validation.is_symmetric = self.is_symmetric(tolerance);
        validation.is_valid = validation.row_sum_violations.is_empty()
            && validation.negative_diagonal.is_empty()
            && validation.is_symmetric;

        debug!(
            "Laplacian validation: valid={}, symmetric={}, max row sum={:.2e}",
            validation.is_valid, validation.is_symmetric, validation.max_row_sum_error
        );
        if !validation.is_valid {
            warn!("Laplacian validation failed - matrix may have numerical issues");
        }
        validation
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn sparsity(matrix: &CsMat<f64>) -> f64 {
        let (rows, cols) = matrix.shape();
        let total = rows * cols;
        if total == 0 {
            return 1.0;
        }
        1.0 - (matrix.nnz() as f64) / (total as f64)
    }

    pub fn statistics(&self) -> LaplacianStats {
        let degrees = self.degrees();
        let min_degree = degrees.iter().copied().fold(f64::INFINITY, f64::min);
        let max_degree = degrees.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_degree = degrees.iter().sum::<f64>() / self.nnodes as f64;
        LaplacianStats {
            shape: self.shape(),
            nnz: self.nnz(),
            sparsity: Self::sparsity(&self.matrix),
            min_degree,
            max_degree,
            mean_degree,
            mode: self.mode,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaplacianValidation {
    pub is_valid: bool,
    pub is_symmetric: bool,
    pub max_row_sum_error: f64,
    pub row_sum_violations: Vec<(usize, f64)>,
    pub negative_diagonal: Vec<(usize, f64)>,
}

impl LaplacianValidation {
    fn new() -> Self {
        Self {
            is_valid: false,
            is_symmetric: false,
            max_row_sum_error: 0.0,
            row_sum_violations: Vec::new(),
            negative_diagonal: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaplacianStats {
    pub shape: (usize, usize),
    pub nnz: usize,
    pub sparsity: f64,
    pub min_degree: f64,
    pub max_degree: f64,
    pub mean_degree: f64,
    pub mode: LaplacianMode,
}

impl fmt::Display for LaplacianStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Laplacian Statistics ({}):", self.mode)?;
        writeln!(f, "  Shape: {:?}", self.shape)?;
        writeln!(
            f,
            "  Non-zero entries: {} ({:.2}% dense)",
            self.nnz,
            (1.0 - self.sparsity) * 100.0
        )?;
        writeln!(
            f,
            "  Diagonal range: [{:.4}, {:.4}]",
            self.min_degree, self.max_degree
        )?;
        writeln!(f, "  Mean diagonal: {:.4}", self.mean_degree)?;
        Ok(())
    }
}

impl fmt::Display for GraphLaplacian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GraphLaplacian ({}×{}, {}):", self.nnodes, self.nnodes, self.mode)?;
        write!(f, "{}", self.statistics())
    }
}

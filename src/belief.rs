//! Fast belief propagation and DeltaCon graph similarity.
//!
//! [`FastBeliefPropagation`] approximates the solution of
//! `(I + aD − cA)·x = y` by the truncated power series
//! `x = Σ_{k=0}^{10} W^k y` with `W = cA − aD`. The homophily factor `h` is picked
//! so that the series converges:
//!
//! ```text
//! h1 = 1 / (2 + 2·dmax)
//! h2 = sqrt((−c1 + sqrt(c1² + 4·c2)) / (8·c2)),  c1 = 2 + Σd,  c2 = Σd² − 1
//! h  = max(h1, h2),  a = 4h² / (1 − 4h²),  c = 2h / (1 − 4h²)
//! ```
//!
//! [`delta_con`] compares two graphs on the same vertex set through the belief
//! vectors of `g` random vertex groups.

use log::{debug, trace};
use rand::Rng;
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::errors::{EntropyError, EntropyResult};
use crate::laplacian::{row_sums, sparse_matvec};

pub const DELTACON_GROUPS: usize = 30;
pub const FBP_ITERATIONS: usize = 10;

/// `W` below this maximum is treated as the zero matrix.
const NEGLIGIBLE_PROPAGATION: f64 = 1e-9;

/// Propagation operator `W = cA − aD` for one adjacency matrix.
#[derive(Debug, Clone)]
pub struct FastBeliefPropagation {
    pub homophily: f64,
    pub degree_factor: f64,
    pub coupling: f64,
    propagation: CsMat<f64>,
    max_entry: f64,
}

impl FastBeliefPropagation {
    pub fn new(adjacency: &CsMat<f64>) -> Self {
        let n = adjacency.rows();
        let degrees = row_sums(adjacency);

        let max_degree = degrees.iter().copied().fold(0.0_f64, f64::max);
        let h1 = 1.0 / (2.0 + 2.0 * max_degree);
        let c1 = 2.0 + degrees.iter().sum::<f64>();
        let c2 = degrees.iter().map(|d| d * d).sum::<f64>() - 1.0;
        let h2 = if c2 > 0.0 {
            ((-c1 + (c1 * c1 + 4.0 * c2).sqrt()) / (8.0 * c2)).sqrt()
        } else {
            0.0
        };
        let h = h1.max(h2);
        let degree_factor = 4.0 * h * h / (1.0 - 4.0 * h * h);
        let coupling = 2.0 * h / (1.0 - 4.0 * h * h);

        let mut triplets = TriMat::with_capacity((n, n), adjacency.nnz() + n);
        for (i, row) in adjacency.outer_iterator().enumerate() {
            for (j, &w) in row.iter() {
                if i != j && w != 0.0 {
                    triplets.add_triplet(i, j, coupling * w);
                }
            }
            if degrees[i] != 0.0 {
                triplets.add_triplet(i, i, -degree_factor * degrees[i]);
            }
        }
        let propagation: CsMat<f64> = triplets.to_csr();

        // Implicit zeros count towards the maximum unless the matrix is full.
        let floor = if propagation.nnz() < n * n {
            0.0
        } else {
            f64::NEG_INFINITY
        };
        let max_entry = propagation.data().iter().copied().fold(floor, f64::max);

        trace!(
            "FaBP: h1={:.4e} h2={:.4e} h={:.4e} a={:.4e} c={:.4e} max(W)={:.4e}",
            h1,
            h2,
            h,
            degree_factor,
            coupling,
            max_entry
        );

        Self {
            homophily: h,
            degree_factor,
            coupling,
            propagation,
            max_entry,
        }
    }

    pub fn propagation(&self) -> &CsMat<f64> {
        &self.propagation
    }

    /// Beliefs `x ≈ (I + aD − cA)^{-1} y`.
    pub fn solve(&self, prior: &[f64]) -> Vec<f64> {
        let mut beliefs = prior.to_vec();
        if self.max_entry <= NEGLIGIBLE_PROPAGATION {
            return beliefs;
        }
        let mut delta = prior.to_vec();
        for _ in 0..FBP_ITERATIONS {
            delta = sparse_matvec(&self.propagation, &delta);
            beliefs.iter_mut().zip(&delta).for_each(|(x, d)| *x += d);
        }
        beliefs
    }
}

/// One-shot fast belief propagation.
pub fn fast_belief_propagation(adjacency: &CsMat<f64>, prior: &[f64]) -> EntropyResult<Vec<f64>> {
    if adjacency.rows() != adjacency.cols() || adjacency.rows() != prior.len() {
        return Err(EntropyError::invalid(format!(
            "belief propagation on a {}x{} matrix with a prior of length {}",
            adjacency.rows(),
            adjacency.cols(),
            prior.len()
        )));
    }
    Ok(FastBeliefPropagation::new(adjacency).solve(prior))
}

/// `N × g` belief matrix: column `k` holds the beliefs seeded by group `k`.
fn belief_matrix(
    adjacency: &CsMat<f64>,
    membership: &[usize],
    groups: usize,
) -> EntropyResult<DenseMatrix<f64>> {
    let n = adjacency.rows();
    let fabp = FastBeliefPropagation::new(adjacency);
    let columns: Vec<Vec<f64>> = (0..groups)
        .into_par_iter()
        .map(|k| {
            let prior: Vec<f64> = membership
                .iter()
                .map(|&m| if m == k { 1.0 } else { 0.0 })
                .collect();
            fabp.solve(&prior)
        })
        .collect();

    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| columns.iter().map(|c| c[i]).collect())
        .collect();
    DenseMatrix::from_2d_vec(&rows)
        .map_err(|e| EntropyError::Numerical(format!("belief matrix: {}", e)))
}

/// Root Euclidean distance `sqrt(Σ (√S1 − √S2)²)`; negative beliefs count as 0.
fn root_euclidean(s1: &DenseMatrix<f64>, s2: &DenseMatrix<f64>) -> f64 {
    let (rows, cols) = s1.shape();
    let mut total = 0.0;
    for i in 0..rows {
        for j in 0..cols {
            let a = (*s1.get((i, j))).max(0.0).sqrt();
            let b = (*s2.get((i, j))).max(0.0).sqrt();
            total += (a - b) * (a - b);
        }
    }
    total.sqrt()
}

/// DeltaCon similarity in `(0, 1]` of two graphs on the same vertex set.
///
/// Vertices are split uniformly at random into `groups` groups; each group seeds
/// one belief propagation per graph.
pub fn delta_con<R: Rng + ?Sized>(
    a1: &CsMat<f64>,
    a2: &CsMat<f64>,
    groups: usize,
    rng: &mut R,
) -> EntropyResult<f64> {
    if a1.shape() != a2.shape() {
        return Err(EntropyError::invalid(format!(
            "DeltaCon needs matrices of equal shape, got {:?} and {:?}",
            a1.shape(),
            a2.shape()
        )));
    }
    if a1.rows() != a1.cols() || a1.rows() == 0 {
        return Err(EntropyError::invalid(format!(
            "DeltaCon needs non-empty square matrices, got {:?}",
            a1.shape()
        )));
    }
    if groups == 0 {
        return Err(EntropyError::invalid("DeltaCon needs at least one group"));
    }

    let membership: Vec<usize> = (0..a1.rows()).map(|_| rng.gen_range(0..groups)).collect();
    let s1 = belief_matrix(a1, &membership, groups)?;
    let s2 = belief_matrix(a2, &membership, groups)?;

    let distance = root_euclidean(&s1, &s2);
    let similarity = 1.0 / (1.0 + distance);
    debug!(
        "DeltaCon: {} vertices, {} groups, rootED={:.6e}, similarity={:.7}",
        a1.rows(),
        groups,
        distance,
        similarity
    );
    Ok(similarity)
}

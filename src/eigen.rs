//! Symmetric eigensolvers, injected as a strategy.
//!
//! - [`DenseEigensolver`]: full spectrum via `nalgebra::SymmetricEigen`
//! - [`PowerIteration`]: sparse extremal method for the largest eigenvalue and
//!   the Fiedler vector (shifted iteration deflated against the constant vector)
//! - [`AutoEigensolver`]: extremal queries go through power iteration except on
//!   tiny matrices (at most `dense_limit` rows)
//!
//! Full spectra always go through the dense solver: exact VNGE needs every
//! eigenvalue.

use log::{debug, trace, warn};
use nalgebra::{DMatrix, SymmetricEigen};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sprs::CsMat;

use crate::errors::{EntropyError, EntropyResult};
use crate::laplacian::{sparse_matvec, sparse_to_dense};

/// Largest order for which extremal queries still use the dense solver.
pub const DEFAULT_DENSE_LIMIT: usize = 64;

/// Eigen-queries needed by the estimators, over a symmetric sparse matrix.
pub trait SymmetricEigensolver: Send + Sync {
    /// All eigenvalues, ascending.
    fn eigenvalues(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>>;

    /// The largest eigenvalue.
    fn largest_eigenvalue(&self, matrix: &CsMat<f64>) -> EntropyResult<f64>;

    /// Eigenvector of the second-smallest eigenvalue of a Laplacian.
    fn fiedler_vector(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>>;
}

fn check_square(matrix: &CsMat<f64>) -> EntropyResult<usize> {
    let (rows, cols) = matrix.shape();
    if rows != cols {
        return Err(EntropyError::invalid(format!(
            "matrix must be square, got {}x{}",
            rows, cols
        )));
    }
    Ok(rows)
}

fn check_finite(values: &[f64], what: &str) -> EntropyResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EntropyError::Numerical(format!(
            "{} contains non-finite values",
            what
        )))
    }
}

/// Dense symmetric eigendecomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseEigensolver;

impl DenseEigensolver {
    fn decompose(matrix: &CsMat<f64>) -> EntropyResult<SymmetricEigen<f64, nalgebra::Dyn>> {
        let n = check_square(matrix)?;
        trace!("Dense eigendecomposition of {}x{} matrix", n, n);
        let dense: DMatrix<f64> = sparse_to_dense(matrix);
        Ok(SymmetricEigen::new(dense))
    }
}

impl SymmetricEigensolver for DenseEigensolver {
    fn eigenvalues(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        if check_square(matrix)? == 0 {
            return Ok(Vec::new());
        }
        let mut values: Vec<f64> = Self::decompose(matrix)?.eigenvalues.iter().copied().collect();
        check_finite(&values, "spectrum")?;
        values.sort_by(|a, b| a.total_cmp(b));
        Ok(values)
    }

    fn largest_eigenvalue(&self, matrix: &CsMat<f64>) -> EntropyResult<f64> {
        Ok(self
            .eigenvalues(matrix)?
            .last()
            .copied()
            .unwrap_or(0.0))
    }

    fn fiedler_vector(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        let n = check_square(matrix)?;
        if n < 2 {
            return Ok(vec![0.0; n]);
        }
        let eigen = Self::decompose(matrix)?;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let column = order[1];
        let vector: Vec<f64> = eigen.eigenvectors.column(column).iter().copied().collect();
        check_finite(&vector, "Fiedler vector")?;
        debug!(
            "Algebraic connectivity {:.6e} (dense)",
            eigen.eigenvalues[column]
        );
        Ok(vector)
    }
}

/// Power iteration for extremal eigen-queries on sparse matrices.
#[derive(Debug, Clone)]
pub struct PowerIteration {
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
}

impl Default for PowerIteration {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-10,
            seed: 42,
        }
    }
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 1e-300 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl PowerIteration {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self {
            max_iter,
            tol,
            ..Default::default()
        }
    }

    fn start_vector(&self, n: usize) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut v: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() - 0.5).collect();
        normalize(&mut v);
        v
    }

    /// Dominant eigenpair of `x ↦ op(x)`, optionally kept orthogonal to `deflate`.
    fn iterate<F>(&self, n: usize, op: F, deflate: Option<&[f64]>) -> (f64, Vec<f64>)
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let mut v = self.start_vector(n);
        if let Some(d) = deflate {
            let p = dot(&v, d);
            v.iter_mut().zip(d).for_each(|(x, y)| *x -= p * y);
            normalize(&mut v);
        }

        let mut lambda = 0.0;
        for iter in 0..self.max_iter {
            let mut w = op(&v);
            if let Some(d) = deflate {
                let p = dot(&w, d);
                w.iter_mut().zip(d).for_each(|(x, y)| *x -= p * y);
            }
            let next = dot(&v, &w);
            if normalize(&mut w) <= 1e-300 {
                trace!("Power iteration hit the null space at step {}", iter);
                return (0.0, v);
            }
            if (next - lambda).abs() <= self.tol * next.abs().max(1.0) {
                trace!("Power iteration converged after {} steps", iter + 1);
                return (next, w);
            }
            lambda = next;
            v = w;
        }
        warn!(
            "Power iteration reached {} iterations without converging",
            self.max_iter
        );
        (lambda, v)
    }
}

impl SymmetricEigensolver for PowerIteration {
    fn eigenvalues(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        DenseEigensolver.eigenvalues(matrix)
    }

    fn largest_eigenvalue(&self, matrix: &CsMat<f64>) -> EntropyResult<f64> {
        let n = check_square(matrix)?;
        if n == 0 || matrix.nnz() == 0 {
            return Ok(0.0);
        }
        let (lambda, _) = self.iterate(n, |x| sparse_matvec(matrix, x), None);
        if !lambda.is_finite() {
            return Err(EntropyError::Numerical(
                "power iteration diverged".to_string(),
            ));
        }
        Ok(lambda)
    }

    fn fiedler_vector(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        let n = check_square(matrix)?;
        if n < 2 {
            return Ok(vec![0.0; n]);
        }
        // Smallest non-trivial eigenpair of L is the dominant one of (σI − L)
        // restricted to the complement of the constant vector.
        let sigma = self.largest_eigenvalue(matrix)?;
        let ones = vec![1.0 / (n as f64).sqrt(); n];
        let (shifted, vector) = self.iterate(
            n,
            |x| {
                let lx = sparse_matvec(matrix, x);
                x.iter().zip(lx).map(|(xi, li)| sigma * xi - li).collect()
            },
            Some(&ones),
        );
        check_finite(&vector, "Fiedler vector")?;
        debug!("Algebraic connectivity {:.6e} (power)", sigma - shifted);
        Ok(vector)
    }
}

/// Full spectra through the dense solver, extremal queries through power
/// iteration once the matrix has more than `dense_limit` rows.
#[derive(Debug, Clone)]
pub struct AutoEigensolver {
    pub dense_limit: usize,
    pub power: PowerIteration,
}

impl Default for AutoEigensolver {
    fn default() -> Self {
        Self {
            dense_limit: DEFAULT_DENSE_LIMIT,
            power: PowerIteration::default(),
        }
    }
}

impl AutoEigensolver {
    pub fn with_dense_limit(dense_limit: usize) -> Self {
        Self {
            dense_limit,
            ..Default::default()
        }
    }
}

impl SymmetricEigensolver for AutoEigensolver {
    fn eigenvalues(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        DenseEigensolver.eigenvalues(matrix)
    }

    fn largest_eigenvalue(&self, matrix: &CsMat<f64>) -> EntropyResult<f64> {
        if matrix.rows() <= self.dense_limit {
            DenseEigensolver.largest_eigenvalue(matrix)
        } else {
            self.power.largest_eigenvalue(matrix)
        }
    }

    fn fiedler_vector(&self, matrix: &CsMat<f64>) -> EntropyResult<Vec<f64>> {
        if matrix.rows() <= self.dense_limit {
            DenseEigensolver.fiedler_vector(matrix)
        } else {
            self.power.fiedler_vector(matrix)
        }
    }
}

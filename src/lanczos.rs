//! Batched Lanczos tridiagonalisation with full re-orthogonalisation.
//!
//! For each of `nvectors` random unit start vectors `v₀` the engine builds an
//! orthonormal basis `V = [v₀ … v_{m−1}]` of the Krylov space
//! `K_m(A, v₀)` and the symmetric tridiagonal `T = Vᵀ A V`:
//!
//! ```text
//! w      = A v_j − β_{j−1} v_{j−1}
//! α_j    = ⟨w, v_j⟩
//! w     ← w − α_j v_j − Σ_i ⟨w, v_i⟩ v_i      (full re-orthogonalisation)
//! β_j    = ‖w‖,  v_{j+1} = w / β_j
//! ```
//!
//! A probe whose `β_j` falls below [`BREAKDOWN_TOL`] has found an invariant
//! subspace: it stops and keeps its valid prefix. The batch ends early once every
//! probe has stopped. Probes are independent and advance in parallel; the matrix
//! is only read.

use log::{debug, info, trace, warn};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use sprs::CsMat;

use crate::errors::{EntropyError, EntropyResult};
use crate::laplacian::sparse_matvec;

pub const BREAKDOWN_TOL: f64 = 1e-6;

/// Lanczos output for a single start vector.
#[derive(Debug, Clone)]
pub struct LanczosRun {
    /// Diagonal of `T`, one entry per valid step.
    pub alpha: Vec<f64>,
    /// Off-diagonal of `T`, `alpha.len() − 1` entries.
    pub beta: Vec<f64>,
    /// Orthonormal Krylov basis vectors, one per valid step.
    pub basis: Vec<Vec<f64>>,
}

impl LanczosRun {
    pub fn steps(&self) -> usize {
        self.alpha.len()
    }

    /// Dense `steps × steps` tridiagonal matrix.
    pub fn tridiagonal(&self) -> DMatrix<f64> {
        let k = self.steps();
        let mut t = DMatrix::<f64>::zeros(k, k);
        for (i, &a) in self.alpha.iter().enumerate() {
            t[(i, i)] = a;
        }
        for (i, &b) in self.beta.iter().enumerate().take(k.saturating_sub(1)) {
            t[(i, i + 1)] = b;
            t[(i + 1, i)] = b;
        }
        t
    }

    /// Basis as an `N × steps` matrix with orthonormal columns.
    pub fn basis_matrix(&self) -> DMatrix<f64> {
        let n = self.basis.first().map(|v| v.len()).unwrap_or(0);
        DMatrix::from_fn(n, self.steps(), |i, j| self.basis[j][i])
    }
}

/// All probes of one Lanczos batch.
#[derive(Debug, Clone)]
pub struct LanczosState {
    pub runs: Vec<LanczosRun>,
    pub requested_steps: usize,
}

impl LanczosState {
    pub fn nvectors(&self) -> usize {
        self.runs.len()
    }

    /// Longest valid prefix over the batch.
    pub fn steps(&self) -> usize {
        self.runs.iter().map(|r| r.steps()).max().unwrap_or(0)
    }

    pub fn is_truncated(&self) -> bool {
        self.runs.iter().any(|r| r.steps() < self.requested_steps)
    }

    pub fn tridiagonals(&self) -> Vec<DMatrix<f64>> {
        self.runs.iter().map(|r| r.tridiagonal()).collect()
    }
}

struct Probe {
    run: LanczosRun,
    done: bool,
}

impl Probe {
    fn start(n: usize, seed: u64, index: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index as u64);
        let mut v: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        v.iter_mut().for_each(|x| *x /= norm);
        Self {
            run: LanczosRun {
                alpha: Vec::new(),
                beta: Vec::new(),
                basis: vec![v],
            },
            done: false,
        }
    }

    /// Step `j`: fills `α_j` and, unless this is the last step, `β_j` and `v_{j+1}`.
    fn advance(&mut self, matrix: &CsMat<f64>, j: usize, steps: usize) {
        let run = &mut self.run;
        let current = &run.basis[j];
        let mut w = sparse_matvec(matrix, current);
        if j > 0 {
            let b = run.beta[j - 1];
            let previous = &run.basis[j - 1];
            w.iter_mut().zip(previous).for_each(|(x, p)| *x -= b * p);
        }

        let alpha: f64 = w.iter().zip(current).map(|(x, v)| x * v).sum();
        run.alpha.push(alpha);

        if j + 1 >= steps {
            self.done = true;
            return;
        }

        w.iter_mut().zip(current).for_each(|(x, v)| *x -= alpha * v);
        for b in &run.basis {
            let proj: f64 = w.iter().zip(b).map(|(x, y)| x * y).sum();
            w.iter_mut().zip(b).for_each(|(x, y)| *x -= proj * y);
        }

        let beta = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        if !(beta > BREAKDOWN_TOL) {
            trace!("Lanczos breakdown at step {} (β={:.3e})", j, beta);
            self.done = true;
            return;
        }
        w.iter_mut().for_each(|x| *x /= beta);
        run.beta.push(beta);
        run.basis.push(w);
    }
}

/// Configured Lanczos engine.
#[derive(Debug, Clone)]
pub struct LanczosEngine {
    pub steps: usize,
    pub nvectors: usize,
    pub seed: Option<u64>,
}

impl LanczosEngine {
    pub fn new(steps: usize, nvectors: usize) -> Self {
        Self {
            steps,
            nvectors,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn run(&self, matrix: &CsMat<f64>) -> EntropyResult<LanczosState> {
        lanczos(matrix, self.steps, self.nvectors, self.seed)
    }
}

/// Run `steps` Lanczos iterations for `nvectors` random start vectors.
pub fn lanczos(
    matrix: &CsMat<f64>,
    steps: usize,
    nvectors: usize,
    seed: Option<u64>,
) -> EntropyResult<LanczosState> {
    let (rows, cols) = matrix.shape();
    if rows != cols {
        return Err(EntropyError::invalid(format!(
            "Lanczos needs a square matrix, got {}x{}",
            rows, cols
        )));
    }
    if rows == 0 {
        return Err(EntropyError::invalid("Lanczos on an empty matrix"));
    }
    if steps == 0 || nvectors == 0 {
        return Err(EntropyError::invalid(format!(
            "Lanczos needs steps > 0 and nvectors > 0, got steps={} nvectors={}",
            steps, nvectors
        )));
    }
    // The Krylov space of an n×n matrix has at most n dimensions.
    let steps_eff = steps.min(rows);
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());

    debug!(
        "Lanczos: {}x{} matrix, {} steps, {} probes, seed={}",
        rows, cols, steps_eff, nvectors, seed
    );

    let mut probes: Vec<Probe> = (0..nvectors)
        .into_par_iter()
        .map(|p| Probe::start(rows, seed, p))
        .collect();

    for j in 0..steps_eff {
        if probes.iter().all(|p| p.done) {
            info!(
                "Lanczos stopped after {} of {} steps: every probe broke down",
                j, steps_eff
            );
            break;
        }
        probes
            .par_iter_mut()
            .filter(|p| !p.done)
            .for_each(|p| p.advance(matrix, j, steps_eff));
    }

    let runs: Vec<LanczosRun> = probes.into_iter().map(|p| p.run).collect();
    let state = LanczosState {
        runs,
        requested_steps: steps_eff,
    };

    if state.is_truncated() {
        let short = state
            .runs
            .iter()
            .filter(|r| r.steps() < steps_eff)
            .count();
        warn!(
            "Lanczos returned a truncated prefix for {} of {} probes (requested {} steps)",
            short, nvectors, steps_eff
        );
    }
    Ok(state)
}

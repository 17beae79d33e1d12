//! Maximum-entropy edge addition.
//!
//! [`MaxEntropyOptimizer`] grows a graph one edge per iteration under an edge
//! budget, choosing each edge with a [`SearchPolicy`]:
//!
//! - `Greedy`: the non-edge `(u, v)` minimising the increase of `Σ d·log2 d`,
//!   `Δ = f(d_u+1) − f(d_u) + f(d_v+1) − f(d_v)`. Vertices are kept sorted by
//!   degree and scanned with two pointers; once a candidate is found every
//!   later pair with a larger `Δ` is pruned.
//! - `Random`: a uniformly drawn non-edge.
//! - `AlgebraicConnectivity`: vertices sorted by their Fiedler-vector entry;
//!   the non-edge with the widest Fiedler gap found by the scan is added.
//!
//! The session state is an adjacency list and a degree array updated in
//! lockstep. Every `interval` accepted edges the exact von Neumann entropy is
//! recorded alongside the running structural information.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use log::{debug, info, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use crate::eigen::{AutoEigensolver, SymmetricEigensolver};
use crate::errors::{EntropyError, EntropyResult};
use crate::exact::von_neumann_entropy_with;
use crate::graph::Graph;
use crate::kernel::xlog2x;
use crate::laplacian::LaplacianMode;

/// Distance to `log2 N` below which greedy search stops.
pub const MAX_ENTROPY_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPolicy {
    Greedy,
    Random,
    AlgebraicConnectivity,
}

impl FromStr for SearchPolicy {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(SearchPolicy::Greedy),
            "random" => Ok(SearchPolicy::Random),
            "algebraic connectivity" => Ok(SearchPolicy::AlgebraicConnectivity),
            other => Err(EntropyError::invalid(format!(
                "unknown search policy '{}': expected greedy, random or algebraic connectivity",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchPolicy::Greedy => write!(f, "greedy"),
            SearchPolicy::Random => write!(f, "random"),
            SearchPolicy::AlgebraicConnectivity => write!(f, "algebraic connectivity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetExhausted,
    /// Structural information reached `log2 N`.
    MaximumEntropy,
    /// No vertex pair is left to connect.
    Infeasible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    Initialized,
    Searching,
    Stopped(StopReason),
}

/// Entropy snapshot taken during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyRecord {
    pub iteration: usize,
    pub ecount: usize,
    pub structural_information: f64,
    pub von_neumann_entropy: f64,
}

impl fmt::Display for EntropyRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "iteration {:>6}, ecount {:>8}: structural information ({:8.7}), von Neumann entropy ({:8.7})",
            self.iteration, self.ecount, self.structural_information, self.von_neumann_entropy
        )
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationReport {
    pub policy: SearchPolicy,
    pub stop_reason: StopReason,
    pub added_edges: Vec<(usize, usize)>,
    pub records: Vec<EntropyRecord>,
    pub ecount: usize,
    pub structural_information: f64,
}

pub struct MaxEntropyOptimizer {
    policy: SearchPolicy,
    budget: usize,
    interval: usize,
    neighbours: Vec<HashSet<usize>>,
    degrees: Vec<usize>,
    order: Vec<usize>,
    ecount: usize,
    sum_dlogd: f64,
    structural_information: f64,
    iteration: usize,
    state: OptimizerState,
    added: Vec<(usize, usize)>,
    records: Vec<EntropyRecord>,
    rng: ChaCha8Rng,
    solver: Box<dyn SymmetricEigensolver>,
}

#[inline]
fn f(x: usize) -> f64 {
    xlog2x(x as f64)
}

/// `log2(2m) − Σ d·log2 d / 2m`, or 0 without edges.
fn si_from_sum(ecount: usize, sum_dlogd: f64) -> f64 {
    if ecount == 0 {
        return 0.0;
    }
    let two_m = 2.0 * ecount as f64;
    two_m.log2() - sum_dlogd / two_m
}

impl MaxEntropyOptimizer {
    pub fn new(
        graph: &Graph,
        policy: SearchPolicy,
        budget: usize,
        interval: usize,
        seed: u64,
    ) -> EntropyResult<Self> {
        if interval == 0 {
            return Err(EntropyError::invalid("reporting interval must be positive"));
        }
        if !graph.is_unweighted() {
            warn!("MaxEntropyOptimizer ignores edge weights; using the graph structure only");
        }

        let n = graph.nvertices();
        let mut neighbours = vec![HashSet::new(); n];
        for e in graph.edges() {
            neighbours[e.u].insert(e.v);
            neighbours[e.v].insert(e.u);
        }
        let degrees = graph.degree_counts();
        let sum_dlogd: f64 = degrees.iter().map(|&d| f(d)).sum();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&v| degrees[v]);

        info!(
            "MaxEntropyOptimizer: policy={}, {} vertices, {} edges, budget={}, interval={}",
            policy,
            n,
            graph.ecount(),
            budget,
            interval
        );

        Ok(Self {
            policy,
            budget,
            interval,
            neighbours,
            degrees,
            order,
            ecount: graph.ecount(),
            sum_dlogd,
            structural_information: si_from_sum(graph.ecount(), sum_dlogd),
            iteration: 0,
            state: OptimizerState::Initialized,
            added: Vec::new(),
            records: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            solver: Box::new(AutoEigensolver::default()),
        })
    }

    pub fn with_solver(mut self, solver: Box<dyn SymmetricEigensolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    pub fn ecount(&self) -> usize {
        self.ecount
    }

    pub fn structural_information(&self) -> f64 {
        self.structural_information
    }

    pub fn records(&self) -> &[EntropyRecord] {
        &self.records
    }

    pub fn added_edges(&self) -> &[(usize, usize)] {
        &self.added
    }

    #[inline]
    fn connected(&self, u: usize, v: usize) -> bool {
        self.neighbours[u].contains(&v)
    }

    fn nvertices(&self) -> usize {
        self.degrees.len()
    }

    fn is_complete(&self) -> bool {
        let n = self.nvertices();
        self.ecount >= n * n.saturating_sub(1) / 2
    }

    /// Current graph as an immutable value.
    pub fn graph(&self) -> EntropyResult<Graph> {
        let mut pairs: Vec<(usize, usize)> = self
            .neighbours
            .iter()
            .enumerate()
            .flat_map(|(u, adj)| adj.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
            .collect();
        pairs.sort_unstable();
        Graph::unweighted(self.nvertices(), &pairs)
    }

    fn laplacian(&self) -> CsMat<f64> {
        let n = self.nvertices();
        let mut triplets = TriMat::with_capacity((n, n), 2 * self.ecount + n);
        for (u, adj) in self.neighbours.iter().enumerate() {
            if self.degrees[u] > 0 {
                triplets.add_triplet(u, u, self.degrees[u] as f64);
            }
            for &v in adj {
                triplets.add_triplet(u, v, -1.0);
            }
        }
        triplets.to_csr()
    }

    fn record(&mut self) -> EntropyResult<()> {
        let graph = self.graph()?;
        let vnge = von_neumann_entropy_with(&graph, LaplacianMode::Combinatorial, self.solver.as_ref())?;
        let record = EntropyRecord {
            iteration: self.iteration,
            ecount: self.ecount,
            structural_information: self.structural_information,
            von_neumann_entropy: vnge,
        };
        info!("{}", record);
        self.records.push(record);
        Ok(())
    }

    fn stop(&mut self, reason: StopReason) {
        info!(
            "MaxEntropyOptimizer stopped after {} iterations: {:?} (ecount {})",
            self.iteration, reason, self.ecount
        );
        self.state = OptimizerState::Stopped(reason);
    }

    /// Greedy candidate and its `Σ d·log2 d` increase.
    fn greedy_candidate(&self) -> Option<((usize, usize), f64)> {
        let n = self.nvertices();
        if n < 2 {
            return None;
        }
        let (mut head, mut tail) = (0usize, n - 1);
        let mut threshold = f64::INFINITY;
        let mut best = None;

        while head < tail {
            let u = self.order[head];
            let d_head = self.degrees[u];
            for i in head + 1..=tail {
                let v = self.order[i];
                let d_i = self.degrees[v];
                let delta = f(d_head + 1) - f(d_head) + f(d_i + 1) - f(d_i);
                if delta >= threshold {
                    tail = i - 1;
                    break;
                }
                if !self.connected(u, v) {
                    best = Some((u, v));
                    threshold = delta;
                    tail = i - 1;
                    break;
                }
            }
            head += 1;
        }
        best.map(|edge| (edge, threshold))
    }

    fn random_candidate(&mut self) -> Option<(usize, usize)> {
        let n = self.nvertices();
        if n < 2 || self.is_complete() {
            return None;
        }
        for _ in 0..64 * n {
            let u = self.rng.gen_range(0..n);
            let v = self.rng.gen_range(0..n);
            if u != v && !self.connected(u, v) {
                return Some((u, v));
            }
        }
        // Nearly complete: draw from the explicit non-edge list.
        let missing: Vec<(usize, usize)> = (0..n)
            .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
            .filter(|&(u, v)| !self.connected(u, v))
            .collect();
        if missing.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..missing.len());
        Some(missing[pick])
    }

    fn fiedler_candidate(&self) -> EntropyResult<Option<(usize, usize)>> {
        let n = self.nvertices();
        if n < 2 || self.is_complete() {
            return Ok(None);
        }
        let fiedler = self.solver.fiedler_vector(&self.laplacian())?;
        let mut sorted: Vec<usize> = (0..n).collect();
        sorted.sort_by(|&a, &b| fiedler[a].total_cmp(&fiedler[b]));

        // Outermost non-edge from the left end of the ordering.
        let mut first = None;
        'scan: for i in 0..n - 1 {
            for j in (i + 1..n).rev() {
                if !self.connected(sorted[i], sorted[j]) {
                    first = Some((i, j));
                    break 'scan;
                }
            }
        }
        let Some((head, tail)) = first else {
            return Ok(None);
        };

        let gap = |i: usize, j: usize| (fiedler[sorted[i]] - fiedler[sorted[j]]).powi(2);
        let mut best = (sorted[head], sorted[tail]);
        let mut threshold = gap(head, tail);
        for j in tail + 1..n {
            for i in head + 1..j {
                let delta = gap(i, j);
                if delta <= threshold {
                    break;
                }
                if !self.connected(sorted[i], sorted[j]) {
                    best = (sorted[i], sorted[j]);
                    threshold = delta;
                    break;
                }
            }
        }
        trace!("Fiedler gap {:.4e} for edge {:?}", threshold, best);
        Ok(Some(best))
    }

    fn accept(&mut self, u: usize, v: usize) {
        self.sum_dlogd += f(self.degrees[u] + 1) - f(self.degrees[u]) + f(self.degrees[v] + 1)
            - f(self.degrees[v]);
        self.neighbours[u].insert(v);
        self.neighbours[v].insert(u);
        self.degrees[u] += 1;
        self.degrees[v] += 1;
        self.ecount += 1;
        self.structural_information = si_from_sum(self.ecount, self.sum_dlogd);
        let degrees = &self.degrees;
        self.order.sort_by_key(|&x| degrees[x]);
        self.added.push((u.min(v), u.max(v)));
    }

    /// Add one edge. Returns `None` once the optimizer has stopped.
    pub fn step(&mut self) -> EntropyResult<Option<(usize, usize)>> {
        match self.state {
            OptimizerState::Stopped(_) => return Ok(None),
            OptimizerState::Initialized => {
                self.state = OptimizerState::Searching;
                self.record()?;
            }
            OptimizerState::Searching => {}
        }

        if self.iteration >= self.budget {
            self.stop(StopReason::BudgetExhausted);
            return Ok(None);
        }

        let candidate = match self.policy {
            SearchPolicy::Greedy => {
                let maximum = (self.nvertices() as f64).log2();
                if (self.structural_information - maximum).abs() <= MAX_ENTROPY_TOL {
                    self.stop(StopReason::MaximumEntropy);
                    return Ok(None);
                }
                self.greedy_candidate().map(|(edge, delta)| {
                    debug!("greedy: Δ(Σ d log d) = {:.6}", delta);
                    edge
                })
            }
            SearchPolicy::Random => self.random_candidate(),
            SearchPolicy::AlgebraicConnectivity => self.fiedler_candidate()?,
        };

        let Some((u, v)) = candidate else {
            self.stop(StopReason::Infeasible);
            return Ok(None);
        };

        self.accept(u, v);
        self.iteration += 1;
        trace!(
            "iteration {}: added ({}, {}), SI={:.7}",
            self.iteration,
            u,
            v,
            self.structural_information
        );
        if self.iteration % self.interval == 0 {
            self.record()?;
        }
        Ok(Some((u, v)))
    }

    /// Step until the optimizer stops.
    pub fn run(&mut self) -> EntropyResult<OptimizationReport> {
        while self.step()?.is_some() {}
        let stop_reason = match self.state {
            OptimizerState::Stopped(reason) => reason,
            _ => StopReason::BudgetExhausted,
        };
        Ok(OptimizationReport {
            policy: self.policy,
            stop_reason,
            added_edges: self.added.clone(),
            records: self.records.clone(),
            ecount: self.ecount,
            structural_information: self.structural_information,
        })
    }
}

//! Undirected, optionally weighted simple graphs.
//!
//! A [`Graph`] is an immutable value: `nvertices` vertices indexed `0..n` and a
//! list of undirected edges without self-loops or parallel edges. Estimators
//! derive sparse matrices from it on demand and never mutate it.
//!
//! Two construction paths exist:
//! - [`Graph::new`] validates a simple edge list and rejects anything else.
//! - [`Graph::from_edges_merged`] simplifies raw input first: self-loops are
//!   dropped and parallel edges are combined by summing their weights.

use std::collections::HashSet;
use std::fmt;

use dashmap::DashMap;
use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::errors::{EntropyError, EntropyResult};

/// An undirected edge stored with `u < v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(u: usize, v: usize, weight: f64) -> Self {
        let (u, v) = if u <= v { (u, v) } else { (v, u) };
        Self { u, v, weight }
    }

    #[inline]
    pub fn key(&self) -> (usize, usize) {
        (self.u, self.v)
    }
}

/// Simple undirected graph on vertices `0..nvertices`.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nvertices: usize,
    edges: Vec<Edge>,
}

impl Graph {
    /// Build a graph from a simple weighted edge list.
    ///
    /// Fails with `InvalidArgument` on `n == 0`, out-of-range endpoints,
    /// self-loops or a repeated unordered pair.
    pub fn new(nvertices: usize, edges: Vec<(usize, usize, f64)>) -> EntropyResult<Self> {
        if nvertices == 0 {
            return Err(EntropyError::invalid("graph must have at least one vertex"));
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(edges.len());
        let mut out = Vec::with_capacity(edges.len());
        for (u, v, w) in edges {
            if u >= nvertices || v >= nvertices {
                return Err(EntropyError::invalid(format!(
                    "edge ({}, {}) out of range for {} vertices",
                    u, v, nvertices
                )));
            }
            if u == v {
                return Err(EntropyError::invalid(format!(
                    "self-loop on vertex {}; simplify the graph first",
                    u
                )));
            }
            if !w.is_finite() {
                return Err(EntropyError::invalid(format!(
                    "edge ({}, {}) has non-finite weight {}",
                    u, v, w
                )));
            }
            let edge = Edge::new(u, v, w);
            if !seen.insert(edge.key()) {
                return Err(EntropyError::invalid(format!(
                    "duplicate edge ({}, {}); merge parallel edges first",
                    edge.u, edge.v
                )));
            }
            out.push(edge);
        }

        trace!("Graph::new: {} vertices, {} edges", nvertices, out.len());
        Ok(Self {
            nvertices,
            edges: out,
        })
    }

    /// Unit-weight graph from vertex pairs.
    pub fn unweighted(nvertices: usize, pairs: &[(usize, usize)]) -> EntropyResult<Self> {
        Self::new(nvertices, pairs.iter().map(|&(u, v)| (u, v, 1.0)).collect())
    }

    /// Build a graph from raw edges, dropping self-loops and summing the
    /// weights of parallel edges.
    pub fn from_edges_merged(
        nvertices: usize,
        edges: &[(usize, usize, f64)],
    ) -> EntropyResult<Self> {
        if nvertices == 0 {
            return Err(EntropyError::invalid("graph must have at least one vertex"));
        }
        if let Some(&(u, v, _)) = edges
            .iter()
            .find(|&&(u, v, _)| u >= nvertices || v >= nvertices)
        {
            return Err(EntropyError::invalid(format!(
                "edge ({}, {}) out of range for {} vertices",
                u, v, nvertices
            )));
        }

        let merged: DashMap<(usize, usize), f64> = DashMap::with_capacity(edges.len());
        let loops = edges
            .par_iter()
            .map(|&(u, v, w)| {
                if u == v {
                    return 1usize;
                }
                *merged.entry(Edge::new(u, v, w).key()).or_insert(0.0) += w;
                0
            })
            .sum::<usize>();

        if loops > 0 {
            warn!("Dropped {} self-loops while simplifying", loops);
        }

        let mut simple: Vec<(usize, usize, f64)> = merged
            .into_iter()
            .map(|((u, v), w)| (u, v, w))
            .collect();
        simple.par_sort_unstable_by_key(|&(u, v, _)| (u, v));

        debug!(
            "Simplified {} raw edges into {} simple edges",
            edges.len(),
            simple.len()
        );
        Self::new(nvertices, simple)
    }

    /// Graph with `n` vertices and no edges.
    pub fn empty(nvertices: usize) -> EntropyResult<Self> {
        Self::new(nvertices, Vec::new())
    }

    #[inline]
    pub fn nvertices(&self) -> usize {
        self.nvertices
    }

    #[inline]
    pub fn ecount(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_unweighted(&self) -> bool {
        self.edges.iter().all(|e| e.weight == 1.0)
    }

    /// Weighted degree (strength) of every vertex.
    pub fn degrees(&self) -> Vec<f64> {
        let mut deg = vec![0.0; self.nvertices];
        for e in &self.edges {
            deg[e.u] += e.weight;
            deg[e.v] += e.weight;
        }
        deg
    }

    /// Number of incident edges of every vertex, ignoring weights.
    pub fn degree_counts(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.nvertices];
        for e in &self.edges {
            deg[e.u] += 1;
            deg[e.v] += 1;
        }
        deg
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Sum of degrees, `2 × total edge weight`.
    pub fn volume(&self) -> f64 {
        2.0 * self.total_weight()
    }

    pub fn sum_squared_weights(&self) -> f64 {
        self.edges.iter().map(|e| e.weight * e.weight).sum()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        let key = Edge::new(u, v, 0.0).key();
        self.edges.iter().any(|e| e.key() == key)
    }

    /// Relabel vertices: vertex `i` becomes `perm[i]`.
    pub fn permuted(&self, perm: &[usize]) -> EntropyResult<Self> {
        if perm.len() != self.nvertices {
            return Err(EntropyError::invalid(format!(
                "permutation of length {} for {} vertices",
                perm.len(),
                self.nvertices
            )));
        }
        let mut check = vec![false; self.nvertices];
        for &p in perm {
            if p >= self.nvertices || check[p] {
                return Err(EntropyError::invalid("not a permutation"));
            }
            check[p] = true;
        }
        Self::new(
            self.nvertices,
            self.edges
                .iter()
                .map(|e| (perm[e.u], perm[e.v], e.weight))
                .collect(),
        )
    }

    /// Edge pairs as a `(u, v)` set, for membership tests.
    pub fn edge_set(&self) -> HashSet<(usize, usize)> {
        self.edges.iter().map(|e| e.key()).collect()
    }

    pub fn statistics(&self) -> GraphStats {
        let degrees = self.degrees();
        let (min_degree, max_degree) = degrees
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        GraphStats {
            nvertices: self.nvertices,
            ecount: self.edges.len(),
            volume: self.volume(),
            min_degree,
            max_degree,
            isolated: degrees.iter().filter(|&&d| d == 0.0).count(),
        }
    }
}

/// Summary statistics of a [`Graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub nvertices: usize,
    pub ecount: usize,
    pub volume: f64,
    pub min_degree: f64,
    pub max_degree: f64,
    pub isolated: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Vertices: {}", self.nvertices)?;
        writeln!(f, "  Edges: {}", self.ecount)?;
        writeln!(f, "  Volume: {:.4}", self.volume)?;
        writeln!(
            f,
            "  Degree range: [{:.4}, {:.4}]",
            self.min_degree, self.max_degree
        )?;
        writeln!(f, "  Isolated vertices: {}", self.isolated)?;
        Ok(())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Graph({} vertices, {} edges)", self.nvertices, self.edges.len())
    }
}

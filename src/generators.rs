//! Deterministic and random graph families with unit weights.
//!
//! Random generators take the caller's RNG, so a seeded `ChaCha8Rng` gives
//! reproducible graphs.

use std::collections::HashSet;

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::errors::{EntropyError, EntropyResult};
use crate::graph::Graph;

fn check_order(n: usize) -> EntropyResult<()> {
    if n == 0 {
        return Err(EntropyError::invalid("graph must have at least one vertex"));
    }
    Ok(())
}

/// `K_n`.
pub fn complete(n: usize) -> EntropyResult<Graph> {
    check_order(n)?;
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
        .collect();
    Graph::unweighted(n, &pairs)
}

/// `K_{1,n−1}` with vertex 0 as the hub.
pub fn star(n: usize) -> EntropyResult<Graph> {
    check_order(n)?;
    let pairs: Vec<(usize, usize)> = (1..n).map(|v| (0, v)).collect();
    Graph::unweighted(n, &pairs)
}

pub fn path(n: usize) -> EntropyResult<Graph> {
    check_order(n)?;
    let pairs: Vec<(usize, usize)> = (1..n).map(|v| (v - 1, v)).collect();
    Graph::unweighted(n, &pairs)
}

/// Cycle `C_n`; `n < 3` gives a path.
pub fn cycle(n: usize) -> EntropyResult<Graph> {
    check_order(n)?;
    let mut pairs: Vec<(usize, usize)> = (1..n).map(|v| (v - 1, v)).collect();
    if n >= 3 {
        pairs.push((0, n - 1));
    }
    Graph::unweighted(n, &pairs)
}

pub fn empty(n: usize) -> EntropyResult<Graph> {
    Graph::empty(n)
}

/// `G(n, p)`: every pair is an edge independently with probability `p`.
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> EntropyResult<Graph> {
    check_order(n)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(EntropyError::invalid(format!(
            "edge probability must be in [0, 1], got {}",
            p
        )));
    }
    let mut pairs = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            if rng.gen_bool(p) {
                pairs.push((u, v));
            }
        }
    }
    debug!("Erdős–Rényi G({}, {}): {} edges", n, p, pairs.len());
    Graph::unweighted(n, &pairs)
}

/// Preferential attachment: vertex `t` links to `min(m, t)` distinct earlier
/// vertices, each drawn with probability proportional to `degree + 1`.
pub fn barabasi_albert<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> EntropyResult<Graph> {
    check_order(n)?;
    if m == 0 {
        return Err(EntropyError::invalid("Barabási–Albert needs m >= 1"));
    }
    let mut degrees = vec![0usize; n];
    let mut pairs = Vec::with_capacity(n * m);

    for t in 1..n {
        let weights: Vec<usize> = degrees[..t].iter().map(|&d| d + 1).collect();
        let sampler = WeightedIndex::new(&weights)
            .map_err(|e| EntropyError::Numerical(format!("attachment weights: {}", e)))?;
        let wanted = m.min(t);
        let mut targets: HashSet<usize> = HashSet::with_capacity(wanted);
        while targets.len() < wanted {
            targets.insert(sampler.sample(rng));
        }
        let mut targets: Vec<usize> = targets.into_iter().collect();
        targets.sort_unstable();
        for target in targets {
            pairs.push((target, t));
            degrees[target] += 1;
            degrees[t] += 1;
        }
    }
    debug!("Barabási–Albert({}, {}): {} edges", n, m, pairs.len());
    Graph::unweighted(n, &pairs)
}

/// Ring lattice where each vertex links to its `k` nearest neighbours on each
/// side, then every edge is rewired with probability `p` to a uniform new
/// endpoint, avoiding self-loops and parallel edges.
pub fn watts_strogatz<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    rng: &mut R,
) -> EntropyResult<Graph> {
    check_order(n)?;
    if 2 * k >= n {
        return Err(EntropyError::invalid(format!(
            "Watts–Strogatz needs 2k < n, got k={} n={}",
            k, n
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(EntropyError::invalid(format!(
            "rewiring probability must be in [0, 1], got {}",
            p
        )));
    }

    let key = |u: usize, v: usize| if u < v { (u, v) } else { (v, u) };
    let mut lattice: Vec<(usize, usize)> = Vec::with_capacity(n * k);
    for u in 0..n {
        for offset in 1..=k {
            lattice.push(key(u, (u + offset) % n));
        }
    }
    let mut present: HashSet<(usize, usize)> = lattice.iter().copied().collect();

    for edge in lattice.iter_mut() {
        if !rng.gen_bool(p) {
            continue;
        }
        let (u, _) = *edge;
        // A vertex adjacent to everything else keeps its edge.
        for _ in 0..n {
            let w = rng.gen_range(0..n);
            let candidate = key(u, w);
            if w != u && !present.contains(&candidate) {
                present.remove(&*edge);
                present.insert(candidate);
                *edge = candidate;
                break;
            }
        }
    }
    debug!("Watts–Strogatz({}, {}, {}): {} edges", n, k, p, lattice.len());
    Graph::unweighted(n, &lattice)
}

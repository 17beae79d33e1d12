//! Distances between graphs on a shared vertex set, and anomaly ranking over a
//! sequence of graphs.
//!
//! Both entropy distances are square roots of Jensen–Shannon divergences:
//! - structural information: between the two degree distributions
//! - von Neumann: between the two density matrices `L / tr(L)` (quantum JS)
//!
//! A graph without edges contributes a zero distribution, so its entropy term
//! is 0 rather than undefined.

use log::{debug, info};
use rand::Rng;

use crate::belief::delta_con;
use crate::eigen::SymmetricEigensolver;
use crate::errors::{EntropyError, EntropyResult};
use crate::exact::{laplacian_entropy, structural_entropy};
use crate::graph::Graph;
use crate::kernel::xlog2x;
use crate::laplacian::{build_adjacency, build_laplacian, density_matrix};

fn check_aligned(g1: &Graph, g2: &Graph) -> EntropyResult<()> {
    if g1.nvertices() != g2.nvertices() {
        return Err(EntropyError::invalid(format!(
            "graphs must share a vertex set, got {} and {} vertices",
            g1.nvertices(),
            g2.nvertices()
        )));
    }
    Ok(())
}

/// `sqrt(H(mix) − (H1 + H2)/2)`, clamped at 0 against rounding.
fn js_distance(mixed: f64, h1: f64, h2: f64) -> f64 {
    (mixed - (h1 + h2) / 2.0).max(0.0).sqrt()
}

/// Jensen–Shannon distance between the degree distributions of two graphs.
pub fn structural_information_distance(g1: &Graph, g2: &Graph) -> EntropyResult<f64> {
    check_aligned(g1, g2)?;
    let (d1, d2) = (g1.degrees(), g2.degrees());
    let (vol1, vol2) = (g1.volume(), g2.volume());

    let half_mass = |d: f64, vol: f64| if vol > 0.0 { d / (2.0 * vol) } else { 0.0 };
    let mixed = -d1
        .iter()
        .zip(&d2)
        .map(|(&a, &b)| xlog2x(half_mass(a, vol1) + half_mass(b, vol2)))
        .sum::<f64>();

    let distance = js_distance(mixed, structural_entropy(g1), structural_entropy(g2));
    debug!("Structural information distance: {:.7}", distance);
    Ok(distance)
}

/// Quantum Jensen–Shannon distance between the density matrices of two graphs.
pub fn von_neumann_distance(
    g1: &Graph,
    g2: &Graph,
    solver: &dyn SymmetricEigensolver,
) -> EntropyResult<f64> {
    check_aligned(g1, g2)?;
    let rho1 = density_matrix(&build_laplacian(&build_adjacency(g1), false));
    let rho2 = density_matrix(&build_laplacian(&build_adjacency(g2), false));

    let h1 = match &rho1 {
        Some(rho) => laplacian_entropy(rho, solver)?,
        None => 0.0,
    };
    let h2 = match &rho2 {
        Some(rho) => laplacian_entropy(rho, solver)?,
        None => 0.0,
    };
    let mixed = match (&rho1, &rho2) {
        (Some(a), Some(b)) => laplacian_entropy(&(a + b), solver)?,
        // spectrum of ρ/2: H(ρ/2) = H(ρ)/2 + 1/2
        (Some(_), None) => h1 / 2.0 + 0.5,
        (None, Some(_)) => h2 / 2.0 + 0.5,
        (None, None) => 0.0,
    };

    let distance = js_distance(mixed, h1, h2);
    debug!("von Neumann distance: {:.7}", distance);
    Ok(distance)
}

/// Vertex/edge overlap distance `1 − 2(N + M12) / (2N + M1 + M2)`.
pub fn veo_score(g1: &Graph, g2: &Graph) -> EntropyResult<f64> {
    check_aligned(g1, g2)?;
    let n = g1.nvertices() as f64;
    let other = g2.edge_set();
    let common = g1
        .edges()
        .iter()
        .filter(|e| other.contains(&e.key()))
        .count() as f64;
    let (m1, m2) = (g1.ecount() as f64, g2.ecount() as f64);
    Ok(1.0 - 2.0 * (n + common) / (2.0 * n + m1 + m2))
}

/// `1 − DeltaCon` similarity.
pub fn delta_con_distance<R: Rng + ?Sized>(
    g1: &Graph,
    g2: &Graph,
    groups: usize,
    rng: &mut R,
) -> EntropyResult<f64> {
    check_aligned(g1, g2)?;
    let similarity = delta_con(&build_adjacency(g1), &build_adjacency(g2), groups, rng)?;
    Ok(1.0 - similarity)
}

/// Distances between every consecutive pair of `graphs`.
pub fn pairwise_distances<F>(graphs: &[Graph], mut metric: F) -> EntropyResult<Vec<f64>>
where
    F: FnMut(&Graph, &Graph) -> EntropyResult<f64>,
{
    graphs
        .windows(2)
        .map(|pair| metric(&pair[0], &pair[1]))
        .collect()
}

/// Per-graph anomaly score from the `k − 1` distances of consecutive pairs.
///
/// Inner graphs average their two adjacent distances; the first and last take
/// their single neighbour's distance.
pub fn anomaly_scores(distances: &[f64]) -> Vec<f64> {
    let Some((&first, &last)) = distances.first().zip(distances.last()) else {
        return Vec::new();
    };
    let mut scores = Vec::with_capacity(distances.len() + 1);
    scores.push(first);
    scores.extend(distances.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    scores.push(last);
    scores
}

/// Graph indices ordered from most to least anomalous; ties keep index order.
pub fn anomaly_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Position of graph `index` in [`anomaly_order`], 0 being the most anomalous.
pub fn anomaly_rank(scores: &[f64], index: usize) -> Option<usize> {
    let rank = anomaly_order(scores).iter().position(|&i| i == index);
    if let Some(r) = rank {
        info!("Graph {} ranks {} of {} by anomaly score", index, r, scores.len());
    }
    rank
}

//! Incremental structural information over a graph stream.
//!
//! The state keeps the cumulative volume, the per-vertex strengths and the
//! current structural information `SI`. Folding in an increment `G` of volume
//! `g` touches only the increment's vertices:
//!
//! ```text
//! c      = (vol + g/2) / (vol·(vol + g))
//! a      = Σ_{v∈G} f(d_v + g_v) − f(d_v)
//! b      = Σ_{v∈G} f(d_v/(2·vol) + (d_v + g_v)/(2·(vol + g)))
//! y      = Σ_{v∈G} d_v,   z = Σ_{v∈G} f(d_v)
//! SI'    = (f(vol + g) − a − f(vol) + vol·SI) / (vol + g)
//! SI_avg = −b − (vol − y)·f(c) − c·(f(vol) − vol·SI − z)
//! score  = sqrt(SI_avg − (SI' + SI)/2)
//! ```
//!
//! with `f = xlog2x`. `SI_avg` is the entropy of the averaged degree
//! distribution, so the score is the square root of a Jensen–Shannon divergence.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::errors::EntropyResult;
use crate::kernel::xlog2x;
use crate::stream::{IncrementalSimilarity, Snapshot};

#[inline]
fn f(x: f64) -> f64 {
    xlog2x(x)
}

/// Structural information of a strength map with total `volume`.
fn structural_information(degrees: &HashMap<String, f64>, volume: f64) -> f64 {
    if volume <= 0.0 {
        return 0.0;
    }
    -degrees.values().map(|&d| f(d)).sum::<f64>() / volume + volume.log2()
}

/// Running state of the incremental structural-information updater.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingEntropyState {
    pub volume: f64,
    pub degrees: HashMap<String, f64>,
    pub structural_information: f64,
}

impl StreamingEntropyState {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_degrees(snapshot.strengths().into_iter().collect())
    }

    pub fn from_degrees(degrees: HashMap<String, f64>) -> Self {
        let volume: f64 = degrees.values().sum();
        let structural_information = structural_information(&degrees, volume);
        trace!(
            "Streaming state: {} vertices, vol={:.3}, SI={:.7}",
            degrees.len(),
            volume,
            structural_information
        );
        Self {
            volume,
            degrees,
            structural_information,
        }
    }

    /// Structural information recomputed from the stored strengths.
    pub fn recompute(&self) -> f64 {
        structural_information(&self.degrees, self.volume)
    }

    /// State after folding in `snapshot`, and the divergence score of the step.
    pub fn update(&self, snapshot: &Snapshot) -> (Self, f64) {
        let increment = snapshot.strengths();

        let mut degrees = self.degrees.clone();
        for (name, g_deg) in &increment {
            *degrees.entry(name.clone()).or_insert(0.0) += g_deg;
        }

        if self.volume <= 0.0 {
            warn!("Incremental update from an empty state: rebuilding, score 0");
            return (Self::from_degrees(degrees), 0.0);
        }

        let vol = self.volume;
        let g_vol = snapshot.volume();
        let total = vol + g_vol;
        if total <= 0.0 {
            warn!("Increment cancels the whole volume: rebuilding, score 0");
            return (Self::from_degrees(degrees), 0.0);
        }
        let si = self.structural_information;

        let c = (vol + g_vol / 2.0) / (vol * total);
        let (mut a, mut b, mut y, mut z) = (0.0, 0.0, 0.0, 0.0);
        for (name, g_deg) in &increment {
            let deg = self.degrees.get(name).copied().unwrap_or(0.0);
            a += f(deg + g_deg) - f(deg);
            b += f(deg / (2.0 * vol) + (deg + g_deg) / (2.0 * total));
            y += deg;
            z += f(deg);
        }

        let new_si = (f(total) - a - f(vol) + vol * si) / total;
        let average_si = -b - (vol - y) * f(c) - c * (f(vol) - vol * si - z);
        let divergence = average_si - (new_si + si) / 2.0;
        if divergence < -1e-9 {
            debug!("Negative divergence {:.3e} clamped to 0", divergence);
        }
        let score = divergence.max(0.0).sqrt();

        let next = Self {
            volume: total,
            degrees,
            structural_information: new_si,
        };
        trace!(
            "Incremental SI: {:.7} -> {:.7}, score {:.7}",
            si,
            new_si,
            score
        );
        (next, score)
    }

    /// In-place variant of [`Self::update`].
    pub fn apply(&mut self, snapshot: &Snapshot) -> f64 {
        let (next, score) = self.update(snapshot);
        *self = next;
        score
    }
}

impl IncrementalSimilarity for StreamingEntropyState {
    fn name(&self) -> &'static str {
        "structural information"
    }

    fn observe(&mut self, snapshot: &Snapshot) -> EntropyResult<f64> {
        Ok(self.apply(snapshot))
    }
}

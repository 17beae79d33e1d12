//! Streams of named graph snapshots and incremental similarity trackers.
//!
//! A stream starts from an initial [`Snapshot`]; every later snapshot is an
//! increment whose edge weights are added to the cumulative graph (negative
//! weights remove weight). Trackers score how much each increment changes the
//! cumulative graph:
//!
//! - [`crate::incremental::StreamingEntropyState`]: structural-information
//!   divergence, updated from the increment's vertices only
//! - [`VeoTracker`]: vertex/edge overlap
//! - [`DeltaConTracker`]: `1 − DeltaCon` between consecutive cumulative graphs

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprs::{CsMat, TriMat};

use crate::belief::{delta_con, DELTACON_GROUPS};
use crate::errors::{EntropyError, EntropyResult};

/// Undirected pair key with the lexicographically smaller name first.
fn pair_key(u: &str, v: &str) -> (String, String) {
    if u <= v {
        (u.to_string(), v.to_string())
    } else {
        (v.to_string(), u.to_string())
    }
}

/// A simple undirected graph over named vertices.
///
/// Built from raw edges: self-loops are dropped and parallel edges are merged
/// by summing their weights. Vertices and edges keep first-appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    vertices: Vec<String>,
    edges: Vec<(String, String, f64)>,
}

impl Snapshot {
    pub fn new<S, I>(raw: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, S, f64)>,
    {
        let mut vertices = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut slots: HashMap<(String, String), usize> = HashMap::new();
        let mut edges: Vec<(String, String, f64)> = Vec::new();
        let mut loops = 0usize;

        for (u, v, w) in raw {
            let (u, v) = (u.as_ref(), v.as_ref());
            for name in [u, v] {
                if seen.insert(name.to_string()) {
                    vertices.push(name.to_string());
                }
            }
            if u == v {
                loops += 1;
                continue;
            }
            let key = pair_key(u, v);
            match slots.get(&key) {
                Some(&slot) => edges[slot].2 += w,
                None => {
                    slots.insert(key.clone(), edges.len());
                    edges.push((key.0, key.1, w));
                }
            }
        }
        if loops > 0 {
            warn!("Snapshot: dropped {} self-loops", loops);
        }
        Self { vertices, edges }
    }

    pub fn vertices(&self) -> &[String] {
        &self.vertices
    }

    pub fn edges(&self) -> &[(String, String, f64)] {
        &self.edges
    }

    pub fn vcount(&self) -> usize {
        self.vertices.len()
    }

    pub fn ecount(&self) -> usize {
        self.edges.len()
    }

    /// Weighted degree of every vertex, in vertex order.
    pub fn strengths(&self) -> Vec<(String, f64)> {
        let mut strength: HashMap<&str, f64> = HashMap::with_capacity(self.vertices.len());
        for (u, v, w) in &self.edges {
            *strength.entry(u.as_str()).or_insert(0.0) += w;
            *strength.entry(v.as_str()).or_insert(0.0) += w;
        }
        self.vertices
            .iter()
            .map(|name| (name.clone(), strength.get(name.as_str()).copied().unwrap_or(0.0)))
            .collect()
    }

    /// `2 × total edge weight`.
    pub fn volume(&self) -> f64 {
        2.0 * self.edges.iter().map(|(_, _, w)| w).sum::<f64>()
    }
}

/// A raw edge with an integer timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEdge {
    pub u: String,
    pub v: String,
    pub weight: f64,
    pub timestamp: i64,
}

/// Split a timestamped edge list into `count` snapshots of equal time span.
///
/// Edges at the final timestamp land in the last snapshot.
pub fn partition_by_time(events: &[TimedEdge], count: usize) -> EntropyResult<Vec<Snapshot>> {
    if count == 0 {
        return Err(EntropyError::invalid("need at least one snapshot"));
    }
    let Some(start) = events.iter().map(|e| e.timestamp).min() else {
        return Ok(vec![Snapshot::default(); count]);
    };
    let end = events.iter().map(|e| e.timestamp).max().unwrap_or(start);
    let span = (end - start) as f64 / count as f64;

    let mut sorted: Vec<&TimedEdge> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    let mut buckets: Vec<Vec<(&str, &str, f64)>> = vec![Vec::new(); count];
    for e in sorted {
        let slot = if span > 0.0 {
            (((e.timestamp - start) as f64 / span).floor() as usize).min(count - 1)
        } else {
            0
        };
        buckets[slot].push((e.u.as_str(), e.v.as_str(), e.weight));
    }
    debug!(
        "Partitioned {} timed edges into {} snapshots over [{}, {}]",
        events.len(),
        count,
        start,
        end
    );
    Ok(buckets.into_iter().map(Snapshot::new).collect())
}

/// Stable assignment of vertex names to matrix indices.
#[derive(Debug, Clone, Default)]
pub struct VertexIndex {
    indices: HashMap<String, usize>,
    names: Vec<String>,
}

impl VertexIndex {
    /// Index of `name`, assigning the next free one if unseen.
    pub fn register(&mut self, name: &str) -> usize {
        if let Some(&i) = self.indices.get(name) {
            return i;
        }
        let i = self.names.len();
        self.indices.insert(name.to_string(), i);
        self.names.push(name.to_string());
        i
    }

    pub fn register_snapshot(&mut self, snapshot: &Snapshot) -> usize {
        let before = self.len();
        for name in snapshot.vertices() {
            self.register(name);
        }
        self.len() - before
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Scores consecutive increments of a graph stream.
pub trait IncrementalSimilarity {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Fold `snapshot` into the cumulative graph and score the change.
    fn observe(&mut self, snapshot: &Snapshot) -> EntropyResult<f64>;
}

/// Score every increment of `snapshots` after the first.
///
/// `init` builds the tracker from the first snapshot. Returns one score per
/// consecutive pair; an empty or single-snapshot stream yields no scores.
pub fn run_stream<T, F>(snapshots: &[Snapshot], init: F) -> EntropyResult<Vec<f64>>
where
    T: IncrementalSimilarity,
    F: FnOnce(&Snapshot) -> EntropyResult<T>,
{
    let Some((first, rest)) = snapshots.split_first() else {
        return Ok(Vec::new());
    };
    let mut tracker = init(first)?;
    info!(
        "Stream similarity '{}' over {} snapshots",
        tracker.name(),
        snapshots.len()
    );

    let mut scores = Vec::with_capacity(rest.len());
    for (i, snapshot) in rest.iter().enumerate() {
        let score = tracker.observe(snapshot)?;
        info!("[{}] step {}: {:8.7}", tracker.name(), i + 1, score);
        scores.push(score);
    }
    Ok(scores)
}

/// Vertex/edge overlap between consecutive cumulative graphs.
///
/// An edge is alive while its cumulative weight is positive. Each increment
/// scores `changes / (changes + 2·(V + E))`, where `changes` counts new vertices,
/// edges coming alive and edges dying, and `V`, `E` are the counts before it.
///
/// A dying edge adds one change, exactly like a newborn edge; it is never
/// subtracted from the change count. Removing an edge therefore raises the
/// score instead of cancelling an addition in the same increment.
#[derive(Debug, Clone)]
pub struct VeoTracker {
    vertices: HashSet<String>,
    weights: HashMap<(String, String), f64>,
    vcount: usize,
    ecount: usize,
}

impl VeoTracker {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let weights: HashMap<(String, String), f64> = snapshot
            .edges()
            .iter()
            .map(|(u, v, w)| ((u.clone(), v.clone()), *w))
            .collect();
        Self {
            vertices: snapshot.vertices().iter().cloned().collect(),
            vcount: snapshot.vcount(),
            ecount: snapshot.ecount(),
            weights,
        }
    }

    pub fn vcount(&self) -> usize {
        self.vcount
    }

    pub fn ecount(&self) -> usize {
        self.ecount
    }
}

impl IncrementalSimilarity for VeoTracker {
    fn name(&self) -> &'static str {
        "veo"
    }

    fn observe(&mut self, snapshot: &Snapshot) -> EntropyResult<f64> {
        let mut new_vertices = 0usize;
        for name in snapshot.vertices() {
            if self.vertices.insert(name.clone()) {
                new_vertices += 1;
            }
        }

        let (mut born, mut died) = (0usize, 0usize);
        for (u, v, w) in snapshot.edges() {
            let key = (u.clone(), v.clone());
            match self.weights.get_mut(&key) {
                None => {
                    if *w > 0.0 {
                        born += 1;
                    }
                    self.weights.insert(key, *w);
                }
                Some(current) => {
                    let updated = *current + w;
                    if *current <= 0.0 && updated > 0.0 {
                        born += 1;
                    } else if *current > 0.0 && updated <= 0.0 {
                        died += 1;
                    }
                    *current = updated;
                }
            }
        }

        let changes = (new_vertices + born + died) as f64;
        let denominator = changes + 2.0 * (self.vcount + self.ecount) as f64;
        let score = if denominator > 0.0 {
            changes / denominator
        } else {
            0.0
        };

        debug!(
            "VEO: +{} vertices, +{} / -{} edges over V={} E={}",
            new_vertices, born, died, self.vcount, self.ecount
        );
        self.vcount += new_vertices;
        self.ecount = (self.ecount + born).saturating_sub(died);
        Ok(score)
    }
}

/// `1 − DeltaCon` between the cumulative graph before and after each increment.
#[derive(Debug, Clone)]
pub struct DeltaConTracker {
    index: VertexIndex,
    weights: HashMap<(usize, usize), f64>,
    groups: usize,
    rng: ChaCha8Rng,
}

impl DeltaConTracker {
    pub fn from_snapshot(snapshot: &Snapshot, groups: usize, seed: u64) -> EntropyResult<Self> {
        if groups == 0 {
            return Err(EntropyError::invalid("DeltaCon needs at least one group"));
        }
        let mut tracker = Self {
            index: VertexIndex::default(),
            weights: HashMap::new(),
            groups,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        tracker.index.register_snapshot(snapshot);
        let increment = tracker.indexed(snapshot);
        tracker.accumulate(&increment);
        Ok(tracker)
    }

    pub fn with_default_groups(snapshot: &Snapshot, seed: u64) -> EntropyResult<Self> {
        Self::from_snapshot(snapshot, DELTACON_GROUPS, seed)
    }

    pub fn index(&self) -> &VertexIndex {
        &self.index
    }

    fn indexed(&self, snapshot: &Snapshot) -> Vec<(usize, usize, f64)> {
        snapshot
            .edges()
            .iter()
            .filter_map(|(u, v, w)| Some((self.index.get(u)?, self.index.get(v)?, *w)))
            .collect()
    }

    fn accumulate(&mut self, increment: &[(usize, usize, f64)]) {
        for &(u, v, w) in increment {
            let key = if u <= v { (u, v) } else { (v, u) };
            *self.weights.entry(key).or_insert(0.0) += w;
        }
    }

    /// Symmetric cumulative adjacency over every registered vertex.
    pub fn adjacency(&self) -> CsMat<f64> {
        let n = self.index.len();
        let mut triplets = TriMat::with_capacity((n, n), 2 * self.weights.len());
        for (&(u, v), &w) in &self.weights {
            if w != 0.0 {
                triplets.add_triplet(u, v, w);
                triplets.add_triplet(v, u, w);
            }
        }
        triplets.to_csr()
    }
}

impl IncrementalSimilarity for DeltaConTracker {
    fn name(&self) -> &'static str {
        "deltacon"
    }

    fn observe(&mut self, snapshot: &Snapshot) -> EntropyResult<f64> {
        let added = self.index.register_snapshot(snapshot);
        if self.index.is_empty() {
            return Ok(0.0);
        }
        let before = self.adjacency();
        let increment = self.indexed(snapshot);
        self.accumulate(&increment);
        let after = self.adjacency();

        let similarity = delta_con(&before, &after, self.groups, &mut self.rng)?;
        debug!(
            "DeltaCon stream: {} new vertices, {} vertices total",
            added,
            self.index.len()
        );
        Ok(1.0 - similarity)
    }
}

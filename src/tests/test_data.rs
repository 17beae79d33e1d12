//! Seeded graph fixtures shared by the test modules.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::generators::{barabasi_albert, erdos_renyi, watts_strogatz};
use crate::graph::Graph;
use crate::stream::Snapshot;

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn make_ba(n: usize, m: usize, seed: u64) -> Graph {
    barabasi_albert(n, m, &mut rng(seed)).unwrap()
}

pub fn make_er(n: usize, p: f64, seed: u64) -> Graph {
    erdos_renyi(n, p, &mut rng(seed)).unwrap()
}

pub fn make_ws(n: usize, k: usize, p: f64, seed: u64) -> Graph {
    watts_strogatz(n, k, p, &mut rng(seed)).unwrap()
}

/// Small weighted graph with a pendant vertex and an isolated vertex.
pub fn make_weighted_small() -> Graph {
    Graph::new(
        6,
        vec![
            (0, 1, 2.0),
            (0, 2, 1.0),
            (1, 2, 0.5),
            (2, 3, 3.0),
            (3, 4, 1.5),
        ],
    )
    .unwrap()
}

/// Three increments of a named stream, the last one removing weight.
pub fn make_stream() -> Vec<Snapshot> {
    vec![
        Snapshot::new(vec![
            ("a", "b", 1.0),
            ("b", "c", 2.0),
            ("c", "d", 1.0),
            ("d", "a", 1.0),
        ]),
        Snapshot::new(vec![("a", "c", 1.0), ("d", "e", 2.0), ("e", "f", 1.0)]),
        Snapshot::new(vec![("b", "c", -2.0), ("f", "g", 1.0), ("a", "b", 3.0)]),
        Snapshot::new(vec![("g", "h", 0.5), ("h", "a", 0.5)]),
    ]
}

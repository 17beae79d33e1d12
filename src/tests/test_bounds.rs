use approx::assert_relative_eq;

use crate::bounds::{conjugate_degree_sequence, lower_bound, upper_bound, EntropyBounds};
use crate::exact::{structural_entropy, von_neumann_entropy};
use crate::generators::{complete, cycle, empty, path, star};
use crate::graph::Graph;
use crate::laplacian::LaplacianMode;
use crate::tests::init;
use crate::tests::test_data::{make_ba, make_er, make_ws};

fn gap(g: &Graph) -> f64 {
    structural_entropy(g) - von_neumann_entropy(g, LaplacianMode::Combinatorial).unwrap()
}

#[test]
fn bounds_sandwich_the_entropy_gap() {
    init();
    let graphs = vec![
        ("ba", make_ba(200, 2, 1)),
        ("ba dense", make_ba(150, 5, 2)),
        ("er", make_er(150, 0.05, 3)),
        ("ws", make_ws(120, 3, 0.1, 4)),
        ("star", star(50).unwrap()),
        ("path", path(40).unwrap()),
        ("cycle", cycle(30).unwrap()),
    ];
    for (name, g) in graphs {
        let bounds = EntropyBounds::compute(&g);
        let delta = gap(&g);
        assert!(
            bounds.lower <= bounds.upper + 1e-12,
            "{}: inverted bounds {:?}",
            name,
            bounds
        );
        assert!(
            bounds.contains(delta, 1e-9),
            "{}: gap {} outside [{}, {}]",
            name,
            delta,
            bounds.lower,
            bounds.upper
        );
    }
}

#[test]
fn edgeless_graph_has_zero_bounds() {
    init();
    let g = empty(5).unwrap();
    assert_eq!(lower_bound(&g), 0.0);
    assert_eq!(upper_bound(&g), 0.0);
}

#[test]
fn upper_bound_never_exceeds_log2_e() {
    init();
    let log2_e = std::f64::consts::LOG2_E;
    for g in [make_ba(300, 3, 8), complete(20).unwrap(), star(200).unwrap()] {
        assert!(upper_bound(&g) <= log2_e + 1e-12);
    }
}

#[test]
fn regular_graph_lower_bound() {
    init();
    // d-regular: [f(d+1) − 2f(d) + f(d−1)] / nd
    let g = cycle(10).unwrap();
    let f = |x: f64| if x > 0.0 { x * x.log2() } else { 0.0 };
    let expected = (f(3.0) - 2.0 * f(2.0) + f(1.0)) / 20.0;
    assert_relative_eq!(lower_bound(&g), expected, epsilon = 1e-12);
}

#[test]
fn conjugate_sequence_transposes_histogram() {
    init();
    // Ferrers diagram of (3, 2, 2, 1) transposes to (4, 3, 1)
    assert_eq!(
        conjugate_degree_sequence(&[3, 2, 2, 1], 5),
        vec![4, 3, 1, 0, 0]
    );
    // degrees beyond the vertex count are truncated
    assert_eq!(conjugate_degree_sequence(&[4], 2), vec![1, 1]);
    assert!(conjugate_degree_sequence(&[], 0).is_empty());
}

#[test]
fn star_bounds_are_tight() {
    init();
    let g = star(50).unwrap();
    let bounds = EntropyBounds::compute(&g);
    assert_relative_eq!(bounds.lower, bounds.upper, epsilon = 1e-12);
    assert_relative_eq!(gap(&g), bounds.lower, epsilon = 1e-9);
}

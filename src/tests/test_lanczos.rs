use nalgebra::DMatrix;

use crate::errors::EntropyError;
use crate::generators::complete;
use crate::lanczos::{lanczos, LanczosEngine};
use crate::laplacian::{build_adjacency, build_laplacian, sparse_to_dense};
use crate::tests::init;
use crate::tests::test_data::make_ba;

#[test]
fn basis_is_orthonormal_and_projects_to_tridiagonal() {
    init();
    let lap = build_laplacian(&build_adjacency(&make_ba(150, 3, 4)), true);
    let state = LanczosEngine::new(12, 8).with_seed(7).run(&lap).unwrap();
    assert_eq!(state.nvectors(), 8);
    assert_eq!(state.steps(), 12);
    assert!(!state.is_truncated());

    let dense = sparse_to_dense(&lap);
    for run in &state.runs {
        assert_eq!(run.beta.len() + 1, run.alpha.len());
        let v = run.basis_matrix();
        let gram = v.transpose() * &v;
        let identity = DMatrix::<f64>::identity(run.steps(), run.steps());
        assert!((gram - identity).abs().max() < 1e-10);

        let projected = v.transpose() * &dense * &v;
        assert!((projected - run.tridiagonal()).abs().max() < 1e-8);
    }
}

#[test]
fn same_seed_gives_same_tridiagonals() {
    init();
    let lap = build_laplacian(&build_adjacency(&make_ba(80, 2, 1)), false);
    let a = lanczos(&lap, 6, 4, Some(3)).unwrap();
    let b = lanczos(&lap, 6, 4, Some(3)).unwrap();
    assert_eq!(a.tridiagonals(), b.tridiagonals());

    let c = lanczos(&lap, 6, 4, Some(4)).unwrap();
    assert_ne!(a.tridiagonals(), c.tridiagonals());
}

#[test]
fn breakdown_keeps_the_valid_prefix() {
    init();
    // K_n has two distinct Laplacian eigenvalues: the Krylov space stops at 2
    let lap = build_laplacian(&build_adjacency(&complete(6).unwrap()), false);
    let state = lanczos(&lap, 5, 3, Some(1)).unwrap();
    assert!(state.is_truncated());
    for run in &state.runs {
        assert_eq!(run.steps(), 2);
        assert_eq!(run.basis.len(), 2);
        assert_eq!(run.beta.len(), 1);
    }
}

#[test]
fn steps_are_capped_by_dimension() {
    init();
    let lap = build_laplacian(&build_adjacency(&make_ba(6, 2, 2)), false);
    let state = lanczos(&lap, 40, 2, Some(5)).unwrap();
    assert_eq!(state.requested_steps, 6);
    assert!(state.steps() <= 6);
}

#[test]
fn invalid_arguments() {
    init();
    let lap = build_laplacian(&build_adjacency(&make_ba(10, 2, 2)), false);
    assert!(matches!(
        lanczos(&lap, 0, 4, None),
        Err(EntropyError::InvalidArgument(_))
    ));
    assert!(matches!(
        lanczos(&lap, 4, 0, None),
        Err(EntropyError::InvalidArgument(_))
    ));

    let rectangular = sprs::CsMat::<f64>::zero((3, 4));
    assert!(matches!(
        lanczos(&rectangular, 2, 2, None),
        Err(EntropyError::InvalidArgument(_))
    ));
}

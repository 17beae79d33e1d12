//! The entropy kernel `x·log(x)` with the `0·log(0) = 0` convention.
//!
//! Every estimator in the crate goes through these functions so that values
//! right at the boundary are treated identically everywhere.

/// Arguments at or below this value are treated as exact zeros.
pub const ENTROPY_EPS: f64 = 1e-8;

/// `x·log2(x)`, or 0 when `x <= ENTROPY_EPS`.
#[inline]
pub fn xlog2x(x: f64) -> f64 {
    if x <= ENTROPY_EPS {
        0.0
    } else {
        x * x.log2()
    }
}

/// `x·ln(x)`, or 0 when `x <= 0`.
///
/// Used on Ritz values inside stochastic quadrature, where small negative
/// values are rounding noise and small positive values must still count.
#[inline]
pub fn xlnx(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * x.ln()
    }
}

/// Shannon entropy (base 2) of a non-negative mass vector normalised by `total`.
///
/// Returns 0 when `total` is not positive.
pub fn shannon_entropy(masses: impl IntoIterator<Item = f64>, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    -masses.into_iter().map(|m| xlog2x(m / total)).sum::<f64>()
}

//! Error types for entropy computations.

use thiserror::Error;

/// Errors surfaced by the entropy estimators.
///
/// Degenerate inputs are deliberately absent: a graph without edges has
/// entropy 0 by convention, a Lanczos breakdown truncates the Krylov basis and
/// an optimizer that runs out of candidate edges simply stops.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EntropyError {
    /// Unsupported mode or normalisation name, malformed graph (self-loops,
    /// duplicate edges, out-of-range vertices) or an invalid parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A linear-algebra routine returned non-finite values.
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type EntropyResult<T> = Result<T, EntropyError>;

impl EntropyError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EntropyError::InvalidArgument(msg.into())
    }
}

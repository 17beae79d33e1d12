//! # graph-entropy
//!
//! Exact and approximate von Neumann graph entropy (VNGE).
//!
//! The crate computes the Shannon entropy of the (trace-normalised) Laplacian
//! spectrum of a graph together with a family of cheaper surrogates:
//!
//! - **Structural information**: entropy of the normalised degree sequence
//!   (`exact::structural_entropy`).
//! - **Sharpened bounds** on the entropy gap `SI − VNGE` from the degree
//!   sequence and its conjugate (`bounds`).
//! - **FINGER**: quadratic approximation `Q` combined with the largest
//!   Laplacian eigenvalue or the maximum degree (`finger`).
//! - **SLaQ**: stochastic Lanczos quadrature with control variates for VNGE and
//!   NetLSD heat-trace signatures (`lanczos`, `slq`).
//!
//! Streaming helpers cover incremental structural information, DeltaCon
//! similarity via fast belief propagation and VEO scores (`incremental`,
//! `belief`, `stream`); `optimizer` grows a graph edge by edge towards maximum
//! entropy.
//!
//! ```
//! use graph_entropy::exact::{structural_entropy, von_neumann_entropy};
//! use graph_entropy::generators::complete;
//! use graph_entropy::laplacian::LaplacianMode;
//!
//! // K_8: uniform degrees, Laplacian spectrum {0, 8 (x7)}.
//! let g = complete(8).unwrap();
//! let si = structural_entropy(&g);
//! let vn = von_neumann_entropy(&g, LaplacianMode::Combinatorial).unwrap();
//! assert!((si - 3.0).abs() < 1e-9);
//! assert!((vn - 7f64.log2()).abs() < 1e-6);
//! ```

pub mod belief;
pub mod bounds;
pub mod builder;
pub mod distance;
pub mod eigen;
pub mod errors;
pub mod exact;
pub mod finger;
pub mod generators;
pub mod graph;
pub mod incremental;
pub mod kernel;
pub mod lanczos;
pub mod laplacian;
pub mod optimizer;
pub mod slq;
pub mod stream;

pub use errors::{EntropyError, EntropyResult};
pub use graph::{Edge, Graph};

#[cfg(test)]
mod tests;

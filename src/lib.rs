//! `mvlearn` provides robust matrix factorizations for multi-dimensional signals, such as
//! hyperspectral images, spectrum images in electron microscopy or spectroscopic time series.
//!
//! The crate holds everything the algorithm crates share:
//!
//! * the [`Float`] trait all algorithms are generic over,
//! * the [`ParamGuard`] / [`Fit`](traits::Fit) pair used to validate hyperparameters before
//!   fitting,
//! * the common [`Error`](error::Error) type,
//! * numeric primitives in [`linalg`]: shrinkage operators, nan-safe arithmetic and fast SVDs,
//! * metrics to compare a recovered factorization with a known ground truth.
//!
//! ## The algorithm crates
//!
//! * `mvlearn-rpca`: robust PCA, either batch (GoDec) or online (ORPCA)
//! * `mvlearn-nmf`: online robust nonnegative matrix factorization (ORNMF)
//! * `mvlearn-mcr`: multivariate curve resolution of a previous decomposition
//! * `mvlearn-components`: power-law background component with two-area estimation
//!
//! Data matrices are always laid out as `(n_features, n_samples)`: every column is one sample,
//! e.g. one spectrum, and the online algorithms stream over the columns in order.

pub mod deprecation;
pub mod error;
mod float;
pub mod linalg;
mod metrics_decomposition;
pub mod param_guard;
pub mod prelude;
pub mod traits;

pub use error::Error;
pub use float::Float;
pub use param_guard::ParamGuard;

/// Common metrics functions for decompositions
pub mod metrics {
    pub use crate::metrics_decomposition::Decomposition;
}

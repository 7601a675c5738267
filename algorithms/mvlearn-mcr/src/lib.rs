//! # Multivariate Curve Resolution
//!
//! `mvlearn-mcr` turns the abstract components of a decomposition into non-negative,
//! interpretable spectra and abundance maps. The selected components are rotated to a simple
//! structure with varimax, flipped to be mostly positive, and refitted to the data by
//! alternating regression under non-negativity and normalization constraints.
//!
//! ## The Big Picture
//!
//! `mvlearn-mcr` is a crate in the `mvlearn` workspace. Unlike the other algorithm crates it does
//! not consume a raw data matrix: it works on the results of a previous decomposition through the
//! [`LearningResults`] trait. Data is laid out as `(n_pixels, n_channels)` here, factors as
//! `(n_channels, k)` and loadings as `(n_pixels, k)`.
//!
//! ## Current state
//!
//! `mvlearn-mcr` provides
//!
//! - [`Mcr`]: curve resolution of decomposition results with spatial or spectral simplicity
//! - [`McrAr`]: the alternating regression engine with OLS or NNLS regressors and constraints
//! - [`orthomax`](orthomax::orthomax): the orthomax family of rotations, varimax included
//!
//! ## Example
//!
//! ```rust
//! use mvlearn::traits::Fit;
//! use mvlearn_mcr::{Constraint, DecompositionResults, Mcr, Simplicity};
//! use ndarray::array;
//!
//! let spectra = array![[1.0f64, 0.0], [2.0, 0.0], [0.0, 3.0], [0.0, 1.0]];
//! let maps = array![[1.0f64, 0.0], [0.6, 0.4], [0.0, 1.0]];
//! let data = maps.dot(&spectra.t());
//!
//! let results = DecompositionResults::from_matrices(data, &spectra, &maps)
//!     .with_output_dimension(2);
//! let mcr = Mcr::params()
//!     .simplicity(Simplicity::Spectral)
//!     .c_constraints(vec![Constraint::NonNegative])
//!     .fit(&results)
//!     .unwrap();
//!
//! // every resolved component sums to one
//! let sums = mcr.factors().sum_axis(ndarray::Axis(0));
//! assert!((sums[0] - 1.0).abs() < 1e-10 && (sums[1] - 1.0).abs() < 1e-10);
//! ```

mod constraint;
mod error;
mod learning_results;
mod mcr;
mod mcr_ar;
pub mod orthomax;
mod regressor;

pub use constraint::Constraint;
pub use error::{McrError, Result};
pub use learning_results::{
    ComponentStack, DecompositionResults, LearningResults, PoissonianWeights,
};
pub use mcr::{Mcr, McrParams, McrValidParams, Simplicity};
pub use mcr_ar::{McrAr, McrArParams, McrArValidParams, StopReason};
pub use regressor::{nnls, Regressor};

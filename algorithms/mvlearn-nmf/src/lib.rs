//! # Online Robust Nonnegative Matrix Factorization
//!
//! `mvlearn-nmf` factorizes nonnegative data, e.g. spectra or counts, into a nonnegative basis and
//! nonnegative coefficients while reading the samples one at a time. The robust solvers estimate
//! sparse outliers per sample, so that isolated spikes do not end up in the basis.
//!
//! Data matrices have the shape `(n_features, n_samples)`, the samples being the columns.
//!
//! ## Current state
//!
//! `mvlearn-nmf` currently provides [`Ornmf`] with three solvers, refer [`OrnmfMethod`]:
//!
//! - projected gradient descent (`PGD`)
//! - robust projected gradient descent (`RobustPGD`)
//! - stochastic subspace tracking with momentum (`MomentumSGD`)

mod algorithm;
mod error;
mod hyperparams;

pub use algorithm::Ornmf;
pub use error::{NmfError, Result};
pub use hyperparams::{OrnmfMethod, OrnmfParams, OrnmfValidParams};

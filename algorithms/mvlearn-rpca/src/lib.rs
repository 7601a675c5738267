//! # Robust Principal Component Analysis
//!
//! `mvlearn-rpca` separates a data matrix into a low-rank part and a sparse error, so that a few
//! grossly corrupted entries, e.g. dead pixels or cosmic rays in spectrum images, do not distort
//! the recovered components.
//!
//! ## The Big Picture
//!
//! `mvlearn-rpca` is a crate in the `mvlearn` workspace. Data matrices have the shape
//! `(n_features, n_samples)`, every column is one sample.
//!
//! ## Current state
//!
//! `mvlearn-rpca` currently provides an implementation of the following methods:
//!
//! - [`Godec`]: batch robust PCA by Go Decomposition, based on a randomized SVD
//! - [`Orpca`]: online robust PCA, processing one sample at a time with one of four subspace
//!   update rules
//!
//! ## Example
//!
//! ```rust
//! use mvlearn::traits::Fit;
//! use mvlearn_rpca::Godec;
//! use ndarray::Array2;
//!
//! let mut x = Array2::from_shape_fn((30, 20), |(i, j)| (i as f64).sin() * (j as f64));
//! x[[3, 4]] += 100.;
//!
//! let godec = Godec::params(1).random_state(42).fit(&x).unwrap();
//! assert!(godec.sparse()[[3, 4]] > 50.);
//! ```

mod error;
mod godec;
mod orpca;

pub use error::{Result, RpcaError};
pub use godec::{Godec, GodecParams, GodecValidParams};
pub use orpca::{Orpca, OrpcaInit, OrpcaMethod, OrpcaParams, OrpcaValidParams};

//! Batch robust PCA by Go Decomposition
mod algorithm;
mod hyperparams;

pub use algorithm::Godec;
pub use hyperparams::{GodecParams, GodecValidParams};

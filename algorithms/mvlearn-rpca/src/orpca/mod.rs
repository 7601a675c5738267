//! Online robust PCA by stochastic subspace tracking
mod algorithm;
mod hyperparams;
mod method;

pub use algorithm::Orpca;
pub use hyperparams::{OrpcaParams, OrpcaValidParams};
pub use method::{OrpcaInit, OrpcaMethod};

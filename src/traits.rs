//! Provide traits for the factorization algorithms
//!

/// Fittable algorithms
///
/// A fittable algorithm takes a data matrix and creates a concrete model. In this workspace the
/// records are always a dense matrix of shape `(n_features, n_samples)`, columns being the
/// samples, and the returned object owns every factor of the decomposition.
pub trait Fit<R, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E>;
}

use mvlearn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::algorithm::Godec;
use crate::error::{Result, RpcaError};

/// Robust PCA by GoDec, checked hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GodecValidParams<F: Float> {
    rank: usize,
    lambda1: Option<F>,
    power: usize,
    oversample: usize,
    max_iter: usize,
    tol: F,
    random_state: Option<u64>,
}

impl<F: Float> GodecValidParams<F> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Sparse regularization, `None` falls back to `1 / sqrt(n_samples)`
    pub fn lambda1(&self) -> Option<F> {
        self.lambda1
    }

    pub fn power(&self) -> usize {
        self.power
    }

    pub fn oversample(&self) -> usize {
        self.oversample
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// Robust PCA by GoDec
///
/// Builder for the hyperparameters, see [`Godec`] for the algorithm.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GodecParams<F: Float>(GodecValidParams<F>);

impl<F: Float> Godec<F> {
    /// Hyperparameters to decompose a matrix into `rank` low-rank components
    pub fn params(rank: usize) -> GodecParams<F> {
        GodecParams::new(rank)
    }
}

impl<F: Float> GodecParams<F> {
    pub fn new(rank: usize) -> Self {
        Self(GodecValidParams {
            rank,
            lambda1: None,
            power: 0,
            oversample: 0,
            max_iter: 1000,
            tol: F::cast(1e-3),
            random_state: None,
        })
    }

    /// Set the threshold of the sparse error, defaults to `1 / sqrt(n_samples)`
    pub fn lambda1(mut self, lambda1: F) -> Self {
        self.0.lambda1 = Some(lambda1);
        self
    }

    /// Number of power iterations of the randomized SVD
    pub fn power(mut self, power: usize) -> Self {
        self.0.power = power;
        self
    }

    /// Additional random samples drawn by the randomized SVD
    pub fn oversample(mut self, oversample: usize) -> Self {
        self.0.oversample = oversample;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the tolerance on the relative change of the low-rank estimate
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set seed for random number generator for reproducible results.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for GodecParams<F> {
    type Checked = GodecValidParams<F>;
    type Error = RpcaError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.rank == 0 {
            Err(RpcaError::ZeroRank)
        } else if self.0.max_iter == 0 {
            Err(RpcaError::ZeroIterations)
        } else if self.0.tol < F::zero() {
            Err(RpcaError::NotPositive {
                name: "tol",
                value: self.0.tol.to_f32().unwrap_or(f32::NAN),
            })
        } else if matches!(self.0.lambda1, Some(lambda) if lambda < F::zero()) {
            Err(RpcaError::NotPositive {
                name: "lambda1",
                value: self
                    .0
                    .lambda1
                    .and_then(|l| l.to_f32())
                    .unwrap_or(f32::NAN),
            })
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

use std::fmt;
use std::str::FromStr;

use mvlearn::{error::Error, Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::algorithm::Ornmf;
use crate::error::{NmfError, Result};

/// Solver of the ORNMF basis
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrnmfMethod {
    /// Projected gradient descent on the accumulated surrogate, without outlier estimation
    Pgd,
    /// Projected gradient descent, with a sparse outlier vector estimated per sample
    RobustPgd,
    /// Stochastic subspace tracking with momentum, with outlier estimation
    MomentumSgd,
}

impl OrnmfMethod {
    pub(crate) fn is_robust(&self) -> bool {
        !matches!(self, OrnmfMethod::Pgd)
    }
}

impl Default for OrnmfMethod {
    fn default() -> Self {
        OrnmfMethod::Pgd
    }
}

impl FromStr for OrnmfMethod {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PGD" => Ok(OrnmfMethod::Pgd),
            "RobustPGD" => Ok(OrnmfMethod::RobustPgd),
            "MomentumSGD" => Ok(OrnmfMethod::MomentumSgd),
            _ => Err(Error::invalid_choice(
                "method",
                s,
                "PGD, RobustPGD, MomentumSGD",
            )),
        }
    }
}

impl fmt::Display for OrnmfMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrnmfMethod::Pgd => "PGD",
            OrnmfMethod::RobustPgd => "RobustPGD",
            OrnmfMethod::MomentumSgd => "MomentumSGD",
        };
        write!(f, "{}", name)
    }
}

/// Online robust NMF, checked hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrnmfValidParams<F: Float> {
    rank: usize,
    method: OrnmfMethod,
    lambda1: F,
    kappa: F,
    subspace_learning_rate: F,
    subspace_momentum: F,
    store_error: bool,
    random_state: Option<u64>,
}

impl<F: Float> OrnmfValidParams<F> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn method(&self) -> OrnmfMethod {
        self.method
    }

    /// Outlier threshold
    pub fn lambda1(&self) -> F {
        self.lambda1
    }

    /// Step-size scale of the projected gradient solvers
    pub fn kappa(&self) -> F {
        self.kappa
    }

    pub fn subspace_learning_rate(&self) -> F {
        self.subspace_learning_rate
    }

    pub fn subspace_momentum(&self) -> F {
        self.subspace_momentum
    }

    pub fn store_error(&self) -> bool {
        self.store_error
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// Online robust NMF
///
/// Builder for the hyperparameters, see [`Ornmf`] for the algorithm.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrnmfParams<F: Float>(OrnmfValidParams<F>);

impl<F: Float> Ornmf<F> {
    /// Hyperparameters to factorize into `rank` nonnegative components
    pub fn params(rank: usize) -> OrnmfParams<F> {
        OrnmfParams::new(rank)
    }
}

impl<F: Float> OrnmfParams<F> {
    pub fn new(rank: usize) -> Self {
        Self(OrnmfValidParams {
            rank,
            method: OrnmfMethod::default(),
            lambda1: F::one(),
            kappa: F::one(),
            subspace_learning_rate: F::one(),
            subspace_momentum: F::cast(0.5),
            store_error: false,
            random_state: None,
        })
    }

    /// Select the basis solver, refer [`OrnmfMethod`]
    pub fn method(mut self, method: OrnmfMethod) -> Self {
        self.0.method = method;
        self
    }

    /// Set the threshold above which a residual is considered an outlier
    pub fn lambda1(mut self, lambda1: F) -> Self {
        self.0.lambda1 = lambda1;
        self
    }

    /// Scale the step size of the projected gradient solvers
    pub fn kappa(mut self, kappa: F) -> Self {
        self.0.kappa = kappa;
        self
    }

    /// Learning rate of the `MomentumSGD` solver
    pub fn subspace_learning_rate(mut self, learning_rate: F) -> Self {
        self.0.subspace_learning_rate = learning_rate;
        self
    }

    /// Momentum of the `MomentumSGD` solver, has to lie in `[0, 1]`
    pub fn subspace_momentum(mut self, momentum: F) -> Self {
        self.0.subspace_momentum = momentum;
        self
    }

    /// Keep the estimated outliers of every sample
    pub fn store_error(mut self, store_error: bool) -> Self {
        self.0.store_error = store_error;
        self
    }

    /// Set seed for random number generator for reproducible results.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for OrnmfParams<F> {
    type Checked = OrnmfValidParams<F>;
    type Error = NmfError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        let not_positive = |name, value: F| NmfError::NotPositive {
            name,
            value: value.to_f32().unwrap_or(f32::NAN),
        };

        if params.rank == 0 {
            Err(NmfError::ZeroRank)
        } else if params.subspace_momentum < F::zero() || params.subspace_momentum > F::one() {
            Err(NmfError::InvalidMomentum(
                params.subspace_momentum.to_f32().unwrap_or(f32::NAN),
            ))
        } else if params.subspace_learning_rate <= F::zero() {
            Err(not_positive(
                "subspace_learning_rate",
                params.subspace_learning_rate,
            ))
        } else if params.kappa <= F::zero() {
            Err(not_positive("kappa", params.kappa))
        } else if params.lambda1 < F::zero() {
            Err(not_positive("lambda1", params.lambda1))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_params() {
        let params = Ornmf::<f64>::params(3).check().unwrap();

        assert_eq!(params.method(), OrnmfMethod::Pgd);
        assert_abs_diff_eq!(params.lambda1(), 1.0);
        assert_abs_diff_eq!(params.kappa(), 1.0);
        assert_abs_diff_eq!(params.subspace_learning_rate(), 1.0);
        assert_abs_diff_eq!(params.subspace_momentum(), 0.5);
        assert!(!params.store_error());
    }

    #[test]
    fn parse_methods() {
        assert_eq!("PGD".parse::<OrnmfMethod>().unwrap(), OrnmfMethod::Pgd);
        assert_eq!(
            "RobustPGD".parse::<OrnmfMethod>().unwrap(),
            OrnmfMethod::RobustPgd
        );
        assert_eq!(
            "MomentumSGD".parse::<OrnmfMethod>().unwrap(),
            OrnmfMethod::MomentumSgd
        );

        let err = "uniform".parse::<OrnmfMethod>().unwrap_err();
        assert!(err.to_string().starts_with("'method' not recognised"));
    }

    #[test]
    fn momentum_out_of_range() {
        let err = Ornmf::<f64>::params(3)
            .method(OrnmfMethod::MomentumSgd)
            .subspace_momentum(1.9)
            .check()
            .unwrap_err();

        assert!(err.to_string().contains("must be a float between 0 and 1"));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            Ornmf::<f64>::params(0).check(),
            Err(NmfError::ZeroRank)
        ));
        assert!(Ornmf::<f64>::params(2).kappa(0.).check().is_err());
        assert!(Ornmf::<f64>::params(2).lambda1(-1.).check().is_err());
        assert!(Ornmf::<f64>::params(2)
            .subspace_learning_rate(-0.5)
            .check()
            .is_err());
    }
}

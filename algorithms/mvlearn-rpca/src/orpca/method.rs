use std::fmt;
use std::str::FromStr;

use mvlearn::{error::Error, Float};
use ndarray::{Array, Array2, ArrayD, Dimension};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Update rule of the ORPCA subspace
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrpcaMethod {
    /// Closed-form solution `L = B (A + λ₂I)⁻¹` of the accumulated surrogate
    ClosedForm,
    /// One sweep of block-coordinate descent over the basis columns
    BlockCoordinateDescent,
    /// Stochastic gradient descent with a decaying step size
    Sgd,
    /// Stochastic gradient descent with momentum
    MomentumSgd,
}

impl Default for OrpcaMethod {
    fn default() -> Self {
        OrpcaMethod::BlockCoordinateDescent
    }
}

impl FromStr for OrpcaMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CF" => Ok(OrpcaMethod::ClosedForm),
            "BCD" => Ok(OrpcaMethod::BlockCoordinateDescent),
            "SGD" => Ok(OrpcaMethod::Sgd),
            "MomentumSGD" => Ok(OrpcaMethod::MomentumSgd),
            _ => Err(Error::invalid_choice(
                "method",
                s,
                "CF, BCD, SGD, MomentumSGD",
            )),
        }
    }
}

impl fmt::Display for OrpcaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrpcaMethod::ClosedForm => "CF",
            OrpcaMethod::BlockCoordinateDescent => "BCD",
            OrpcaMethod::Sgd => "SGD",
            OrpcaMethod::MomentumSgd => "MomentumSGD",
        };
        write!(f, "{}", name)
    }
}

/// Initial ORPCA subspace
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum OrpcaInit<F> {
    /// Thin QR of the first `training_samples` columns
    Qr,
    /// Orthonormalised Gaussian matrix
    Rand,
    /// A user supplied basis, has to be of shape `(n_features, rank)`
    ///
    /// Stored with a dynamic dimension so that a wrongly shaped input is reported when checking
    /// the hyperparameters.
    Matrix(ArrayD<F>),
}

impl<F> Default for OrpcaInit<F> {
    fn default() -> Self {
        OrpcaInit::Qr
    }
}

impl<F: Float> FromStr for OrpcaInit<F> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr" => Ok(OrpcaInit::Qr),
            "rand" => Ok(OrpcaInit::Rand),
            _ => Err(Error::invalid_choice("init", s, "qr, rand")),
        }
    }
}

impl<F: Float> OrpcaInit<F> {
    pub fn matrix<D: Dimension>(init: Array<F, D>) -> Self {
        OrpcaInit::Matrix(init.into_dyn())
    }

    pub(crate) fn shape(&self) -> Option<&[usize]> {
        match self {
            OrpcaInit::Matrix(init) => Some(init.shape()),
            _ => None,
        }
    }
}

impl<F: Float> From<Array2<F>> for OrpcaInit<F> {
    fn from(init: Array2<F>) -> Self {
        OrpcaInit::Matrix(init.into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3};

    #[test]
    fn parse_methods() {
        for method in &[
            OrpcaMethod::ClosedForm,
            OrpcaMethod::BlockCoordinateDescent,
            OrpcaMethod::Sgd,
            OrpcaMethod::MomentumSgd,
        ] {
            assert_eq!(method.to_string().parse::<OrpcaMethod>().unwrap(), *method);
        }

        let err = "uniform".parse::<OrpcaMethod>().unwrap_err();
        assert!(err.to_string().starts_with("'method' not recognised"));
        assert!(err.to_string().contains("uniform"));
    }

    #[test]
    fn parse_init() {
        assert_eq!("qr".parse::<OrpcaInit<f64>>().unwrap(), OrpcaInit::Qr);
        assert_eq!("rand".parse::<OrpcaInit<f64>>().unwrap(), OrpcaInit::Rand);

        let err = "svd".parse::<OrpcaInit<f64>>().unwrap_err();
        assert!(err.to_string().starts_with("'init' not recognised"));
    }

    #[test]
    fn init_keeps_dimensionality() {
        assert_eq!(OrpcaInit::from(Array2::<f64>::zeros((4, 2))).shape(), Some(&[4, 2][..]));
        assert_eq!(OrpcaInit::matrix(Array1::<f64>::zeros(4)).shape(), Some(&[4][..]));
        assert_eq!(
            OrpcaInit::matrix(Array3::<f64>::zeros((4, 2, 1))).shape(),
            Some(&[4, 2, 1][..])
        );
        assert_eq!(OrpcaInit::<f64>::Qr.shape(), None);
    }
}

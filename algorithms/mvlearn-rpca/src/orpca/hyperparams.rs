use mvlearn::{deprecation::DeprecatedParameter, Float, ParamGuard};
use ndarray::Array2;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::algorithm::Orpca;
use super::method::{OrpcaInit, OrpcaMethod};
use crate::error::{Result, RpcaError};

/// Online robust PCA, checked hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct OrpcaValidParams<F: Float> {
    pub(crate) rank: usize,
    pub(crate) lambda1: Option<F>,
    pub(crate) lambda2: Option<F>,
    pub(crate) method: OrpcaMethod,
    pub(crate) init: OrpcaInit<F>,
    pub(crate) training_samples: usize,
    pub(crate) subspace_learning_rate: F,
    pub(crate) subspace_momentum: F,
    pub(crate) mask: Option<Array2<bool>>,
    pub(crate) random_state: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) deprecations: Vec<DeprecatedParameter>,
}

impl<F: Float> OrpcaValidParams<F> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Sparse regularization, `None` falls back to `1 / sqrt(n_features)`
    pub fn lambda1(&self) -> Option<F> {
        self.lambda1
    }

    /// Basis regularization, `None` falls back to `1 / sqrt(n_features)`
    pub fn lambda2(&self) -> Option<F> {
        self.lambda2
    }

    pub fn method(&self) -> OrpcaMethod {
        self.method
    }

    pub fn init(&self) -> &OrpcaInit<F> {
        &self.init
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    pub fn subspace_learning_rate(&self) -> F {
        self.subspace_learning_rate
    }

    pub fn subspace_momentum(&self) -> F {
        self.subspace_momentum
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    /// Legacy parameters that were forwarded to their new names
    pub fn deprecations(&self) -> &[DeprecatedParameter] {
        &self.deprecations
    }
}

/// Online robust PCA
///
/// Builder for the hyperparameters, see [`Orpca`] for the algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct OrpcaParams<F: Float>(OrpcaValidParams<F>);

impl<F: Float> Orpca<F> {
    /// Hyperparameters to track a `rank`-dimensional subspace
    pub fn params(rank: usize) -> OrpcaParams<F> {
        OrpcaParams::new(rank)
    }
}

impl<F: Float> OrpcaParams<F> {
    pub fn new(rank: usize) -> Self {
        Self(OrpcaValidParams {
            rank,
            lambda1: None,
            lambda2: None,
            method: OrpcaMethod::default(),
            init: OrpcaInit::default(),
            training_samples: 10,
            subspace_learning_rate: F::one(),
            subspace_momentum: F::cast(0.5),
            mask: None,
            random_state: None,
            deprecations: Vec::new(),
        })
    }

    /// Set the threshold of the sparse error, defaults to `1 / sqrt(n_features)`
    pub fn lambda1(mut self, lambda1: F) -> Self {
        self.0.lambda1 = Some(lambda1);
        self
    }

    /// Set the ridge regularization of the basis, defaults to `1 / sqrt(n_features)`
    pub fn lambda2(mut self, lambda2: F) -> Self {
        self.0.lambda2 = Some(lambda2);
        self
    }

    /// Select the subspace update rule, refer [`OrpcaMethod`]
    pub fn method(mut self, method: OrpcaMethod) -> Self {
        self.0.method = method;
        self
    }

    /// Select the initial subspace, refer [`OrpcaInit`]
    pub fn init(mut self, init: OrpcaInit<F>) -> Self {
        self.0.init = init;
        self
    }

    /// Number of leading samples used by the `qr` initialization
    pub fn training_samples(mut self, training_samples: usize) -> Self {
        self.0.training_samples = training_samples;
        self
    }

    /// Learning rate of the `SGD` and `MomentumSGD` updates
    pub fn subspace_learning_rate(mut self, learning_rate: F) -> Self {
        self.0.subspace_learning_rate = learning_rate;
        self
    }

    /// Momentum of the `MomentumSGD` update, has to lie in `[0, 1]`
    pub fn subspace_momentum(mut self, momentum: F) -> Self {
        self.0.subspace_momentum = momentum;
        self
    }

    #[deprecated(note = "use `subspace_learning_rate` instead")]
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.deprecations.push(DeprecatedParameter::warn(
            "learning_rate",
            "subspace_learning_rate",
        ));
        self.0.subspace_learning_rate = learning_rate;
        self
    }

    #[deprecated(note = "use `subspace_momentum` instead")]
    pub fn momentum(mut self, momentum: F) -> Self {
        self.0
            .deprecations
            .push(DeprecatedParameter::warn("momentum", "subspace_momentum"));
        self.0.subspace_momentum = momentum;
        self
    }

    /// Mark corrupted or missing entries, `true` excludes the entry from the fit
    ///
    /// The mask has to have the shape of the data.
    pub fn mask(mut self, mask: Array2<bool>) -> Self {
        self.0.mask = Some(mask);
        self
    }

    /// Set seed for random number generator for reproducible results.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for OrpcaParams<F> {
    type Checked = OrpcaValidParams<F>;
    type Error = RpcaError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        let negative = |name, value: Option<F>| match value {
            Some(value) if value < F::zero() => Err(RpcaError::NotPositive {
                name,
                value: value.to_f32().unwrap_or(f32::NAN),
            }),
            _ => Ok(()),
        };

        if params.rank == 0 {
            return Err(RpcaError::ZeroRank);
        }
        if params.training_samples < params.rank {
            return Err(RpcaError::NotEnoughTrainingSamples {
                training_samples: params.training_samples,
                rank: params.rank,
            });
        }
        if params.subspace_momentum < F::zero() || params.subspace_momentum > F::one() {
            return Err(RpcaError::InvalidMomentum(
                params.subspace_momentum.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if params.subspace_learning_rate <= F::zero() {
            return Err(RpcaError::NotPositive {
                name: "subspace_learning_rate",
                value: params.subspace_learning_rate.to_f32().unwrap_or(f32::NAN),
            });
        }
        negative("lambda1", params.lambda1)?;
        negative("lambda2", params.lambda2)?;

        if let Some(shape) = params.init.shape() {
            if shape.len() != 2 {
                return Err(RpcaError::InitNotTwoDimensional(shape.len()));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

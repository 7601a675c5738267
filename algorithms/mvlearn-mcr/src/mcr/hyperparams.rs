use std::fmt;
use std::str::FromStr;

use mvlearn::{error::Error, Float, ParamGuard};
use ndarray::{Array, ArrayD, Dimension};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::algorithm::Mcr;
use crate::constraint::Constraint;
use crate::error::{McrError, Result};
use crate::mcr_ar::McrArValidParams;
use crate::regressor::Regressor;

/// Domain in which the rotation enforces simplicity before the fit
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Simplicity {
    /// Varimax on the loadings, the rotation is carried over to the factors
    Spatial,
    /// Varimax on the factors
    Spectral,
}

impl Default for Simplicity {
    fn default() -> Self {
        Simplicity::Spatial
    }
}

impl FromStr for Simplicity {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "spatial" => Ok(Simplicity::Spatial),
            "spectral" => Ok(Simplicity::Spectral),
            _ => Err(Error::invalid_choice("simplicity", s, "spatial, spectral")),
        }
    }
}

impl fmt::Display for Simplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Simplicity::Spatial => write!(f, "spatial"),
            Simplicity::Spectral => write!(f, "spectral"),
        }
    }
}

/// Curve resolution, checked hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct McrValidParams<F: Float> {
    pub(crate) number_of_components: Option<usize>,
    pub(crate) component_list: Option<Vec<usize>>,
    pub(crate) simplicity: Simplicity,
    pub(crate) mask: Option<ArrayD<bool>>,
    pub(crate) mcr_ar: McrArValidParams<F>,
}

impl<F: Float> McrValidParams<F> {
    pub fn number_of_components(&self) -> Option<usize> {
        self.number_of_components
    }

    pub fn component_list(&self) -> Option<&[usize]> {
        self.component_list.as_deref()
    }

    pub fn simplicity(&self) -> Simplicity {
        self.simplicity
    }

    /// Mask over the signal of the factors, `true` excludes the channel
    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    /// Configuration of the alternating regression
    pub fn mcr_ar(&self) -> &McrArValidParams<F> {
        &self.mcr_ar
    }
}

/// Curve resolution
///
/// Builder for the hyperparameters, see [`Mcr`] for the algorithm. The settings of the
/// alternating regression are forwarded to [`McrArValidParams`](crate::McrArValidParams).
#[derive(Debug, Clone, PartialEq)]
pub struct McrParams<F: Float>(McrValidParams<F>);

impl<F: Float> Default for McrParams<F> {
    fn default() -> Self {
        Self(McrValidParams {
            number_of_components: None,
            component_list: None,
            simplicity: Simplicity::default(),
            mask: None,
            mcr_ar: McrArValidParams::default(),
        })
    }
}

impl<F: Float> Mcr<F> {
    pub fn params() -> McrParams<F> {
        McrParams::default()
    }
}

impl<F: Float> McrParams<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the first `n` components, takes precedence over a component list
    pub fn number_of_components(mut self, n: usize) -> Self {
        self.0.number_of_components = Some(n);
        self
    }

    /// Resolve an arbitrary selection of components
    pub fn component_list(mut self, components: Vec<usize>) -> Self {
        self.0.component_list = Some(components);
        self
    }

    pub fn simplicity(mut self, simplicity: Simplicity) -> Self {
        self.0.simplicity = simplicity;
        self
    }

    /// Exclude signal channels, the mask has the signal shape of the factors
    ///
    /// Masked channels do not take part in the fit and are zero in the resolved factors.
    pub fn mask<D: Dimension>(mut self, mask: Array<bool, D>) -> Self {
        self.0.mask = Some(mask.into_dyn());
        self
    }

    pub fn c_regr(mut self, regressor: Regressor) -> Self {
        self.0.mcr_ar.c_regr = regressor;
        self
    }

    pub fn st_regr(mut self, regressor: Regressor) -> Self {
        self.0.mcr_ar.st_regr = regressor;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.mcr_ar.max_iter = max_iter;
        self
    }

    pub fn c_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.0.mcr_ar.c_constraints = constraints;
        self
    }

    pub fn st_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.0.mcr_ar.st_constraints = constraints;
        self
    }

    pub fn tol_increase(mut self, tol_increase: F) -> Self {
        self.0.mcr_ar.tol_increase = tol_increase;
        self
    }

    pub fn tol_n_increase(mut self, tol_n_increase: usize) -> Self {
        self.0.mcr_ar.tol_n_increase = tol_n_increase;
        self
    }

    pub fn tol_err_change(mut self, tol_err_change: F) -> Self {
        self.0.mcr_ar.tol_err_change = tol_err_change;
        self
    }

    pub fn tol_n_above_min(mut self, tol_n_above_min: usize) -> Self {
        self.0.mcr_ar.tol_n_above_min = tol_n_above_min;
        self
    }
}

impl<F: Float> ParamGuard for McrParams<F> {
    type Checked = McrValidParams<F>;
    type Error = McrError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let empty_list = matches!(&self.0.component_list, Some(list) if list.is_empty());
        if self.0.number_of_components == Some(0)
            || (self.0.number_of_components.is_none() && empty_list)
        {
            return Err(McrError::NoComponents);
        }
        self.0.mcr_ar.validate()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

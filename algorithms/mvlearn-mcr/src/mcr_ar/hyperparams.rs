use mvlearn::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::algorithm::McrAr;
use crate::constraint::Constraint;
use crate::error::{McrError, Result};
use crate::regressor::Regressor;

/// Alternating regression, checked hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct McrArValidParams<F: Float> {
    pub(crate) c_regr: Regressor,
    pub(crate) st_regr: Regressor,
    pub(crate) max_iter: usize,
    pub(crate) c_constraints: Vec<Constraint>,
    pub(crate) st_constraints: Vec<Constraint>,
    pub(crate) tol_increase: F,
    pub(crate) tol_n_increase: usize,
    pub(crate) tol_err_change: F,
    pub(crate) tol_n_above_min: usize,
}

impl<F: Float> Default for McrArValidParams<F> {
    fn default() -> Self {
        McrArValidParams {
            c_regr: Regressor::Ols,
            st_regr: Regressor::Ols,
            max_iter: 100,
            c_constraints: vec![Constraint::NonNegative, Constraint::Normalize],
            st_constraints: vec![Constraint::NonNegative],
            tol_increase: F::one(),
            tol_n_increase: 10,
            tol_err_change: F::cast(1e-14),
            tol_n_above_min: 10,
        }
    }
}

impl<F: Float> McrArValidParams<F> {
    pub fn c_regr(&self) -> Regressor {
        self.c_regr
    }

    pub fn st_regr(&self) -> Regressor {
        self.st_regr
    }

    /// Maximum number of iterations, one iteration solves both halves
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn c_constraints(&self) -> &[Constraint] {
        &self.c_constraints
    }

    pub fn st_constraints(&self) -> &[Constraint] {
        &self.st_constraints
    }

    pub fn tol_increase(&self) -> F {
        self.tol_increase
    }

    pub fn tol_n_increase(&self) -> usize {
        self.tol_n_increase
    }

    pub fn tol_err_change(&self) -> F {
        self.tol_err_change
    }

    pub fn tol_n_above_min(&self) -> usize {
        self.tol_n_above_min
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let negative = |name, value: F| McrError::NegativeTolerance {
            name,
            value: value.to_f32().unwrap_or(f32::NAN),
        };

        if self.max_iter == 0 {
            Err(McrError::ZeroIterations)
        } else if !(self.tol_increase >= F::zero()) {
            Err(negative("tol_increase", self.tol_increase))
        } else if !(self.tol_err_change >= F::zero()) {
            Err(negative("tol_err_change", self.tol_err_change))
        } else {
            Ok(())
        }
    }
}

/// Alternating regression
///
/// Builder for the hyperparameters, see [`McrAr`] for the algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct McrArParams<F: Float>(pub(crate) McrArValidParams<F>);

impl<F: Float> Default for McrArParams<F> {
    fn default() -> Self {
        Self(McrArValidParams::default())
    }
}

impl<F: Float> McrAr<F> {
    pub fn params() -> McrArParams<F> {
        McrArParams::default()
    }
}

impl<F: Float> McrArParams<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regressor solving the concentrations `C`
    pub fn c_regr(mut self, regressor: Regressor) -> Self {
        self.0.c_regr = regressor;
        self
    }

    /// Regressor solving the spectra `Sᵀ`
    pub fn st_regr(mut self, regressor: Regressor) -> Self {
        self.0.st_regr = regressor;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Constraints applied to `C` after every regression, in order
    pub fn c_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.0.c_constraints = constraints;
        self
    }

    /// Constraints applied to `Sᵀ` after every regression, in order
    pub fn st_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.0.st_constraints = constraints;
        self
    }

    /// Allowed relative increase of the error per half-iteration, `1.0` lets it double
    pub fn tol_increase(mut self, tol_increase: F) -> Self {
        self.0.tol_increase = tol_increase;
        self
    }

    /// Number of consecutive half-iterations the error may increase above `tol_increase`
    pub fn tol_n_increase(mut self, tol_n_increase: usize) -> Self {
        self.0.tol_n_increase = tol_n_increase;
        self
    }

    /// Stop when the error changes by less than this between two half-iterations
    pub fn tol_err_change(mut self, tol_err_change: F) -> Self {
        self.0.tol_err_change = tol_err_change;
        self
    }

    /// Number of half-iterations allowed without reaching a new error minimum
    pub fn tol_n_above_min(mut self, tol_n_above_min: usize) -> Self {
        self.0.tol_n_above_min = tol_n_above_min;
        self
    }
}

impl<F: Float> ParamGuard for McrArParams<F> {
    type Checked = McrArValidParams<F>;
    type Error = McrError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

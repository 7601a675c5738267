use std::fmt;

use mvlearn::{error::Error, Float, ParamGuard};
use ndarray::{Array2, ArrayBase, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{McrArParams, McrArValidParams};
use crate::error::Result;

/// Reason the alternating regression stopped
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The maximum number of iterations was reached
    MaxIter,
    /// The error changed by less than `tol_err_change`
    ErrorChange,
    /// The error increased above `tol_increase` too many times in a row
    ErrorIncrease,
    /// No new error minimum for too many half-iterations
    AboveMinimum,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::MaxIter => "maximum number of iterations reached",
            StopReason::ErrorChange => "change in error below tol_err_change",
            StopReason::ErrorIncrease => "too many consecutive error increases",
            StopReason::AboveMinimum => "too many half-iterations above the error minimum",
        };
        write!(f, "{}", reason)
    }
}

/// Multivariate curve resolution by alternating regression (MCR-AR)
///
/// Factorizes a data matrix `D (n_samples × n_channels)` into concentrations and spectra
///
/// ```text
/// D ≈ C Sᵀ
/// ```
///
/// starting from an initial guess of either half. Every half-iteration solves one half by least
/// squares with the other half fixed, applies the constraints configured for that half and
/// evaluates the mean squared error of the reconstruction. The pair with the lowest error seen is
/// kept and returned.
///
/// The iteration stops when
///
/// * the error has not reached a new minimum for more than `tol_n_above_min` half-iterations,
/// * the error exceeded `(1 + tol_increase)` times its previous value in more than
///   `tol_n_increase` consecutive half-iterations,
/// * the error changed by less than `tol_err_change`,
/// * or after `max_iter` iterations.
///
/// ## Example
///
/// ```rust
/// use mvlearn_mcr::McrAr;
/// use ndarray::array;
///
/// let c = array![[1.0, 0.0], [0.5, 0.5], [0.0, 1.0]];
/// let st = array![[1.0, 2.0, 0.0, 0.0], [0.0, 0.0, 3.0, 1.0]];
/// let d = c.dot(&st);
///
/// // the scale of an initial guess is irrelevant
/// let mcr = McrAr::params().fit_with_st(&d, &(&st * 2.0)).unwrap();
/// assert!(mcr.errors().last().unwrap() < &1e-20);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct McrAr<F> {
    c: Array2<F>,
    st: Array2<F>,
    errors: Vec<F>,
    n_iter: usize,
    stop_reason: StopReason,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Half {
    C,
    St,
}

/// Error bookkeeping of the break rules
struct Progress<F> {
    errors: Vec<F>,
    best: Option<F>,
    n_above_min: usize,
    n_increase: usize,
}

impl<F: Float> Progress<F> {
    fn new() -> Self {
        Progress {
            errors: Vec::new(),
            best: None,
            n_above_min: 0,
            n_increase: 0,
        }
    }

    /// Record the error of a half-iteration, returns whether it is a new minimum and whether to
    /// stop
    fn record(&mut self, error: F, params: &McrArValidParams<F>) -> (bool, Option<StopReason>) {
        let improved = match self.best {
            Some(best) => error < best,
            None => true,
        };
        if improved {
            self.best = Some(error);
            self.n_above_min = 0;
        } else {
            self.n_above_min += 1;
        }

        let previous = self.errors.last().copied();
        self.errors.push(error);

        let stop = match previous {
            _ if self.n_above_min > params.tol_n_above_min() => Some(StopReason::AboveMinimum),
            Some(previous) => {
                if error > previous * (F::one() + params.tol_increase()) {
                    self.n_increase += 1;
                } else {
                    self.n_increase = 0;
                }

                if self.n_increase > params.tol_n_increase() {
                    Some(StopReason::ErrorIncrease)
                } else if (error - previous).abs() < params.tol_err_change() {
                    Some(StopReason::ErrorChange)
                } else {
                    None
                }
            }
            None => None,
        };

        (improved, stop)
    }
}

impl<F: Float> McrArValidParams<F> {
    /// Fit starting from the concentrations `c (n_samples × k)`, the first half-iteration solves
    /// the spectra
    pub fn fit_with_c<D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        d: &ArrayBase<D1, Ix2>,
        c: &ArrayBase<D2, Ix2>,
    ) -> Result<McrAr<F>> {
        if c.nrows() != d.nrows() {
            return Err(Error::MismatchedShapes {
                expected: vec![d.nrows(), c.ncols()],
                actual: c.shape().to_vec(),
            }
            .into());
        }

        let st = Array2::zeros((c.ncols(), d.ncols()));
        self.alternate(d, c.to_owned(), st, Half::St)
    }

    /// Fit starting from the spectra `st (k × n_channels)`, the first half-iteration solves the
    /// concentrations
    pub fn fit_with_st<D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        d: &ArrayBase<D1, Ix2>,
        st: &ArrayBase<D2, Ix2>,
    ) -> Result<McrAr<F>> {
        if st.ncols() != d.ncols() {
            return Err(Error::MismatchedShapes {
                expected: vec![st.nrows(), d.ncols()],
                actual: st.shape().to_vec(),
            }
            .into());
        }

        let c = Array2::zeros((d.nrows(), st.nrows()));
        self.alternate(d, c, st.to_owned(), Half::C)
    }

    fn alternate<D: Data<Elem = F>>(
        &self,
        d: &ArrayBase<D, Ix2>,
        mut c: Array2<F>,
        mut st: Array2<F>,
        mut next: Half,
    ) -> Result<McrAr<F>> {
        let mut progress = Progress::new();
        let mut best = (c.clone(), st.clone());
        let mut stop_reason = StopReason::MaxIter;
        let mut n_iter = 0;

        'iterations: while n_iter < self.max_iter() {
            n_iter += 1;

            for _ in 0..2 {
                match next {
                    Half::St => {
                        st = self.st_regr().solve(&c, d)?;
                        for constraint in self.st_constraints() {
                            constraint.apply(&mut st);
                        }
                        next = Half::C;
                    }
                    Half::C => {
                        c = self.c_regr().solve(&st.t(), &d.t())?.reversed_axes();
                        for constraint in self.c_constraints() {
                            constraint.apply(&mut c);
                        }
                        next = Half::St;
                    }
                }

                let error = mean_squared_error(d, &c, &st);
                log::debug!("MCR-AR iteration {}: mean squared error {}", n_iter, error);

                let (improved, stop) = progress.record(error, self);
                if improved {
                    best = (c.clone(), st.clone());
                }
                if let Some(reason) = stop {
                    stop_reason = reason;
                    break 'iterations;
                }
            }
        }

        log::info!("MCR-AR stopped after {} iterations: {}", n_iter, stop_reason);

        let (c, st) = best;
        Ok(McrAr {
            c,
            st,
            errors: progress.errors,
            n_iter,
            stop_reason,
        })
    }
}

impl<F: Float> McrArParams<F> {
    /// Check the hyperparameters and fit starting from the concentrations
    pub fn fit_with_c<D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        d: &ArrayBase<D1, Ix2>,
        c: &ArrayBase<D2, Ix2>,
    ) -> Result<McrAr<F>> {
        self.check_ref()?.fit_with_c(d, c)
    }

    /// Check the hyperparameters and fit starting from the spectra
    pub fn fit_with_st<D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        d: &ArrayBase<D1, Ix2>,
        st: &ArrayBase<D2, Ix2>,
    ) -> Result<McrAr<F>> {
        self.check_ref()?.fit_with_st(d, st)
    }
}

fn mean_squared_error<F: Float, D: Data<Elem = F>>(
    d: &ArrayBase<D, Ix2>,
    c: &Array2<F>,
    st: &Array2<F>,
) -> F {
    (d - &c.dot(st))
        .mapv(|v| v * v)
        .mean()
        .unwrap_or_else(F::zero)
}

impl<F: Float> McrAr<F> {
    /// Concentrations of the lowest-error pair, shape `(n_samples, k)`
    pub fn c(&self) -> &Array2<F> {
        &self.c
    }

    /// Spectra of the lowest-error pair, shape `(k, n_channels)`
    pub fn st(&self) -> &Array2<F> {
        &self.st
    }

    /// Mean squared error after every half-iteration
    pub fn errors(&self) -> &[F] {
        &self.errors
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// The reconstruction `C Sᵀ`
    pub fn reconstruct(&self) -> Array2<F> {
        self.c.dot(&self.st)
    }
}

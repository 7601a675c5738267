use std::fmt;
use std::str::FromStr;

use mvlearn::{
    error::Error,
    linalg::{pseudo_inverse, safe_div},
    Float,
};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::Result;

/// Least squares solver of one half-step of the alternating regression
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Regressor {
    /// Ordinary least squares, by pseudo-inverse
    Ols,
    /// Non-negative least squares, Lawson-Hanson active set per column
    Nnls,
}

impl Default for Regressor {
    fn default() -> Self {
        Regressor::Ols
    }
}

impl FromStr for Regressor {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "OLS" => Ok(Regressor::Ols),
            "NNLS" => Ok(Regressor::Nnls),
            _ => Err(Error::invalid_choice("regressor", s, "OLS, NNLS")),
        }
    }
}

impl fmt::Display for Regressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regressor::Ols => write!(f, "OLS"),
            Regressor::Nnls => write!(f, "NNLS"),
        }
    }
}

impl Regressor {
    /// Solve `min ‖A X - B‖` for `X`
    ///
    /// `a` has shape `(n, k)`, `b` has shape `(n, p)` and the solution has shape `(k, p)`.
    pub fn solve<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
        &self,
        a: &ArrayBase<D1, Ix2>,
        b: &ArrayBase<D2, Ix2>,
    ) -> Result<Array2<F>> {
        if a.nrows() != b.nrows() {
            return Err(Error::MismatchedShapes {
                expected: vec![a.nrows(), b.ncols()],
                actual: b.shape().to_vec(),
            }
            .into());
        }

        match self {
            Regressor::Ols => Ok(pseudo_inverse(a)?.dot(b)),
            Regressor::Nnls => {
                let mut x = Array2::zeros((a.ncols(), b.ncols()));
                for (column, mut target) in b.axis_iter(Axis(1)).zip(x.axis_iter_mut(Axis(1))) {
                    target.assign(&nnls(a, &column)?);
                }
                Ok(x)
            }
        }
    }
}

/// Non-negative least squares `min ‖A x - b‖` subject to `x >= 0`
///
/// Lawson-Hanson active set method. The passive set grows by the coordinate with the largest
/// positive gradient, interior least squares solutions with non-positive entries are walked back
/// to the feasible region. Stops after `3 k` outer iterations with the current feasible estimate.
pub fn nnls<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    a: &ArrayBase<D1, Ix2>,
    b: &ArrayBase<D2, Ix1>,
) -> Result<Array1<F>> {
    let (nrows, ncols) = a.dim();
    let max_iter = 3 * ncols;
    let norm_one = a
        .axis_iter(Axis(1))
        .map(|col| col.iter().map(|v| v.abs()).sum::<F>())
        .fold(F::zero(), F::max);
    let tol = F::cast(10 * nrows.max(ncols)) * F::epsilon() * norm_one;

    let mut x = Array1::zeros(ncols);
    let mut passive = vec![false; ncols];
    let mut n_iter = 0;

    loop {
        let w = a.t().dot(&(b - &a.dot(&x)));
        let candidate = (0..ncols)
            .filter(|&j| !passive[j] && w[j] > tol)
            .max_by(|&i, &j| w[i].partial_cmp(&w[j]).unwrap_or(std::cmp::Ordering::Equal));

        let entering = match candidate {
            Some(j) => j,
            None => break,
        };
        if n_iter >= max_iter {
            log::warn!(
                "NNLS did not converge within {} iterations, returning the current estimate",
                max_iter
            );
            break;
        }
        n_iter += 1;
        passive[entering] = true;

        loop {
            let s = passive_solution(a, b, &passive)?;
            let blocking = (0..ncols)
                .filter(|&j| passive[j] && s[j] <= F::zero())
                .map(|j| (j, safe_div(x[j], x[j] - s[j])))
                .min_by(|l, r| l.1.partial_cmp(&r.1).unwrap_or(std::cmp::Ordering::Equal));

            let (leaving, alpha) = match blocking {
                Some(blocking) => blocking,
                None => {
                    x = s;
                    break;
                }
            };
            x = &x + &((&s - &x) * alpha);

            // the blocking coordinate always leaves, so the passive set shrinks
            x[leaving] = F::zero();
            passive[leaving] = false;
            for j in 0..ncols {
                if passive[j] && x[j] <= tol {
                    passive[j] = false;
                    x[j] = F::zero();
                }
            }
        }
    }

    Ok(x)
}

/// Unconstrained least squares restricted to the passive columns, zero elsewhere
fn passive_solution<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    a: &ArrayBase<D1, Ix2>,
    b: &ArrayBase<D2, Ix1>,
    passive: &[bool],
) -> Result<Array1<F>> {
    let indices: Vec<usize> = (0..passive.len()).filter(|&j| passive[j]).collect();
    let mut s = Array1::zeros(passive.len());
    if indices.is_empty() {
        return Ok(s);
    }

    let solution = pseudo_inverse(&a.select(Axis(1), &indices))?.dot(b);
    for (&j, value) in indices.iter().zip(solution.iter()) {
        s[j] = *value;
    }
    Ok(s)
}

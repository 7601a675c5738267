//! Orthomax rotation of a factor or loading matrix
//!
//! The orthomax family rotates the columns of a matrix `A (d × m)` by an orthogonal `T` such that
//! the rotated `B = A T` is as simple as possible: every row loads on few columns. `gamma`
//! selects the member of the family, `0` is quartimax and `1` is varimax.
use mvlearn::{
    linalg::{safe_div, svd_desc},
    Float,
};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

use crate::error::{McrError, Result};

/// Default relative tolerance on the criterion
pub const DEFAULT_TOL: f64 = 1.4901e-7;
/// Default maximum number of iterations
pub const DEFAULT_MAX_ITER: usize = 256;

/// Orthomax rotation with the Lawley-Maxwell iteration
///
/// Every iteration takes `T = L Mᵀ` from the SVD `L S Mᵀ` of `Aᵀ (d B³ - γ B diag(Σ B²))`. The
/// iteration stops when the sum of singular values changes by less than `tol` relative to its
/// value, after `max_iter` iterations a warning is logged and the last rotation returned.
///
/// Returns the rotated matrix `B` and the rotation `T`.
///
/// # Errors
///
/// If `gamma` lies outside of `[0, 1]` or `max_iter` is zero
pub fn orthomax<F: Float, D: Data<Elem = F>>(
    a: &ArrayBase<D, Ix2>,
    gamma: F,
    tol: F,
    max_iter: usize,
) -> Result<(Array2<F>, Array2<F>)> {
    if !(gamma >= F::zero() && gamma <= F::one()) {
        return Err(McrError::InvalidGamma(
            gamma.to_f32().unwrap_or(f32::NAN),
        ));
    }
    if max_iter == 0 {
        return Err(McrError::ZeroIterations);
    }

    let (nrows, ncols) = a.dim();
    let mut rotated = a.to_owned();
    let mut rotation = Array2::eye(ncols);
    if nrows == 0 || ncols == 0 {
        return Ok((rotated, rotation));
    }

    let d = F::cast(nrows);
    let mut criterion = F::zero();
    for n_iter in 1..=max_iter {
        let previous = criterion;

        let column_norms = rotated.mapv(|v| v * v).sum_axis(Axis(0));
        let target = rotated.mapv(|v| v * v * v * d) - (&rotated * &column_norms) * gamma;
        let (l, s, mt) = svd_desc(&a.t().dot(&target))?;

        rotation = l.dot(&mt);
        criterion = s.sum();
        rotated = a.dot(&rotation);

        if safe_div((criterion - previous).abs(), criterion) < tol {
            log::debug!("orthomax converged after {} iterations", n_iter);
            return Ok((rotated, rotation));
        }
    }

    log::warn!(
        "orthomax did not converge within {} iterations, returning the last rotation",
        max_iter
    );
    Ok((rotated, rotation))
}

/// Varimax rotation, orthomax with `gamma = 1` and the default tolerances
pub fn varimax<F: Float, D: Data<Elem = F>>(
    a: &ArrayBase<D, Ix2>,
) -> Result<(Array2<F>, Array2<F>)> {
    orthomax(a, F::one(), F::cast(DEFAULT_TOL), DEFAULT_MAX_ITER)
}

use mvlearn::{
    error::Error,
    linalg::{clipped_soft_threshold, frobenius_norm, outer, safe_div},
    traits::Fit,
    Float,
};
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::StandardNormal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{NmfError, Result};
use crate::hyperparams::{OrnmfMethod, OrnmfValidParams};

const MAX_PROJECTION_ITER: usize = 1000;
const MAX_BASIS_ITER: usize = 500;
const TOL: f64 = 1e-5;

/// Online robust nonnegative matrix factorization (ORNMF)
///
/// ORNMF factorizes a nonnegative data matrix `X` of shape `(n_features, n_samples)` into
///
/// ```text
/// X ≈ W H,    W ≥ 0, H ≥ 0
/// ```
///
/// with `W` of shape `(n_features, rank)` and `H` of shape `(rank, n_samples)`, reading the
/// samples, the columns of `X`, one at a time.
///
/// For every sample `v` the coefficients `h ≥ 0` are found by projected gradient descent with the
/// step size `κ / ‖W‖²`. The robust solvers alternate this with an outlier estimate
/// `e = clip(soft(v - W h, λ), ±max(v))`, so that sparse spikes do not leak into the basis.
/// The basis is then updated, either
///
/// * `PGD` / `RobustPGD`: by projected gradient descent on the surrogate
///   `½ tr(WᵀW A) - tr(WᵀB)` built from the accumulators `A = Σ h hᵀ` and `B = Σ (v - e) hᵀ`,
///   with step size `κ / ‖A‖` and every column of `W` projected onto the nonnegative part of the
///   unit ball,
/// * `MomentumSGD`: by a single stochastic gradient step with momentum and the decaying step size
///   `1 / (lr (1 + lr λ t))`, clipping negative entries.
///
/// The coefficients of a sample are computed with the basis at the time the sample was read;
/// [`Ornmf::project`] recomputes them with the final basis.
///
/// ## Example
///
/// ```rust
/// use mvlearn::traits::Fit;
/// use mvlearn_nmf::Ornmf;
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((20, 30), |(i, j)| ((i + j) % 5) as f64 + 1.);
/// let ornmf = Ornmf::params(2).random_state(42).fit(&x).unwrap();
///
/// assert_eq!(ornmf.w().dim(), (20, 2));
/// assert_eq!(ornmf.h().dim(), (2, 30));
/// assert!(ornmf.w().iter().all(|&w| w >= 0.));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Ornmf<F> {
    w: Array2<F>,
    h: Array2<F>,
    error: Option<Array2<F>>,
    method: OrnmfMethod,
    lambda1: F,
    kappa: F,
}

/// Coefficients and outliers of a single sample for a fixed basis
fn solve_projection<F: Float, D: Data<Elem = F>>(
    w: &Array2<F>,
    v: &ArrayBase<D, Ix1>,
    lambda1: F,
    kappa: F,
    robust: bool,
) -> (Array1<F>, Array1<F>) {
    let (nfeatures, rank) = w.dim();
    let vmax = v.fold(F::zero(), |acc, &x| acc.max(x));
    let eta = safe_div(kappa, frobenius_norm(w).powi(2));
    let tol = F::cast(TOL);

    let mut h = Array1::zeros(rank);
    let mut e = Array1::zeros(nfeatures);
    for _ in 0..MAX_PROJECTION_ITER {
        let gradient = w.t().dot(&(w.dot(&h) + &e - v));
        let h_new = (&h - &(gradient * eta)).mapv(|x| x.max(F::zero()));
        let change_h = frobenius_norm(&(&h_new - &h));
        h = h_new;

        let mut change_e = F::zero();
        if robust {
            let e_new = clipped_soft_threshold(&(v - &w.dot(&h)), lambda1, vmax);
            change_e = frobenius_norm(&(&e_new - &e));
            e = e_new;
        }

        if change_h.max(change_e) / F::cast(nfeatures) < tol {
            break;
        }
    }

    (h, e)
}

/// Clip negative entries and shrink every column into the unit ball
fn project_basis<F: Float>(w: &mut Array2<F>) {
    w.mapv_inplace(|x| x.max(F::zero()));
    for mut column in w.axis_iter_mut(Axis(1)) {
        let norm = frobenius_norm(&column);
        if norm > F::one() {
            column.mapv_inplace(|x| x / norm);
        }
    }
}

/// Projected gradient descent on the surrogate `½ tr(WᵀW A) - tr(WᵀB)`
fn update_basis<F: Float>(w: &mut Array2<F>, a: &Array2<F>, b: &Array2<F>, kappa: F) {
    let eta = safe_div(kappa, frobenius_norm(a));
    let half = F::cast(0.5);
    let mut previous = F::zero();

    for n in 0..MAX_BASIS_ITER {
        let gradient = w.dot(a) - b;
        w.scaled_add(-eta, &gradient);
        project_basis(w);

        let objective = half * (w.dot(a) * &*w).sum() - (&*w * b).sum();
        if n >= 2 && safe_div((objective - previous).abs(), previous.abs()) < F::cast(TOL) {
            break;
        }
        previous = objective;
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, NmfError> for OrnmfValidParams<F> {
    type Object = Ornmf<F>;

    /// Factorize `x`, reading its columns in order
    ///
    /// # Errors
    ///
    /// If `x` has no samples, or the rank exceeds the smaller dimension of `x`
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (nfeatures, nsamples) = x.dim();
        let rank = self.rank();
        if nsamples == 0 {
            return Err(Error::NotEnoughSamples.into());
        }
        if rank > nfeatures.min(nsamples) {
            return Err(NmfError::InvalidRank {
                rank,
                max: nfeatures.min(nsamples),
            });
        }
        if x.iter().any(|&v| v < F::zero()) {
            log::warn!("ORNMF expects nonnegative data, the input has negative entries");
        }

        let mut rng = match self.random_state() {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        // half-normal entries scaled to the average magnitude of the data
        let mean = x.mean().unwrap_or_else(F::zero).max(F::zero());
        let scale = (mean / F::cast(nfeatures)).sqrt() / F::cast(rank).sqrt();
        let gaussian: Array2<f64> =
            Array::random_using((nfeatures, rank), StandardNormal, &mut rng);
        let mut w = gaussian.mapv(|v| F::cast(v.abs()) * scale);

        let method = self.method();
        let robust = method.is_robust();
        let mut a = Array2::zeros((rank, rank));
        let mut b = Array2::zeros((nfeatures, rank));
        let mut velocity = Array2::zeros((nfeatures, rank));

        let mut h = Array2::zeros((rank, nsamples));
        let mut error = if self.store_error() {
            Some(Array2::zeros((nfeatures, nsamples)))
        } else {
            None
        };

        for (t, v) in x.axis_iter(Axis(1)).enumerate() {
            let (coef, outliers) =
                solve_projection(&w, &v, self.lambda1(), self.kappa(), robust);
            let clean = &v - &outliers;

            match method {
                OrnmfMethod::Pgd | OrnmfMethod::RobustPgd => {
                    a += &outer(&coef, &coef);
                    b += &outer(&clean, &coef);
                    update_basis(&mut w, &a, &b, self.kappa());
                }
                OrnmfMethod::MomentumSgd => {
                    let lr = self.subspace_learning_rate();
                    let eta = lr * (F::one() + lr * self.lambda1() * F::cast(t + 1));
                    let gradient = (w.dot(&outer(&coef, &coef)) - outer(&clean, &coef)) / eta;
                    velocity = velocity * self.subspace_momentum() + gradient;
                    w -= &velocity;
                    w.mapv_inplace(|x| x.max(F::zero()));
                }
            }

            h.column_mut(t).assign(&coef);
            if let Some(error) = error.as_mut() {
                error.column_mut(t).assign(&outliers);
            }

            if (t + 1) % 1000 == 0 {
                log::debug!("ORNMF processed {} of {} samples", t + 1, nsamples);
            }
        }
        log::info!(
            "ORNMF ({}) factorized {} samples into {} components",
            method,
            nsamples,
            rank
        );

        Ok(Ornmf {
            w,
            h,
            error,
            method,
            lambda1: self.lambda1(),
            kappa: self.kappa(),
        })
    }
}

impl<F: Float> Ornmf<F> {
    /// Nonnegative basis `W`, shape `(n_features, rank)`
    pub fn w(&self) -> &Array2<F> {
        &self.w
    }

    /// Nonnegative coefficients `H` computed while streaming, shape `(rank, n_samples)`
    pub fn h(&self) -> &Array2<F> {
        &self.h
    }

    /// Estimated outliers, only kept with `store_error`
    pub fn error(&self) -> Option<&Array2<F>> {
        self.error.as_ref()
    }

    /// The product `W H`
    pub fn reconstruct(&self) -> Array2<F> {
        self.w.dot(&self.h)
    }

    /// Coefficients and outliers of the columns of `x` with respect to the final basis
    ///
    /// # Errors
    ///
    /// If `x` does not have `n_features` rows
    pub fn project<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
    ) -> Result<(Array2<F>, Array2<F>)> {
        let (nfeatures, rank) = self.w.dim();
        if x.nrows() != nfeatures {
            return Err(Error::MismatchedShapes {
                expected: vec![nfeatures, x.ncols()],
                actual: x.shape().to_vec(),
            }
            .into());
        }

        let mut h = Array2::zeros((rank, x.ncols()));
        let mut error = Array2::zeros(x.dim());
        for (j, v) in x.axis_iter(Axis(1)).enumerate() {
            let robust = self.method.is_robust();
            let (coef, outliers) = solve_projection(&self.w, &v, self.lambda1, self.kappa, robust);
            h.column_mut(j).assign(&coef);
            error.column_mut(j).assign(&outliers);
        }

        Ok((h, error))
    }
}

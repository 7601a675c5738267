use mvlearn::{
    error::Error,
    linalg::{
        factored_svd, frobenius_norm, orthonormalize, outer, pseudo_inverse, soft_threshold,
        unmasked_indices, LowRankSvd,
    },
    traits::Fit,
    Float,
};
use ndarray::{s, Array, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::StandardNormal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::OrpcaValidParams;
use super::method::{OrpcaInit, OrpcaMethod};
use crate::error::{Result, RpcaError};

/// Alternations between coefficients and sparse error per sample
const MAX_PROJECTION_ITER: usize = 100;

/// Online robust PCA (ORPCA)
///
/// ORPCA tracks a `rank`-dimensional subspace of a stream of samples, the columns of a data
/// matrix of shape `(n_features, n_samples)`. Every sample `z` is split into a projection onto
/// the current basis `L` and a sparse error
///
/// ```text
/// z ≈ L x + e
/// ```
///
/// by alternating a ridge regression for the coefficients `x` with a soft-thresholding of the
/// residual for `e`. The basis is then updated with the cleaned sample `z - e`, using one of the
/// [`OrpcaMethod`] rules:
///
/// * `CF` and `BCD` accumulate `A = Σ x xᵀ` and `B = Σ (z - e) xᵀ` and either solve the surrogate
///   in closed form or run one sweep of block-coordinate descent over the basis columns,
/// * `SGD` and `MomentumSGD` take a gradient step with the decaying step size
///   `1 / (lr (1 + lr λ₂ t))`.
///
/// The samples are processed in column order exactly once. After the last sample the low-rank
/// estimate is `X̂ = L R`, where `R` stacks the coefficients of every sample, and the SVD of `X̂`
/// is computed from its factors.
///
/// Entries flagged in the mask do not take part in the fit, their error is the full residual of
/// the projection.
///
/// ## Example
///
/// ```rust
/// use mvlearn::traits::Fit;
/// use mvlearn_rpca::{Orpca, OrpcaMethod};
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((30, 40), |(i, j)| ((i * j) % 7) as f64);
/// let orpca = Orpca::params(2)
///     .method("SGD".parse::<OrpcaMethod>().unwrap())
///     .fit(&x)
///     .unwrap();
///
/// assert_eq!(orpca.u().dim(), (30, 2));
/// assert_eq!(orpca.v().dim(), (40, 2));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Orpca<F> {
    low_rank: Array2<F>,
    sparse: Array2<F>,
    basis: Array2<F>,
    coefficients: Array2<F>,
    svd: LowRankSvd<F>,
}

/// Running state of the subspace tracking
struct Subspace<F> {
    basis: Array2<F>,
    a: Array2<F>,
    b: Array2<F>,
    velocity: Array2<F>,
    t: usize,
    lambda2: F,
    learning_rate: F,
    momentum: F,
    method: OrpcaMethod,
}

impl<F: Float> Subspace<F> {
    fn new(basis: Array2<F>, lambda2: F, params: &OrpcaValidParams<F>) -> Self {
        let (nfeatures, rank) = basis.dim();
        // the surrogate is minimised by the initial basis until the first sample arrives
        let b = basis.mapv(|v| v * lambda2);

        Subspace {
            basis,
            a: Array2::zeros((rank, rank)),
            b,
            velocity: Array2::zeros((nfeatures, rank)),
            t: 0,
            lambda2,
            learning_rate: params.subspace_learning_rate(),
            momentum: params.subspace_momentum(),
            method: params.method(),
        }
    }

    /// Regularised gram matrix `A + λ₂I`
    fn regularised(&self, gram: &Array2<F>) -> Array2<F> {
        let mut gram = gram.clone();
        gram.diag_mut().mapv_inplace(|v| v + self.lambda2);
        gram
    }

    /// Coefficients and sparse error of a sample restricted to the given rows
    fn project(&self, z: &Array1<F>, rows: &[usize], lambda1: F) -> Result<(Array1<F>, Array1<F>)> {
        let basis = self.basis.select(Axis(0), rows);
        let z = z.select(Axis(0), rows);

        let projection = pseudo_inverse(&self.regularised(&basis.t().dot(&basis)))?.dot(&basis.t());
        let tol = F::cast(1e-6) * F::cast(self.basis.nrows());

        let mut x = Array1::zeros(basis.ncols());
        let mut e = Array1::zeros(rows.len());
        for _ in 0..MAX_PROJECTION_ITER {
            let x_new = projection.dot(&(&z - &e));
            let e_new = soft_threshold(&(&z - &basis.dot(&x_new)), lambda1);

            let change = (frobenius_norm(&(&x_new - &x)).powi(2)
                + frobenius_norm(&(&e_new - &e)).powi(2))
            .sqrt();
            x = x_new;
            e = e_new;
            if change < tol {
                break;
            }
        }

        Ok((x, e))
    }

    fn update(&mut self, clean: &Array1<F>, x: &Array1<F>) -> Result<()> {
        self.t += 1;
        let xx = outer(x, x);
        let zx = outer(clean, x);

        match self.method {
            OrpcaMethod::ClosedForm => {
                self.a += &xx;
                self.b += &zx;
                self.basis = self.b.dot(&pseudo_inverse(&self.regularised(&self.a))?);
            }
            OrpcaMethod::BlockCoordinateDescent => {
                self.a += &xx;
                self.b += &zx;
                let a = self.regularised(&self.a);
                for j in 0..self.basis.ncols() {
                    let pivot = a[[j, j]];
                    if pivot <= F::zero() {
                        continue;
                    }
                    let column = (&self.b.column(j) - &self.basis.dot(&a.column(j))) / pivot
                        + &self.basis.column(j);
                    let norm = frobenius_norm(&column).max(F::one());
                    self.basis.column_mut(j).assign(&(column / norm));
                }
            }
            OrpcaMethod::Sgd | OrpcaMethod::MomentumSgd => {
                let lr = self.learning_rate;
                let eta = lr * (F::one() + lr * self.lambda2 * F::cast(self.t));
                let gradient = self.basis.dot(&xx) - &zx + &self.basis.mapv(|v| v * self.lambda2);
                let step = gradient / eta;

                if self.method == OrpcaMethod::MomentumSgd {
                    self.basis -= &(&self.velocity * self.momentum + &step);
                    self.velocity = step;
                } else {
                    self.basis -= &step;
                }
            }
        }

        Ok(())
    }
}

impl<F: Float> OrpcaValidParams<F> {
    fn initial_basis<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Array2<F>> {
        let (nfeatures, nsamples) = x.dim();
        let rank = self.rank();

        match self.init() {
            OrpcaInit::Qr => {
                let ncols = self.training_samples().min(nsamples).min(nfeatures);
                let q = orthonormalize(&x.slice(s![.., ..ncols]))?;
                Ok(q.slice_move(s![.., ..rank]))
            }
            OrpcaInit::Rand => {
                let gaussian: Array2<f64> =
                    Array::random_using((nfeatures, rank), StandardNormal, rng);
                Ok(orthonormalize(&gaussian.mapv(F::cast))?)
            }
            OrpcaInit::Matrix(init) => {
                if init.shape() != [nfeatures, rank] {
                    return Err(RpcaError::InitShape {
                        expected: (nfeatures, rank),
                        actual: init.shape().to_vec(),
                    });
                }
                Ok(init
                    .clone()
                    .into_dimensionality::<Ix2>()
                    .map_err(Error::from)?)
            }
        }
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, RpcaError> for OrpcaValidParams<F> {
    type Object = Orpca<F>;

    /// Track the subspace over the columns of `x`
    ///
    /// # Errors
    ///
    /// If the rank exceeds the smaller dimension of `x`, or the initial basis or the mask do not
    /// match the shape of `x`
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (nfeatures, nsamples) = x.dim();
        let rank = self.rank();
        if nsamples == 0 {
            return Err(Error::NotEnoughSamples.into());
        }
        if rank > nfeatures.min(nsamples) {
            return Err(RpcaError::InvalidRank {
                rank,
                max: nfeatures.min(nsamples),
            });
        }
        if let Some(mask) = self.mask() {
            if mask.dim() != x.dim() {
                return Err(RpcaError::MaskShape {
                    expected: x.dim(),
                    actual: mask.dim(),
                });
            }
        }

        let default_lambda = F::cast(nfeatures).sqrt().recip();
        let lambda1 = self.lambda1().unwrap_or(default_lambda);
        let lambda2 = self.lambda2().unwrap_or(default_lambda);

        let mut rng = match self.random_state() {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        let mut subspace = Subspace::new(self.initial_basis(x, &mut rng)?, lambda2, self);

        let all_rows: Vec<usize> = (0..nfeatures).collect();
        let mut coefficients = Array2::zeros((rank, nsamples));
        let mut sparse = Array2::zeros((nfeatures, nsamples));

        for (j, z) in x.axis_iter(Axis(1)).enumerate() {
            let z = z.to_owned();

            let (coef, error) = match self.mask() {
                Some(mask) => {
                    let rows = unmasked_indices(&mask.column(j));
                    let (coef, partial) = subspace.project(&z, &rows, lambda1)?;
                    let mut error = &z - &subspace.basis.dot(&coef);
                    for (value, &row) in partial.iter().zip(rows.iter()) {
                        error[row] = *value;
                    }
                    (coef, error)
                }
                None => subspace.project(&z, &all_rows, lambda1)?,
            };

            subspace.update(&(&z - &error), &coef)?;
            coefficients.column_mut(j).assign(&coef);
            sparse.column_mut(j).assign(&error);

            if (j + 1) % 1000 == 0 {
                log::debug!("ORPCA processed {} of {} samples", j + 1, nsamples);
            }
        }
        log::info!(
            "ORPCA ({}) tracked a rank {} subspace over {} samples",
            self.method(),
            rank,
            nsamples
        );

        let basis = subspace.basis;
        let low_rank = basis.dot(&coefficients);
        let svd = factored_svd(&basis, &coefficients, rank)?;

        Ok(Orpca {
            low_rank,
            sparse,
            basis,
            coefficients,
            svd,
        })
    }
}

impl<F: Float> Orpca<F> {
    /// The low-rank estimate `X̂ = L R`
    pub fn low_rank(&self) -> &Array2<F> {
        &self.low_rank
    }

    /// The sparse error `E`, one column per sample
    pub fn sparse(&self) -> &Array2<F> {
        &self.sparse
    }

    /// The tracked basis `L` after the last sample, shape `(n_features, rank)`
    pub fn basis(&self) -> &Array2<F> {
        &self.basis
    }

    /// Coefficients `R` of every sample, shape `(rank, n_samples)`
    pub fn coefficients(&self) -> &Array2<F> {
        &self.coefficients
    }

    /// Left singular vectors of `X̂`, shape `(n_features, rank)`
    pub fn u(&self) -> &Array2<F> {
        &self.svd.u
    }

    /// Singular values of `X̂` in decreasing order
    pub fn s(&self) -> &Array1<F> {
        &self.svd.s
    }

    /// Right singular vectors of `X̂`, shape `(n_samples, rank)`
    pub fn v(&self) -> &Array2<F> {
        &self.svd.v
    }

    pub fn svd(&self) -> &LowRankSvd<F> {
        &self.svd
    }
}

use mvlearn::{
    error::Error,
    linalg::{
        frobenius_norm, randomized_svd, safe_div, soft_threshold, subspace_svd, LowRankSvd,
    },
    traits::Fit,
    Float,
};
use ndarray::{concatenate, Array, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::StandardNormal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::GodecValidParams;
use crate::error::{Result, RpcaError};

/// Robust PCA by Go Decomposition (GoDec)
///
/// GoDec splits a data matrix `X` of shape `(n_features, n_samples)` into a low-rank part, a
/// sparse error and a dense noise residual
///
/// ```text
/// X = X̂ + E + G
/// ```
///
/// It alternates between a rank-limited randomized SVD of the current low-rank estimate and a
/// soft-thresholding of what the SVD could not explain. Only the first SVD starts from a Gaussian
/// sketch, later ones restart the subspace iteration from the previous right singular vectors
/// (plus `oversample` fresh Gaussian columns). Entries exceeding the threshold `lambda1`
/// move into the sparse error `E`, the remaining residual goes back into the low-rank estimate
/// for the next iteration. Iterations stop when the low-rank estimate changes by less than `tol`
/// relative to its norm.
///
/// Not converging within `max_iter` iterations is not an error: the last estimate is returned and
/// [`Godec::converged`] reports `false`.
///
/// ## Example
///
/// ```rust
/// use mvlearn::traits::Fit;
/// use mvlearn_rpca::Godec;
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((20, 15), |(i, j)| (i + 2 * j) as f64);
/// let godec = Godec::params(2).random_state(7).fit(&x).unwrap();
///
/// assert_eq!(godec.low_rank().dim(), (20, 15));
/// assert_eq!(godec.s().len(), 2);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Godec<F> {
    low_rank: Array2<F>,
    sparse: Array2<F>,
    noise: Array2<F>,
    svd: LowRankSvd<F>,
    n_iter: usize,
    converged: bool,
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, RpcaError> for GodecValidParams<F> {
    type Object = Godec<F>;

    /// Decompose the matrix
    ///
    /// # Errors
    ///
    /// If the rank exceeds the smaller dimension of the matrix
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (nfeatures, nsamples) = x.dim();
        let rank = self.rank();
        if rank > nfeatures.min(nsamples) {
            return Err(RpcaError::InvalidRank {
                rank,
                max: nfeatures.min(nsamples),
            });
        }

        let lambda1 = self
            .lambda1()
            .unwrap_or_else(|| F::cast(nsamples).sqrt().recip());
        let mut rng = match self.random_state() {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        let x = x.to_owned();
        let mut current = x.clone();
        let mut sparse = Array2::zeros(x.dim());
        let mut previous: Option<Array2<F>> = None;
        let mut start: Option<Array2<F>> = None;
        let extra = (rank + self.oversample()).min(nfeatures.min(nsamples)) - rank;
        let mut n_iter = 0;
        let mut converged = false;

        let (svd, low_rank) = loop {
            n_iter += 1;

            let svd = match &start {
                Some(v) if extra > 0 => {
                    let gaussian: Array2<f64> =
                        Array::random_using((nsamples, extra), StandardNormal, &mut rng);
                    let gaussian = gaussian.mapv(F::cast);
                    let start = concatenate(Axis(1), &[v.view(), gaussian.view()])
                        .map_err(Error::from)?;
                    subspace_svd(&current, &start, rank, self.power())?
                }
                Some(v) => subspace_svd(&current, v, rank, self.power())?,
                None => randomized_svd(
                    &current,
                    rank,
                    self.oversample(),
                    self.power(),
                    &mut rng,
                )?,
            };
            let low_rank = svd.reconstruct();

            let mut residual = &current - &low_rank + &sparse;
            sparse = soft_threshold(&residual, lambda1);
            residual -= &sparse;

            if let Some(previous) = &previous {
                let change = safe_div(
                    frobenius_norm(&(&low_rank - previous)),
                    frobenius_norm(previous),
                );
                log::debug!("GoDec iteration {}: relative change {}", n_iter, change);
                converged = change < self.tol();
            }

            if converged || n_iter >= self.max_iter() {
                break (svd, low_rank);
            }

            current = &low_rank + &residual;
            previous = Some(low_rank);
            start = Some(svd.v);
        };

        if converged {
            log::info!("GoDec converged after {} iterations", n_iter);
        } else {
            log::warn!(
                "GoDec did not converge within {} iterations, returning the last estimate",
                self.max_iter()
            );
        }

        let noise = &x - &low_rank - &sparse;

        Ok(Godec {
            low_rank,
            sparse,
            noise,
            svd,
            n_iter,
            converged,
        })
    }
}

impl<F: Float> Godec<F> {
    /// The low-rank estimate `X̂ = U diag(S) Vᵀ`
    pub fn low_rank(&self) -> &Array2<F> {
        &self.low_rank
    }

    /// The sparse error `E`
    pub fn sparse(&self) -> &Array2<F> {
        &self.sparse
    }

    /// The dense residual `G = X - X̂ - E`
    pub fn noise(&self) -> &Array2<F> {
        &self.noise
    }

    /// Left singular vectors, shape `(n_features, rank)`
    pub fn u(&self) -> &Array2<F> {
        &self.svd.u
    }

    /// Singular values in decreasing order
    pub fn s(&self) -> &Array1<F> {
        &self.svd.s
    }

    /// Right singular vectors, shape `(n_samples, rank)`
    pub fn v(&self) -> &Array2<F> {
        &self.svd.v
    }

    pub fn svd(&self) -> &LowRankSvd<F> {
        &self.svd
    }

    /// Number of iterations run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mvlearn::{metrics::Decomposition, ParamGuard};
    use mvlearn_datasets::generate::low_rank_sparse;
    use ndarray::array;

    use crate::GodecParams;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Godec<f64>>();
        has_autotraits::<GodecParams<f64>>();
        has_autotraits::<GodecValidParams<f32>>();
    }

    #[test]
    fn default_params() {
        let params = Godec::<f64>::params(3).check().unwrap();

        assert_eq!(params.rank(), 3);
        assert_eq!(params.lambda1(), None);
        assert_eq!(params.power(), 0);
        assert_eq!(params.oversample(), 0);
        assert_eq!(params.max_iter(), 1000);
        assert_abs_diff_eq!(params.tol(), 1e-3);
    }

    #[test]
    fn recovers_low_rank_from_sparse_outliers() {
        let mut rng = Xoshiro256Plus::seed_from_u64(101);
        let problem = low_rank_sparse((256, 250), 3, 0.01, 10., 0.01, &mut rng).unwrap();

        let godec = Godec::params(3)
            .random_state(123)
            .fit(&problem.observed)
            .unwrap();

        assert!(godec.converged());
        let relative = frobenius_norm(&(godec.low_rank() - &problem.low_rank))
            / frobenius_norm(&problem.low_rank);
        assert!(relative < 0.15, "relative error {}", relative);
        assert!(godec.low_rank().normalized_error(&problem.low_rank).unwrap() < 1e-3);
        assert!(godec.u().expressed_variance(&problem.basis).unwrap() < 0.05);
    }

    #[test]
    fn exact_low_rank_converges_immediately() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        let problem = low_rank_sparse((60, 40), 3, 0., 0., 0., &mut rng).unwrap();

        let godec = Godec::params(3)
            .random_state(4)
            .fit(&problem.observed)
            .unwrap();

        assert!(godec.converged());
        assert_eq!(godec.n_iter(), 2);
        assert_abs_diff_eq!(godec.low_rank(), &problem.low_rank, epsilon = 1e-8);
        assert!(godec.sparse().iter().all(|&v| v == 0.));
    }

    #[test]
    fn invariant_to_permutations() {
        let mut rng = Xoshiro256Plus::seed_from_u64(101);
        let problem = low_rank_sparse((256, 250), 3, 0.01, 10., 0.01, &mut rng).unwrap();
        let rows: Vec<usize> = (0..256).rev().collect();
        let cols: Vec<usize> = (0..250).map(|j| (7 * j) % 250).collect();
        let permuted = problem
            .observed
            .select(Axis(0), &rows)
            .select(Axis(1), &cols);

        let godec = Godec::params(3)
            .random_state(123)
            .fit(&problem.observed)
            .unwrap();
        let godec_permuted = Godec::params(3).random_state(9).fit(&permuted).unwrap();

        let expected = godec.low_rank().select(Axis(0), &rows).select(Axis(1), &cols);
        let difference = frobenius_norm(&(godec_permuted.low_rank() - &expected))
            / frobenius_norm(&expected);
        assert!(difference < 2e-2, "relative difference {}", difference);
        assert_abs_diff_eq!(godec_permuted.s(), godec.s(), epsilon = 0.05 * godec.s()[0]);
    }

    #[test]
    fn parts_sum_to_data() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let problem = low_rank_sparse((40, 30), 2, 0.05, 5., 0.1, &mut rng).unwrap();

        for power in 0..3 {
            let godec = Godec::params(2)
                .power(power)
                .oversample(2)
                .random_state(5)
                .fit(&problem.observed)
                .unwrap();

            let sum = godec.low_rank() + godec.sparse() + godec.noise();
            assert_abs_diff_eq!(sum, problem.observed, epsilon = 1e-10);
            assert_eq!(godec.u().dim(), (40, 2));
            assert_eq!(godec.v().dim(), (30, 2));
            assert!(godec.s()[0] >= godec.s()[1]);
        }
    }

    #[test]
    fn large_threshold_is_truncated_svd() {
        let x = array![[1., 2., 3.], [2., 4., 6.5], [0., 1., 0.], [1., 0., 1.]];
        let godec = Godec::params(1)
            .lambda1(1e6)
            .max_iter(1)
            .random_state(0)
            .fit(&x)
            .unwrap();

        assert!(godec.sparse().iter().all(|&v| v == 0.));
        assert_eq!(godec.n_iter(), 1);
        assert!(!godec.converged());
    }

    #[test]
    fn invalid_params() {
        let x = Array2::<f64>::ones((5, 4));

        assert!(matches!(
            Godec::<f64>::params(0).fit(&x),
            Err(RpcaError::ZeroRank)
        ));
        assert!(matches!(
            Godec::params(5).fit(&x),
            Err(RpcaError::InvalidRank { rank: 5, max: 4 })
        ));
        assert!(Godec::params(2).tol(-1.).fit(&x).is_err());
        assert!(Godec::params(2).lambda1(-1.).fit(&x).is_err());
        assert!(matches!(
            Godec::params(2).max_iter(0).fit(&x),
            Err(RpcaError::ZeroIterations)
        ));
    }
}

//! Utility functions for randomly generating factorization problems

use mvlearn::error::{Error, Result};
use mvlearn::linalg::orthonormalize;
use ndarray::{Array, Array2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Bernoulli, StandardNormal, Uniform},
    RandomExt,
};

/// A synthetic robust PCA problem `observed = low_rank + sparse + noise`
///
/// All matrices have shape `(n_features, n_samples)`, `basis` is the orthonormal
/// `(n_features, rank)` basis spanning the columns of `low_rank`.
#[derive(Debug, Clone)]
pub struct LowRankSparse {
    pub basis: Array2<f64>,
    pub low_rank: Array2<f64>,
    pub sparse: Array2<f64>,
    pub noise: Array2<f64>,
    pub observed: Array2<f64>,
}

/// Generate a rank-`rank` matrix `U Vᵀ` corrupted by sparse outliers and Gaussian noise.
///
/// `U` is an orthonormalised Gaussian `(n_features, rank)` matrix and `V` a Gaussian
/// `(n_samples, rank)` matrix. Each entry is corrupted with probability `corruption` by adding
/// `magnitude`; the noise is Gaussian with standard deviation `noise`.
///
/// # Example
/// ```
/// use mvlearn_datasets::generate::low_rank_sparse;
/// use ndarray_rand::rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let mut rng = Xoshiro256Plus::seed_from_u64(101);
/// let problem = low_rank_sparse((64, 50), 3, 0.01, 10., 0.01, &mut rng).unwrap();
/// assert_eq!(problem.observed.dim(), (64, 50));
/// ```
pub fn low_rank_sparse(
    shape: (usize, usize),
    rank: usize,
    corruption: f64,
    magnitude: f64,
    noise: f64,
    rng: &mut impl Rng,
) -> Result<LowRankSparse> {
    let (nfeatures, nsamples) = shape;
    if rank == 0 || rank > nfeatures.min(nsamples) {
        return Err(Error::Parameters(format!(
            "rank must be between 1 and {}, but is {}",
            nfeatures.min(nsamples),
            rank
        )));
    }

    let gaussian: Array2<f64> = Array::random_using((nfeatures, rank), StandardNormal, rng);
    let basis = orthonormalize(&gaussian)?;
    let coefficients: Array2<f64> = Array::random_using((nsamples, rank), StandardNormal, rng);
    let low_rank = basis.dot(&coefficients.t());

    let sparse = sparse_corruption(shape, corruption, magnitude, rng)?;
    let gaussian: Array2<f64> = Array::random_using(shape, StandardNormal, rng);
    let noise = gaussian * noise;
    let observed = &low_rank + &sparse + &noise;

    Ok(LowRankSparse {
        basis,
        low_rank,
        sparse,
        noise,
        observed,
    })
}

/// A matrix holding `magnitude` where a Bernoulli trial with probability `corruption` succeeded
/// and zero everywhere else.
pub fn sparse_corruption(
    shape: (usize, usize),
    corruption: f64,
    magnitude: f64,
    rng: &mut impl Rng,
) -> Result<Array2<f64>> {
    let trials = Bernoulli::new(corruption).map_err(|err| {
        Error::Parameters(format!("corruption probability {}: {}", corruption, err))
    })?;
    let hits: Array2<bool> = Array::random_using(shape, trials, rng);

    Ok(hits.mapv(|hit| if hit { magnitude } else { 0. }))
}

/// A synthetic nonnegative factorization problem `data = w · h`
#[derive(Debug, Clone)]
pub struct Nonnegative {
    pub w: Array2<f64>,
    pub h: Array2<f64>,
    pub data: Array2<f64>,
}

/// Generate a nonnegative rank-`rank` matrix from uniform `[0, 1)` factors.
///
/// The product is scaled down to unit Frobenius norm when its norm exceeds one; the returned
/// `w` absorbs that scale so that `data == w · h` holds.
pub fn nonnegative_low_rank(
    shape: (usize, usize),
    rank: usize,
    rng: &mut impl Rng,
) -> Nonnegative {
    let (nfeatures, nsamples) = shape;
    let w: Array2<f64> = Array::random_using((nfeatures, rank), Uniform::new(0., 1.), rng);
    let h: Array2<f64> = Array::random_using((rank, nsamples), Uniform::new(0., 1.), rng);

    let data = w.dot(&h);
    let scale = data.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.);

    Nonnegative {
        w: w / scale,
        h,
        data: data / scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn low_rank_sparse_is_consistent() {
        let mut rng = Xoshiro256Plus::seed_from_u64(101);
        let problem = low_rank_sparse((40, 30), 3, 0.05, 10., 0.01, &mut rng).unwrap();

        assert_abs_diff_eq!(
            problem.basis.t().dot(&problem.basis),
            Array2::eye(3),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            problem.observed,
            &problem.low_rank + &problem.sparse + &problem.noise,
            epsilon = 1e-12
        );
        assert!(problem.sparse.iter().all(|&x| x == 0. || x == 10.));
    }

    #[test]
    fn rejects_invalid_problems() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);

        assert!(low_rank_sparse((10, 5), 6, 0.01, 1., 0., &mut rng).is_err());
        assert!(sparse_corruption((3, 3), 1.5, 1., &mut rng).is_err());
    }

    #[test]
    fn nonnegative_product() {
        let mut rng = Xoshiro256Plus::seed_from_u64(101);
        let problem = nonnegative_low_rank((50, 20), 3, &mut rng);

        assert!(problem.data.iter().all(|&x| x >= 0.));
        assert_abs_diff_eq!(problem.w.dot(&problem.h), problem.data, epsilon = 1e-12);
        let norm = problem.data.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!(norm <= 1. + 1e-12);
    }
}

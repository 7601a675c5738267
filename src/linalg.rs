//! Numeric primitives shared by the factorizations
//!
//! Shrinkage operators, nan-safe arithmetic, mask handling and the SVD helpers used by the
//! robust PCA and curve resolution crates. The decompositions are backed by the pure-Rust
//! `linfa-linalg`.
use std::cmp::Ordering;

use linfa_linalg::{qr::QR, svd::SVD};
use ndarray::{s, Array, Array1, Array2, ArrayBase, Axis, Data, Dimension, Ix1, Ix2};
use ndarray_rand::{rand_distr::StandardNormal, RandomExt};
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::Float;

/// Shrink a single value towards zero by `threshold`
///
/// `sign(x) * max(|x| - threshold, 0)`
pub fn shrink<F: Float>(value: F, threshold: F) -> F {
    let magnitude = value.abs() - threshold;
    if magnitude > F::zero() {
        magnitude * value.signum()
    } else {
        F::zero()
    }
}

/// Elementwise soft-thresholding operator, the proximal map of the L1 norm
pub fn soft_threshold<F: Float, D: Data<Elem = F>, I: Dimension>(
    x: &ArrayBase<D, I>,
    threshold: F,
) -> Array<F, I> {
    x.mapv(|v| shrink(v, threshold))
}

/// Soft-thresholding followed by clipping to `[-vmax, vmax]`
pub fn clipped_soft_threshold<F: Float, D: Data<Elem = F>, I: Dimension>(
    x: &ArrayBase<D, I>,
    threshold: F,
    vmax: F,
) -> Array<F, I> {
    x.mapv(|v| {
        let v = shrink(v, threshold);
        if v > vmax {
            vmax
        } else if v < -vmax {
            -vmax
        } else {
            v
        }
    })
}

/// Replace `NaN` with zero and infinities with the largest finite values
pub fn nan_to_num<F: Float>(value: F) -> F {
    if value.is_nan() {
        F::zero()
    } else if value.is_infinite() {
        if value > F::zero() {
            F::max_value()
        } else {
            F::min_value()
        }
    } else {
        value
    }
}

/// Division returning zero for a zero denominator
pub fn safe_div<F: Float>(numerator: F, denominator: F) -> F {
    if denominator == F::zero() {
        F::zero()
    } else {
        nan_to_num(numerator / denominator)
    }
}

/// Indices of the entries that are not masked out
pub fn unmasked_indices<D: Data<Elem = bool>>(mask: &ArrayBase<D, Ix1>) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, masked)| !**masked)
        .map(|(idx, _)| idx)
        .collect()
}

/// Frobenius norm of a matrix, or euclidean norm of a vector
pub fn frobenius_norm<F: Float, D: Data<Elem = F>, I: Dimension>(x: &ArrayBase<D, I>) -> F {
    x.iter().map(|v| *v * *v).sum::<F>().sqrt()
}

/// Outer product `a bᵀ` of two vectors
pub fn outer<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    a: &ArrayBase<D1, Ix1>,
    b: &ArrayBase<D2, Ix1>,
) -> Array2<F> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Orthonormal basis of the column space of `x` (thin `Q` factor)
///
/// Requires at least as many rows as columns.
pub fn orthonormalize<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    Ok(x.qr()?.generate_q())
}

/// Thin SVD with the singular triplets sorted by decreasing singular value
pub fn svd_desc<F: Float, D: Data<Elem = F>>(
    x: &ArrayBase<D, Ix2>,
) -> Result<(Array2<F>, Array1<F>, Array2<F>)> {
    let (u, s, vt) = x.svd(true, true)?;
    let u = u.ok_or(Error::SvdDecomposition)?;
    let vt = vt.ok_or(Error::SvdDecomposition)?;

    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| s[b].partial_cmp(&s[a]).unwrap_or(Ordering::Equal));

    Ok((
        u.select(Axis(1), &order),
        s.select(Axis(0), &order),
        vt.select(Axis(0), &order),
    ))
}

/// Moore-Penrose pseudo-inverse
///
/// Singular values below `max(m, n) * sqrt(eps) * s_max` are treated as zero, so the ridge systems
/// `(LᵀL + λI)` and rank-deficient least squares problems are both handled.
pub fn pseudo_inverse<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Ok(Array2::zeros((ncols, nrows)));
    }

    let (u, s, vt) = svd_desc(x)?;
    let cutoff = F::cast(nrows.max(ncols)) * F::epsilon().sqrt() * s[0];
    let s_inv = s.mapv(|v| if v > cutoff { v.recip() } else { F::zero() });

    Ok((vt.t().to_owned() * &s_inv).dot(&u.t()))
}

/// Rank-limited singular value decomposition `U diag(S) Vᵀ`
///
/// `u` has shape `(n_features, rank)`, `s` holds `rank` decreasing singular values and `v` has
/// shape `(n_samples, rank)`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LowRankSvd<F> {
    pub u: Array2<F>,
    pub s: Array1<F>,
    pub v: Array2<F>,
}

impl<F: Float> LowRankSvd<F> {
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Rebuild the dense matrix `U diag(S) Vᵀ`
    pub fn reconstruct(&self) -> Array2<F> {
        (&self.u * &self.s).dot(&self.v.t())
    }

    fn truncate(self, rank: usize) -> Self {
        let rank = rank.min(self.rank());
        LowRankSvd {
            u: self.u.slice_move(s![.., ..rank]),
            s: self.s.slice_move(s![..rank]),
            v: self.v.slice_move(s![.., ..rank]),
        }
    }
}

/// SVD of a matrix given in factored form `left · right`
///
/// `left` has shape `(m, k)` with `m >= k` and `right` has shape `(k, n)` with `n >= k`. Only an
/// `(m, k)` QR decomposition and a `(k, n)` SVD are computed, the dense product is never formed.
/// The result is truncated to `rank` triplets.
pub fn factored_svd<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    left: &ArrayBase<D1, Ix2>,
    right: &ArrayBase<D2, Ix2>,
    rank: usize,
) -> Result<LowRankSvd<F>> {
    if left.ncols() != right.nrows() {
        return Err(Error::MismatchedShapes {
            expected: vec![left.ncols(), right.ncols()],
            actual: right.shape().to_vec(),
        });
    }

    let q = orthonormalize(left)?;
    let r = q.t().dot(left);

    let (u_small, s, vt) = svd_desc(&r.dot(right))?;

    Ok(LowRankSvd {
        u: q.dot(&u_small),
        s,
        v: vt.reversed_axes(),
    }
    .truncate(rank))
}

/// Randomized truncated SVD by subspace (power) iteration
///
/// A Gaussian sketch with `rank + oversample` columns is pushed `power + 1` times through
/// `xᵀx`, re-orthonormalising after each pass, and the SVD is computed on the projection of `x`
/// onto the resulting subspace.
pub fn randomized_svd<F: Float, D: Data<Elem = F>, R: Rng>(
    x: &ArrayBase<D, Ix2>,
    rank: usize,
    oversample: usize,
    power: usize,
    rng: &mut R,
) -> Result<LowRankSvd<F>> {
    let (nrows, ncols) = x.dim();
    let max_rank = nrows.min(ncols);
    if rank == 0 || rank > max_rank {
        return Err(Error::Parameters(format!(
            "rank must be between 1 and {}, but is {}",
            max_rank, rank
        )));
    }
    let nsamples = (rank + oversample).min(max_rank);

    let sketch: Array2<f64> = Array::random_using((ncols, nsamples), StandardNormal, rng);
    subspace_svd(x, &sketch.mapv(F::cast), rank, power)
}

/// Truncated SVD by subspace iteration from a given starting subspace
///
/// `start` has shape `(n_cols, k)` with `rank <= k`. Started from the right singular vectors of
/// a nearby matrix, e.g. the previous iterate of an alternating method, the estimate only moves
/// as far as the matrix itself does.
pub fn subspace_svd<F: Float, D1: Data<Elem = F>, D2: Data<Elem = F>>(
    x: &ArrayBase<D1, Ix2>,
    start: &ArrayBase<D2, Ix2>,
    rank: usize,
    power: usize,
) -> Result<LowRankSvd<F>> {
    if start.nrows() != x.ncols() || start.ncols() < rank {
        return Err(Error::MismatchedShapes {
            expected: vec![x.ncols(), rank],
            actual: start.shape().to_vec(),
        });
    }

    let mut q = start.to_owned();
    for _ in 0..=power {
        let y = x.t().dot(&x.dot(&q));
        q = orthonormalize(&y)?;
    }

    factored_svd(&x.dot(&q), &q.t(), rank)
}

//! Common metrics for matrix decompositions
//!
//! This module implements comparison metrics between a recovered factorization and a known
//! ground truth. They are invariant to what the factorizations cannot identify: the scale of the
//! compared matrices, or the rotation and sign of a recovered basis.

use ndarray::{ArrayBase, Data, Ix2};

use crate::error::{Error, Result};
use crate::linalg::frobenius_norm as frobenius;
use crate::Float;

/// Decomposition metrics trait
pub trait Decomposition<F> {
    /// Frobenius norm of the difference, divided by the number of entries
    fn normalized_error<D: Data<Elem = F>>(&self, compare_to: &ArrayBase<D, Ix2>) -> Result<F>;

    /// Frobenius norm of the difference of both matrices after scaling each to unit norm
    fn normalized_difference<D: Data<Elem = F>>(
        &self,
        compare_to: &ArrayBase<D, Ix2>,
    ) -> Result<F>;

    /// Expressed variance of a recovered basis against a ground-truth basis
    ///
    /// For a recovered basis `L` and a ground truth `U` with covariance `C = U Uᵀ`, returns
    /// `1 - trace(Lᵀ C L) / trace(C)`. Zero means `L` spans exactly the subspace of `U`.
    ///
    /// ```
    /// use mvlearn::metrics::Decomposition;
    /// use ndarray::array;
    ///
    /// let truth = array![[1.0f64, 0.0], [0.0, 1.0], [0.0, 0.0]];
    /// // same subspace, rotated by 90 degrees
    /// let recovered = array![[0.0, -1.0], [1.0, 0.0], [0.0, 0.0]];
    ///
    /// assert!(recovered.expressed_variance(&truth).unwrap().abs() < 1e-12);
    /// ```
    fn expressed_variance<D: Data<Elem = F>>(&self, truth: &ArrayBase<D, Ix2>) -> Result<F>;
}

impl<F: Float, S: Data<Elem = F>> Decomposition<F> for ArrayBase<S, Ix2> {
    fn normalized_error<D: Data<Elem = F>>(&self, compare_to: &ArrayBase<D, Ix2>) -> Result<F> {
        check_shapes(self.shape(), compare_to.shape())?;

        let norm = frobenius(&(self - compare_to));
        Ok(norm / F::cast(self.len()))
    }

    fn normalized_difference<D: Data<Elem = F>>(
        &self,
        compare_to: &ArrayBase<D, Ix2>,
    ) -> Result<F> {
        check_shapes(self.shape(), compare_to.shape())?;

        let (norm_a, norm_b) = (frobenius(self), frobenius(compare_to));
        if norm_a == F::zero() || norm_b == F::zero() {
            return Err(Error::Parameters(
                "cannot normalise a matrix with zero norm".into(),
            ));
        }
        let diff = self.mapv(|x| x / norm_a) - compare_to.mapv(|x| x / norm_b);

        Ok(frobenius(&diff))
    }

    fn expressed_variance<D: Data<Elem = F>>(&self, truth: &ArrayBase<D, Ix2>) -> Result<F> {
        if self.nrows() != truth.nrows() {
            return Err(Error::MismatchedShapes {
                expected: vec![truth.nrows(), self.ncols()],
                actual: self.shape().to_vec(),
            });
        }

        // trace(Lᵀ U Uᵀ L) = ||Uᵀ L||², trace(U Uᵀ) = ||U||²
        let projected = frobenius(&truth.t().dot(self)).powi(2);
        let total = frobenius(truth).powi(2);

        Ok(F::one() - projected / total)
    }
}

fn check_shapes(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(Error::MismatchedShapes {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Decomposition;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_normalized_error() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[1.0, 2.0], [3.0, 6.0]];

        assert_abs_diff_eq!(a.normalized_error(&b).unwrap(), 0.5);
        assert_abs_diff_eq!(a.normalized_error(&a).unwrap(), 0.0);
    }

    #[test]
    fn test_normalized_difference_is_scale_free() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = a.mapv(|x| 10.0 * x);

        assert_abs_diff_eq!(a.normalized_difference(&b).unwrap(), 0.0, epsilon = 1e-12);
        assert!(a.normalized_difference(&Array2::zeros((2, 2))).is_err());
    }

    #[test]
    fn test_expressed_variance() {
        let truth = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]];
        let flipped = array![[-1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]];
        let half = array![[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [0.0, 0.0]];

        assert_abs_diff_eq!(flipped.expressed_variance(&truth).unwrap(), 0.0);
        assert_abs_diff_eq!(half.expressed_variance(&truth).unwrap(), 0.5);
    }

    #[test]
    fn test_mismatched_shapes() {
        let a = Array2::<f64>::zeros((3, 2));
        let b = Array2::<f64>::zeros((2, 3));

        assert!(a.normalized_error(&b).is_err());
        assert!(a.expressed_variance(&b).is_err());
    }
}

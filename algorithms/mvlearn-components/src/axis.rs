use mvlearn::Float;
use ndarray::{s, Array1, ArrayBase, Data, Ix1};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{ComponentsError, Result};

/// Signal axis with uniformly spaced points `offset + scale · i`
///
/// The samples of a binned axis are counts per bin, their integral is the plain sum. The samples
/// of a non-binned axis are values of a density, integrated with the composite Simpson rule.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformAxis<F> {
    offset: F,
    scale: F,
    size: usize,
    binned: bool,
}

impl<F: Float> UniformAxis<F> {
    /// Non-binned axis of `size` points starting at `offset`
    ///
    /// # Errors
    ///
    /// If `scale` is not positive and finite or `size` is zero
    pub fn new(offset: F, scale: F, size: usize) -> Result<Self> {
        if !(scale > F::zero() && scale.is_finite()) || size == 0 {
            return Err(ComponentsError::InvalidAxis {
                scale: scale.to_f32().unwrap_or(f32::NAN),
                size,
            });
        }
        Ok(UniformAxis {
            offset,
            scale,
            size,
            binned: false,
        })
    }

    pub fn binned(mut self, binned: bool) -> Self {
        self.binned = binned;
        self
    }

    pub fn offset(&self) -> F {
        self.offset
    }

    pub fn scale(&self) -> F {
        self.scale
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_binned(&self) -> bool {
        self.binned
    }

    pub fn low_value(&self) -> F {
        self.offset
    }

    pub fn high_value(&self) -> F {
        self.index_to_value(self.size - 1)
    }

    /// Coordinates of every point
    pub fn values(&self) -> Array1<F> {
        Array1::from_shape_fn(self.size, |i| self.index_to_value(i))
    }

    pub fn index_to_value(&self, index: usize) -> F {
        self.offset + self.scale * F::cast(index)
    }

    /// Index of the point closest to `value`
    ///
    /// # Errors
    ///
    /// If `value` lies outside of `[low_value, high_value]`
    pub fn value_to_index(&self, value: F) -> Result<usize> {
        let (low, high) = (self.low_value(), self.high_value());
        if !(value >= low && value <= high) {
            return Err(ComponentsError::OutOfAxis {
                value: value.to_f32().unwrap_or(f32::NAN),
                low: low.to_f32().unwrap_or(f32::NAN),
                high: high.to_f32().unwrap_or(f32::NAN),
            });
        }
        let index = ((value - self.offset) / self.scale).round();
        Ok(index.as_().min(self.size - 1))
    }

    /// Integral of samples taken on consecutive points of this axis
    pub fn integrate<D: Data<Elem = F>>(&self, samples: &ArrayBase<D, Ix1>) -> F {
        if self.binned {
            samples.sum()
        } else {
            simpson(samples, self.scale)
        }
    }
}

/// Composite Simpson rule for samples spaced by `h`
///
/// An even number of samples leaves one interval over, integrated by the three-point formula of
/// the last parabola. Two samples fall back to the trapezoid, fewer integrate to zero.
pub fn simpson<F: Float, D: Data<Elem = F>>(y: &ArrayBase<D, Ix1>, h: F) -> F {
    let n = y.len();
    let (two, three, four) = (F::cast(2.), F::cast(3.), F::cast(4.));
    match n {
        0 | 1 => F::zero(),
        2 => h * (y[0] + y[1]) / two,
        _ if n % 2 == 1 => {
            let inner = (1..n - 1)
                .map(|i| if i % 2 == 1 { four * y[i] } else { two * y[i] })
                .sum::<F>();
            h / three * (y[0] + y[n - 1] + inner)
        }
        _ => {
            let head = simpson(&y.slice(s![..n - 1]), h);
            let tail = F::cast(5.) * y[n - 1] + F::cast(8.) * y[n - 2] - y[n - 3];
            head + h * tail / F::cast(12.)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn index_value_conversion() {
        let axis = UniformAxis::new(100., 0.5, 11).unwrap();
        assert_abs_diff_eq!(axis.high_value(), 105.);
        assert_abs_diff_eq!(axis.index_to_value(3), 101.5);
        assert_eq!(axis.value_to_index(101.6).unwrap(), 3);
        assert_eq!(axis.value_to_index(101.8).unwrap(), 4);
        assert_eq!(axis.value_to_index(105.).unwrap(), 10);
        assert_eq!(axis.values().len(), 11);

        assert!(matches!(
            axis.value_to_index(99.),
            Err(ComponentsError::OutOfAxis { .. })
        ));
        assert!(axis.value_to_index(f64::NAN).is_err());
    }

    #[test]
    fn invalid_axes() {
        assert!(UniformAxis::new(0., 0., 10).is_err());
        assert!(UniformAxis::new(0., -1., 10).is_err());
        assert!(UniformAxis::new(0., 1., 0).is_err());
    }

    #[test]
    fn simpson_is_exact_for_quadratics() {
        // odd number of samples
        let y = Array1::from_shape_fn(5, |i| (i * i) as f64);
        assert_abs_diff_eq!(simpson(&y, 1.), 64. / 3., epsilon = 1e-12);

        // even number of samples
        let y = Array1::from_shape_fn(4, |i| (i * i) as f64);
        assert_abs_diff_eq!(simpson(&y, 1.), 9., epsilon = 1e-12);

        // scaled spacing: x = 0, 0.5, .., 2
        let y = Array1::from_shape_fn(5, |i| (i as f64 * 0.5).powi(2));
        assert_abs_diff_eq!(simpson(&y, 0.5), 8. / 3., epsilon = 1e-12);
    }

    #[test]
    fn short_sample_runs() {
        assert_abs_diff_eq!(simpson(&array![3.0], 1.), 0.);
        assert_abs_diff_eq!(simpson(&array![1.0, 3.0], 2.), 4.);
    }

    #[test]
    fn binned_axes_sum() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let axis = UniformAxis::new(0., 0.1, 4).unwrap();
        assert_abs_diff_eq!(axis.binned(true).integrate(&y), 10.);
        assert_abs_diff_eq!(axis.integrate(&y), 0.75, epsilon = 1e-12);
    }
}

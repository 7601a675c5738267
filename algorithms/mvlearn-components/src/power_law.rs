use mvlearn::{error::Error, linalg::nan_to_num, Float};
use ndarray::{s, Array1, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::axis::UniformAxis;
use crate::error::{ComponentsError, Result};

/// Power law `A · (x - origin)^(-r)`, zero up to and including `left_cutoff`
///
/// Models the decaying background of a spectrum, e.g. under the edges of an electron energy loss
/// spectrum. The free parameters are `A` and `r`, [`PowerLaw::estimate`] derives both from the
/// area of the spectrum in two adjacent windows.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw<F> {
    a: F,
    r: F,
    origin: F,
    left_cutoff: F,
}

impl<F: Float> Default for PowerLaw<F> {
    fn default() -> Self {
        PowerLaw::new(F::cast(1e6), F::cast(3.))
    }
}

impl<F: Float> PowerLaw<F> {
    /// Lower bound of `A`, it has no upper bound
    pub const A_MIN: f64 = 0.;
    /// Bounds of `r`
    pub const R_BOUNDS: (f64, f64) = (1., 5.);

    pub fn new(a: F, r: F) -> Self {
        PowerLaw {
            a,
            r,
            origin: F::zero(),
            left_cutoff: F::zero(),
        }
    }

    pub fn with_origin(mut self, origin: F) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_left_cutoff(mut self, left_cutoff: F) -> Self {
        self.left_cutoff = left_cutoff;
        self
    }

    pub fn a(&self) -> F {
        self.a
    }

    pub fn r(&self) -> F {
        self.r
    }

    pub fn origin(&self) -> F {
        self.origin
    }

    pub fn left_cutoff(&self) -> F {
        self.left_cutoff
    }

    pub fn set_a(&mut self, a: F) {
        self.a = a;
    }

    pub fn set_r(&mut self, r: F) {
        self.r = r;
    }

    pub fn is_within_bounds(&self) -> bool {
        let (r_min, r_max) = Self::R_BOUNDS;
        self.a >= F::cast(Self::A_MIN) && self.r >= F::cast(r_min) && self.r <= F::cast(r_max)
    }

    /// Move `A` and `r` to the closest values within their bounds
    pub fn clamp_to_bounds(&mut self) {
        let (r_min, r_max) = Self::R_BOUNDS;
        self.a = self.a.max(F::cast(Self::A_MIN));
        self.r = self.r.max(F::cast(r_min)).min(F::cast(r_max));
    }

    pub fn function<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Array1<F> {
        self.map_beyond_cutoff(x, |shifted| self.a * shifted.powf(-self.r))
    }

    /// Partial derivative with respect to `A`
    pub fn grad_a<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Array1<F> {
        self.map_beyond_cutoff(x, |shifted| shifted.powf(-self.r))
    }

    /// Partial derivative with respect to `r`
    pub fn grad_r<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Array1<F> {
        self.map_beyond_cutoff(x, |shifted| -self.a * shifted.ln() * shifted.powf(-self.r))
    }

    /// Partial derivative with respect to the origin
    pub fn grad_origin<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Array1<F> {
        self.map_beyond_cutoff(x, |shifted| {
            self.r * self.a * shifted.powf(-self.r - F::one())
        })
    }

    fn map_beyond_cutoff<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix1>,
        f: impl Fn(F) -> F,
    ) -> Array1<F> {
        x.mapv(|x| {
            if x > self.left_cutoff {
                f(x - self.origin)
            } else {
                F::zero()
            }
        })
    }

    /// Estimate `A` and `r` of every spectrum of a stack by the two-area method
    ///
    /// `spectra` has shape `(axis.size(), n_spectra)`, one spectrum per column. The areas `I1` and
    /// `I2` of the two windows give
    ///
    /// ```text
    /// r = 2 ln(I1 / I2 · (x4 - x3) / (x2 - x1)) / ln(x4 x3 / (x2 x1))
    /// ```
    ///
    /// and `A` the area weighted mean of the amplitudes matching either window. Non-finite
    /// estimates are replaced by [`nan_to_num`].
    ///
    /// Returns `Ok(None)` if a nonzero value is divided by zero or the logarithm of zero is taken
    /// for any spectrum, e.g. when only one of the windows is all zeros. A spectrum that is zero
    /// in both windows gives `NaN` which is reported as `A = r = 0`.
    ///
    /// # Errors
    ///
    /// If the window is invalid on this axis or the spectra do not have `axis.size()` channels
    pub fn estimate<D: Data<Elem = F>>(
        axis: &UniformAxis<F>,
        spectra: &ArrayBase<D, Ix2>,
        window: EstimationWindow<F>,
    ) -> Result<Option<PowerLawEstimate<F>>> {
        if spectra.nrows() != axis.size() {
            return Err(Error::MismatchedShapes {
                expected: vec![axis.size(), spectra.ncols()],
                actual: spectra.shape().to_vec(),
            }
            .into());
        }

        let indices = window.indices(axis)?;
        let [i1, i2, i3, i4] = indices;
        let x = indices.map(|i| axis.index_to_value(i));
        let size = axis.size();

        let mut a = Array1::zeros(spectra.ncols());
        let mut r = Array1::zeros(spectra.ncols());
        for (j, spectrum) in spectra.axis_iter(Axis(1)).enumerate() {
            let first = axis.integrate(&spectrum.slice(s![i1.min(size)..i2.min(size)]));
            let second = axis.integrate(&spectrum.slice(s![i3.min(size)..i4.min(size)]));

            match two_area_estimate(first, second, x) {
                Some((a_j, r_j)) => {
                    a[j] = a_j;
                    r[j] = r_j;
                }
                None => {
                    log::warn!(
                        "power law parameters could not be estimated, division by zero in \
                         spectrum {}",
                        j
                    );
                    return Ok(None);
                }
            }
        }

        Ok(Some(PowerLawEstimate { a, r }))
    }

    /// Estimate `A` and `r` from a single spectrum and store them
    ///
    /// Returns whether the estimation succeeded, the parameters are left unchanged otherwise.
    pub fn estimate_parameters<D: Data<Elem = F>>(
        &mut self,
        axis: &UniformAxis<F>,
        spectrum: &ArrayBase<D, Ix1>,
        window: EstimationWindow<F>,
    ) -> Result<bool> {
        let spectra = spectrum.view().insert_axis(Axis(1));
        match Self::estimate(axis, &spectra, window)? {
            Some(estimate) => {
                self.a = estimate.a[0];
                self.r = estimate.r[0];
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Estimated parameters of a stack of spectra, one entry per spectrum
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLawEstimate<F> {
    pub a: Array1<F>,
    pub r: Array1<F>,
}

/// Windows of the two-area estimation, in axis coordinates
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimationWindow<F> {
    /// `[x1, x2]` split into two halves of equal length
    Continuous { x1: F, x2: F },
    /// Two separate windows `[x1, x2]` and `[x3, x4]`
    Split { x1: F, x2: F, x3: F, x4: F },
}

impl<F: Float> EstimationWindow<F> {
    pub fn continuous(x1: F, x2: F) -> Self {
        EstimationWindow::Continuous { x1, x2 }
    }

    pub fn split(x1: F, x2: F, x3: F, x4: F) -> Self {
        EstimationWindow::Split { x1, x2, x3, x4 }
    }

    /// Axis indices `[i1, i2, i3, i4]`, the windows are `i1..i2` and `i3..i4`
    pub fn indices(&self, axis: &UniformAxis<F>) -> Result<[usize; 4]> {
        match *self {
            EstimationWindow::Continuous { x1, x2 } => {
                if x2 <= x1 {
                    return Err(ComponentsError::EmptyFirstWindow);
                }
                Ok(split_continuous(
                    axis.value_to_index(x1)?,
                    axis.value_to_index(x2)?,
                ))
            }
            EstimationWindow::Split { x1, x2, x3, x4 } => {
                if x2 <= x1 {
                    return Err(ComponentsError::EmptyFirstWindow);
                }
                if x3 < x2 {
                    return Err(ComponentsError::OverlappingWindows);
                }
                if x4 <= x3 {
                    return Err(ComponentsError::EmptySecondWindow);
                }
                let indices = [
                    axis.value_to_index(x1)?,
                    axis.value_to_index(x2)?,
                    axis.value_to_index(x3)?,
                    axis.value_to_index(x4)?,
                ];
                if indices[0] == indices[1] || indices[2] == indices[3] {
                    return Err(ComponentsError::TooFewPoints);
                }
                Ok(indices)
            }
        }
    }
}

/// Split `i1..i4` into two halves of the same number of points
///
/// The second window may end up to two points past the axis, such windows are truncated when
/// integrating.
fn split_continuous(i1: usize, mut i4: usize) -> [usize; 4] {
    if (i1 + i4) % 2 == 1 {
        i4 -= 1;
    }
    if i4 == i1 {
        i4 += 2;
    }
    let middle = (i1 + i4) / 2;
    [i1, middle, middle, i4]
}

/// `(A, r)` from the areas of the two windows, `None` on a division by zero
fn two_area_estimate<F: Float>(first: F, second: F, x: [F; 4]) -> Option<(F, F)> {
    let [x1, x2, x3, x4] = x;

    let area_ratio = checked_div(first, second)? * (x4 - x3) / (x2 - x1);
    let span = checked_div(x4 * x3, x2 * x1)?;
    let r = checked_div(F::cast(2.) * checked_ln(area_ratio)?, checked_ln(span)?)?;

    let k = F::one() - r;
    let a1 = checked_div(k * first, x2.powf(k) - x1.powf(k))?;
    let a2 = checked_div(k * second, x4.powf(k) - x3.powf(k))?;
    let a = checked_div(a1 * first + a2 * second, first + second)?;

    Some((nan_to_num(a), nan_to_num(r)))
}

/// Division that fails for a nonzero numerator over zero
///
/// `0 / 0` and `NaN / 0` give `NaN`, which is later replaced by [`nan_to_num`].
fn checked_div<F: Float>(numerator: F, denominator: F) -> Option<F> {
    if denominator == F::zero() && numerator != F::zero() && !numerator.is_nan() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// `ln(0)` diverges, a negative argument gives `NaN`
fn checked_ln<F: Float>(value: F) -> Option<F> {
    if value == F::zero() {
        None
    } else {
        Some(value.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Array2};

    fn synthetic(a: f64, r: f64) -> (UniformAxis<f64>, Array1<f64>) {
        let axis = UniformAxis::new(100., 1., 200).unwrap();
        let spectrum = PowerLaw::new(a, r).function(&axis.values());
        (axis, spectrum)
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<PowerLaw<f64>>();
        has_autotraits::<PowerLawEstimate<f64>>();
        has_autotraits::<EstimationWindow<f64>>();
        has_autotraits::<UniformAxis<f64>>();
    }

    #[test]
    fn evaluates_beyond_cutoff() {
        let x = array![1.0, 2.0, 4.0];
        let power_law = PowerLaw::new(8., 3.);
        assert_abs_diff_eq!(power_law.function(&x), array![8., 1., 0.125]);

        let power_law = power_law.with_left_cutoff(1.5);
        assert_abs_diff_eq!(power_law.function(&x), array![0., 1., 0.125]);
        assert_abs_diff_eq!(power_law.grad_r(&x)[0], 0.);

        let shifted = PowerLaw::new(8., 3.).with_origin(-1.);
        assert_abs_diff_eq!(shifted.function(&array![1.0]), array![1.]);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let x = array![2.0, 3.0, 5.0];
        let (a, r, origin) = (2.0, 2.5, 0.5);
        let h = 1e-6;
        let eval = |a, r, origin| PowerLaw::new(a, r).with_origin(origin).function(&x);
        let power_law = PowerLaw::new(a, r).with_origin(origin);

        let numeric = (eval(a + h, r, origin) - eval(a - h, r, origin)) / (2. * h);
        assert_abs_diff_eq!(power_law.grad_a(&x), numeric, epsilon = 1e-6);

        let numeric = (eval(a, r + h, origin) - eval(a, r - h, origin)) / (2. * h);
        assert_abs_diff_eq!(power_law.grad_r(&x), numeric, epsilon = 1e-6);

        let numeric = (eval(a, r, origin + h) - eval(a, r, origin - h)) / (2. * h);
        assert_abs_diff_eq!(power_law.grad_origin(&x), numeric, epsilon = 1e-6);
    }

    #[test]
    fn bounds() {
        let power_law = PowerLaw::<f64>::default();
        assert_abs_diff_eq!(power_law.a(), 1e6);
        assert_abs_diff_eq!(power_law.r(), 3.);
        assert!(power_law.is_within_bounds());

        let mut power_law = PowerLaw::new(-1., 7.);
        assert!(!power_law.is_within_bounds());
        power_law.clamp_to_bounds();
        assert_abs_diff_eq!(power_law.a(), 0.);
        assert_abs_diff_eq!(power_law.r(), 5.);
    }

    #[test]
    fn continuous_windows_have_equal_halves() {
        assert_eq!(split_continuous(2, 6), [2, 4, 4, 6]);
        // odd sum, the window shrinks by one point
        assert_eq!(split_continuous(0, 5), [0, 2, 2, 4]);
        // a window collapsing to a single point grows by two
        assert_eq!(split_continuous(0, 1), [0, 1, 1, 2]);
        assert_eq!(split_continuous(3, 3), [3, 4, 4, 5]);
    }

    #[test]
    fn estimates_from_continuous_window() {
        let (axis, spectrum) = synthetic(1e5, 3.);
        let mut power_law = PowerLaw::default();
        let window = EstimationWindow::continuous(120., 200.);

        assert_eq!(window.indices(&axis).unwrap(), [20, 60, 60, 100]);
        assert!(power_law
            .estimate_parameters(&axis, &spectrum, window)
            .unwrap());
        assert_abs_diff_eq!(power_law.r(), 3., epsilon = 0.05);
        assert!(power_law.a() > 0.9e5 && power_law.a() < 1.2e5);
    }

    #[test]
    fn estimates_from_split_windows() {
        let (axis, spectrum) = synthetic(1e5, 3.);
        let window = EstimationWindow::split(110., 150., 200., 290.);
        let mut power_law = PowerLaw::default();

        assert!(power_law
            .estimate_parameters(&axis, &spectrum, window)
            .unwrap());
        assert_abs_diff_eq!(power_law.r(), 3., epsilon = 0.05);
    }

    #[test]
    fn estimates_every_spectrum_of_a_stack() {
        let (axis, spectrum) = synthetic(1e5, 3.);
        let mut spectra = Array2::zeros((axis.size(), 2));
        spectra.column_mut(0).assign(&spectrum);
        spectra.column_mut(1).assign(&(&spectrum * 2.));

        let estimate =
            PowerLaw::estimate(&axis, &spectra, EstimationWindow::continuous(120., 200.))
                .unwrap()
                .unwrap();
        assert_relative_eq!(estimate.r[0], estimate.r[1], max_relative = 1e-9);
        assert_relative_eq!(estimate.a[1], 2. * estimate.a[0], max_relative = 1e-9);
    }

    #[test]
    fn zero_window_is_not_estimated() {
        let axis = UniformAxis::new(100., 1., 200).unwrap();
        let window = EstimationWindow::continuous(120., 180.);
        assert_eq!(window.indices(&axis).unwrap(), [20, 50, 50, 80]);

        // empty first window, ln(0)
        let mut spectrum = PowerLaw::new(1e5, 3.).function(&axis.values());
        spectrum.slice_mut(s![..50]).fill(0.);
        let mut power_law = PowerLaw::new(5., 2.);
        assert!(!power_law
            .estimate_parameters(&axis, &spectrum, window)
            .unwrap());
        assert_abs_diff_eq!(power_law.a(), 5.);
        assert_abs_diff_eq!(power_law.r(), 2.);

        // empty second window, I1 / 0
        let mut spectrum = PowerLaw::new(1e5, 3.).function(&axis.values());
        spectrum.slice_mut(s![50..]).fill(0.);
        assert!(!power_law
            .estimate_parameters(&axis, &spectrum, window)
            .unwrap());
        assert_abs_diff_eq!(power_law.a(), 5.);
        assert_abs_diff_eq!(power_law.r(), 2.);
    }

    #[test]
    fn zero_spectrum_in_stack_is_estimated_as_zero() {
        let (axis, spectrum) = synthetic(1e5, 3.);
        let window = EstimationWindow::continuous(120., 200.);
        let mut spectra = Array2::zeros((axis.size(), 2));
        spectra.column_mut(0).assign(&spectrum);

        let estimate = PowerLaw::estimate(&axis, &spectra, window)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(estimate.a[1], 0.);
        assert_abs_diff_eq!(estimate.r[1], 0.);

        let mut power_law = PowerLaw::default();
        assert!(power_law
            .estimate_parameters(&axis, &spectrum, window)
            .unwrap());
        assert_abs_diff_eq!(estimate.a[0], power_law.a());
        assert_abs_diff_eq!(estimate.r[0], power_law.r());
    }

    #[test]
    fn invalid_windows() {
        let (axis, spectrum) = synthetic(1e5, 3.);
        let mut power_law = PowerLaw::default();
        let mut estimate = |window| power_law.estimate_parameters(&axis, &spectrum, window);

        assert!(matches!(
            estimate(EstimationWindow::continuous(150., 120.)),
            Err(ComponentsError::EmptyFirstWindow)
        ));
        assert!(matches!(
            estimate(EstimationWindow::split(110., 150., 140., 290.)),
            Err(ComponentsError::OverlappingWindows)
        ));
        assert!(matches!(
            estimate(EstimationWindow::split(110., 150., 200., 200.)),
            Err(ComponentsError::EmptySecondWindow)
        ));
        assert!(matches!(
            estimate(EstimationWindow::split(110., 110.2, 200., 290.)),
            Err(ComponentsError::TooFewPoints)
        ));
        assert!(matches!(
            estimate(EstimationWindow::continuous(50., 120.)),
            Err(ComponentsError::OutOfAxis { .. })
        ));
    }

    #[test]
    fn spectra_must_match_axis() {
        let axis = UniformAxis::new(100., 1., 200).unwrap();
        let spectra = Array2::<f64>::ones((150, 3));
        assert!(matches!(
            PowerLaw::estimate(&axis, &spectra, EstimationWindow::continuous(120., 200.)),
            Err(ComponentsError::MvlearnError(Error::MismatchedShapes { .. }))
        ));
    }
}

use std::f64::consts::PI;

use mvlearn::{error::Error, Float};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::axis::UniformAxis;
use crate::error::{ComponentsError, Result};

/// Asymmetric pseudo-Voigt peak of area `A`
///
/// Left of `centre` the peak is the pseudo-Voigt of width `sigma1`, right of it the one of width
/// `sigma2`:
///
/// ```text
/// pV(x, σ) = (1 - η) A / (√(2π) σ̄) exp(-(x - centre)² / (2σ²))
///          + η A / (π σ̄ (1 + ((x - centre) / σ)²))
/// ```
///
/// with `σ̄ = (sigma1 + sigma2) / 2` and the Lorentzian weight `η = fraction`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitVoigt<F> {
    a: F,
    sigma1: F,
    sigma2: F,
    centre: F,
    fraction: F,
}

impl<F: Float> Default for SplitVoigt<F> {
    fn default() -> Self {
        SplitVoigt::new(F::one(), F::one(), F::one(), F::zero())
    }
}

impl<F: Float> SplitVoigt<F> {
    pub const A_BOUNDS: (f64, f64) = (1e-8, 1e8);
    /// Bounds of both widths
    pub const SIGMA_BOUNDS: (f64, f64) = (1e-8, 50.);
    pub const FRACTION_BOUNDS: (f64, f64) = (1e-8, 1.);

    /// Gaussian peak, the Lorentzian fraction is zero
    pub fn new(a: F, sigma1: F, sigma2: F, centre: F) -> Self {
        SplitVoigt {
            a,
            sigma1,
            sigma2,
            centre,
            fraction: F::zero(),
        }
    }

    pub fn with_fraction(mut self, fraction: F) -> Self {
        self.fraction = fraction;
        self
    }

    pub fn a(&self) -> F {
        self.a
    }

    pub fn sigma1(&self) -> F {
        self.sigma1
    }

    pub fn sigma2(&self) -> F {
        self.sigma2
    }

    pub fn centre(&self) -> F {
        self.centre
    }

    pub fn fraction(&self) -> F {
        self.fraction
    }

    pub fn set_a(&mut self, a: F) {
        self.a = a;
    }

    pub fn set_sigmas(&mut self, sigma1: F, sigma2: F) {
        self.sigma1 = sigma1;
        self.sigma2 = sigma2;
    }

    pub fn set_centre(&mut self, centre: F) {
        self.centre = centre;
    }

    pub fn set_fraction(&mut self, fraction: F) {
        self.fraction = fraction;
    }

    /// Mean width `σ̄` of the two sides
    pub fn mean_sigma(&self) -> F {
        (self.sigma1 + self.sigma2) * F::cast(0.5)
    }

    /// Height of the Gaussian peak of the same area, `A / (√(2π) σ̄)`
    pub fn height(&self) -> F {
        self.a / (self.mean_sigma() * sqrt_two_pi())
    }

    /// Set `A` such that [`SplitVoigt::height`] returns `height`
    pub fn set_height(&mut self, height: F) {
        self.a = height * self.mean_sigma() * sqrt_two_pi();
    }

    pub fn is_within_bounds(&self) -> bool {
        let within = |v: F, (low, high): (f64, f64)| v >= F::cast(low) && v <= F::cast(high);
        within(self.a, Self::A_BOUNDS)
            && within(self.sigma1, Self::SIGMA_BOUNDS)
            && within(self.sigma2, Self::SIGMA_BOUNDS)
            && within(self.fraction, Self::FRACTION_BOUNDS)
    }

    /// Move every bounded parameter to the closest value within its bounds
    pub fn clamp_to_bounds(&mut self) {
        let clamp = |v: F, (low, high): (f64, f64)| v.max(F::cast(low)).min(F::cast(high));
        self.a = clamp(self.a, Self::A_BOUNDS);
        self.sigma1 = clamp(self.sigma1, Self::SIGMA_BOUNDS);
        self.sigma2 = clamp(self.sigma2, Self::SIGMA_BOUNDS);
        self.fraction = clamp(self.fraction, Self::FRACTION_BOUNDS);
    }

    pub fn function<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix1>) -> Array1<F> {
        x.mapv(|x| self.value(x))
    }

    /// Evaluate a collection of peaks on the same points
    ///
    /// Returns an array of shape `(x.len(), peaks.len())` with one column per peak.
    pub fn function_nd<D: Data<Elem = F>>(x: &ArrayBase<D, Ix1>, peaks: &[Self]) -> Array2<F> {
        Array2::from_shape_fn((x.len(), peaks.len()), |(i, j)| peaks[j].value(x[i]))
    }

    fn value(&self, x: F) -> F {
        let arg = x - self.centre;
        let sigma = if x <= self.centre {
            self.sigma1
        } else {
            self.sigma2
        };
        let mean_sigma = self.mean_sigma();

        let lorentz = self.a / (F::one() + (arg / sigma).powi(2)) / (F::cast(PI) * mean_sigma);
        let gauss = self.a / (sqrt_two_pi::<F>() * mean_sigma)
            * (-(arg * arg) / (F::cast(2.) * sigma * sigma)).exp();

        (F::one() - self.fraction) * gauss + self.fraction * lorentz
    }

    /// Estimate `A`, the width and the centre of every spectrum of a stack from its moments
    ///
    /// `spectra` has shape `(axis.size(), n_spectra)`, one spectrum per column. Over the channels
    /// `i1..i2` of the window
    ///
    /// ```text
    /// centre = Σ x d / Σ d
    /// sigma  = √|Σ (x - centre)² d / Σ d|
    /// A      = max(d) · sigma · √(2π)
    /// ```
    ///
    /// The amplitude of a binned axis is divided by the axis scale. The window limits may be
    /// given in any order. A spectrum without signal in the window gives non-finite estimates.
    ///
    /// # Errors
    ///
    /// If a limit is outside of the axis, the window contains no channel or the spectra do not
    /// have `axis.size()` channels
    pub fn estimate<D: Data<Elem = F>>(
        axis: &UniformAxis<F>,
        spectra: &ArrayBase<D, Ix2>,
        x1: F,
        x2: F,
    ) -> Result<SplitVoigtEstimate<F>> {
        if spectra.nrows() != axis.size() {
            return Err(Error::MismatchedShapes {
                expected: vec![axis.size(), spectra.ncols()],
                actual: spectra.shape().to_vec(),
            }
            .into());
        }

        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        let (i1, i2) = (axis.value_to_index(x1)?, axis.value_to_index(x2)?);
        if i1 == i2 {
            return Err(ComponentsError::TooFewPoints);
        }

        let x = axis.values().slice_move(s![i1..i2]);
        let window = spectra.slice(s![i1..i2, ..]);
        let scaling = if axis.is_binned() {
            axis.scale()
        } else {
            F::one()
        };

        let mut a = Array1::zeros(spectra.ncols());
        let mut sigma = Array1::zeros(spectra.ncols());
        let mut centre = Array1::zeros(spectra.ncols());
        for (j, d) in window.axis_iter(Axis(1)).enumerate() {
            let total = d.sum();
            let mean = x.dot(&d) / total;
            let width = ((&x - mean).mapv(|v| v * v).dot(&d) / total).abs().sqrt();
            let height = d.fold(F::neg_infinity(), |max, &v| max.max(v));

            if !(mean.is_finite() && width.is_finite()) {
                log::warn!("split voigt moments of spectrum {} are not finite", j);
            }
            centre[j] = mean;
            sigma[j] = width;
            a[j] = height * width * sqrt_two_pi() / scaling;
        }

        Ok(SplitVoigtEstimate { a, sigma, centre })
    }

    /// Estimate the parameters from a single spectrum and store them
    ///
    /// Both widths are set to the estimated width, the Lorentzian fraction is kept. Returns
    /// whether the estimate was finite, the parameters are left unchanged otherwise.
    pub fn estimate_parameters<D: Data<Elem = F>>(
        &mut self,
        axis: &UniformAxis<F>,
        spectrum: &ArrayBase<D, Ix1>,
        x1: F,
        x2: F,
    ) -> Result<bool> {
        let spectra = spectrum.view().insert_axis(Axis(1));
        let estimate = Self::estimate(axis, &spectra, x1, x2)?;
        let (a, sigma, centre) = (estimate.a[0], estimate.sigma[0], estimate.centre[0]);

        if !(a.is_finite() && sigma.is_finite() && centre.is_finite()) {
            return Ok(false);
        }
        self.a = a;
        self.sigma1 = sigma;
        self.sigma2 = sigma;
        self.centre = centre;
        Ok(true)
    }
}

/// Estimated parameters of a stack of spectra, one entry per spectrum
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SplitVoigtEstimate<F> {
    pub a: Array1<F>,
    pub sigma: Array1<F>,
    pub centre: Array1<F>,
}

fn sqrt_two_pi<F: Float>() -> F {
    F::cast((2. * PI).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn axis() -> UniformAxis<f64> {
        UniformAxis::new(-10., 0.01, 2000).unwrap()
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<SplitVoigt<f64>>();
        has_autotraits::<SplitVoigtEstimate<f32>>();
    }

    #[test]
    fn peak_value_at_centre() {
        let mut peak = SplitVoigt::new(3., 0.5, 1.5, 2.);
        let centre = Array1::from(vec![2.]);
        assert_relative_eq!(peak.function(&centre)[0], peak.height(), max_relative = 1e-12);

        peak.set_fraction(1.);
        assert_relative_eq!(
            peak.function(&centre)[0],
            3. / (PI * peak.mean_sigma()),
            max_relative = 1e-12
        );
    }

    #[test]
    fn sides_use_their_own_width() {
        let peak = SplitVoigt::new(1., 1., 2., 0.).with_fraction(0.3);
        let f = peak.function(&Array1::from(vec![-1., 2., -2., 1.]));

        assert_relative_eq!(f[0], f[1], max_relative = 1e-12);
        assert!(f[2] < f[3]);
    }

    #[test]
    fn height_setter_scales_area() {
        let mut peak = SplitVoigt::new(1., 1., 3., 0.);
        peak.set_height(2.);
        assert_relative_eq!(peak.a(), 2. * 2. * (2. * PI).sqrt(), max_relative = 1e-12);
        assert_relative_eq!(peak.height(), 2., max_relative = 1e-12);
    }

    #[test]
    fn evaluates_several_peaks() {
        let x = Array1::linspace(-3., 3., 13);
        let peaks = [
            SplitVoigt::default(),
            SplitVoigt::new(2., 0.5, 1., 1.).with_fraction(0.5),
        ];

        let f = SplitVoigt::function_nd(&x, &peaks);
        assert_eq!(f.dim(), (13, 2));
        assert_abs_diff_eq!(f.column(0), peaks[0].function(&x), epsilon = 1e-14);
        assert_abs_diff_eq!(f.column(1), peaks[1].function(&x), epsilon = 1e-14);
    }

    #[test]
    fn bounds() {
        let mut peak = SplitVoigt::new(0., 60., 1., 0.).with_fraction(2.);
        assert!(!peak.is_within_bounds());

        peak.clamp_to_bounds();
        assert!(peak.is_within_bounds());
        assert_abs_diff_eq!(peak.a(), 1e-8);
        assert_abs_diff_eq!(peak.sigma1(), 50.);
        assert_abs_diff_eq!(peak.fraction(), 1.);
        assert_abs_diff_eq!(peak.centre(), 0.);
    }

    #[test]
    fn estimates_gaussian_moments() {
        let axis = axis();
        let spectrum = SplitVoigt::default().function(&axis.values());

        let mut peak = SplitVoigt::new(5., 3., 4., 2.).with_fraction(0.2);
        assert!(peak.estimate_parameters(&axis, &spectrum, -10., 9.99).unwrap());
        assert_abs_diff_eq!(peak.centre(), 0., epsilon = 1e-6);
        assert_abs_diff_eq!(peak.sigma1(), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(peak.sigma2(), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(peak.a(), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(peak.fraction(), 0.2);

        // reversed limits
        let mut reversed = SplitVoigt::default();
        assert!(reversed
            .estimate_parameters(&axis, &spectrum, 9.99, -10.)
            .unwrap());
        assert_abs_diff_eq!(reversed.a(), peak.a(), epsilon = 1e-12);
    }

    #[test]
    fn binned_amplitude_is_per_unit_scale() {
        let axis = axis().binned(true);
        let counts = SplitVoigt::default().function(&axis.values()) * axis.scale();

        let mut peak = SplitVoigt::default();
        assert!(peak.estimate_parameters(&axis, &counts, -10., 9.99).unwrap());
        assert_abs_diff_eq!(peak.a(), 1., epsilon = 1e-6);
        assert_abs_diff_eq!(peak.sigma1(), 1., epsilon = 1e-6);
    }

    #[test]
    fn estimates_every_spectrum_of_a_stack() {
        let axis = axis();
        let peaks = [SplitVoigt::default(), SplitVoigt::new(2., 0.5, 0.5, 1.5)];
        let spectra = SplitVoigt::function_nd(&axis.values(), &peaks);

        let estimate = SplitVoigt::estimate(&axis, &spectra, -10., 9.99).unwrap();
        assert_abs_diff_eq!(estimate.centre, Array1::from(vec![0., 1.5]), epsilon = 1e-6);
        assert_abs_diff_eq!(estimate.sigma, Array1::from(vec![1., 0.5]), epsilon = 1e-6);
        assert_abs_diff_eq!(estimate.a, Array1::from(vec![1., 2.]), epsilon = 1e-6);
    }

    #[test]
    fn empty_spectrum_is_not_estimated() {
        let axis = axis();
        let spectrum = Array1::zeros(axis.size());

        let mut peak = SplitVoigt::new(5., 2., 3., 1.);
        assert!(!peak.estimate_parameters(&axis, &spectrum, -5., 5.).unwrap());
        assert_eq!(peak, SplitVoigt::new(5., 2., 3., 1.));
    }

    #[test]
    fn invalid_windows() {
        let axis = axis();
        let spectrum = SplitVoigt::default().function(&axis.values());
        let mut peak = SplitVoigt::default();

        assert!(matches!(
            peak.estimate_parameters(&axis, &spectrum, 1., 1.001),
            Err(ComponentsError::TooFewPoints)
        ));
        assert!(matches!(
            peak.estimate_parameters(&axis, &spectrum, -10., 10.5),
            Err(ComponentsError::OutOfAxis { .. })
        ));
        assert!(matches!(
            SplitVoigt::estimate(&axis, &Array2::zeros((10, 2)), -1., 1.),
            Err(ComponentsError::MvlearnError(_))
        ));
    }
}

use mvlearn::{
    error::Error,
    linalg::{nan_to_num, safe_div},
    traits::Fit,
    Float,
};
use ndarray::{Array1, Array2, Axis};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::hyperparams::{McrValidParams, Simplicity};
use crate::error::{McrError, Result};
use crate::learning_results::LearningResults;
use crate::mcr_ar::StopReason;
use crate::orthomax::varimax;

/// Multivariate curve resolution of a decomposition
///
/// The components of a decomposition, e.g. a PCA or a robust PCA, span the right subspace but are
/// abstract: orthogonal, with negative entries and in arbitrary orientation. Curve resolution
/// turns them into physically interpretable, non-negative components by
///
/// 1. rotating the selected components with varimax to make either the loadings
///    ([`Simplicity::Spatial`]) or the factors ([`Simplicity::Spectral`]) as simple as possible,
/// 2. flipping every rotated factor so that it is mostly positive and clipping the rest to zero,
/// 3. refitting the data with the alternating regression of [`McrAr`](crate::McrAr), starting
///    from the rotated factors,
/// 4. scaling every resolved factor and loading to unit sum.
///
/// If the decomposition was computed on Poissonian-normalized data, the fit is done in the
/// normalized space and the weights are removed afterwards.
///
/// ## Example
///
/// ```rust
/// use mvlearn::traits::Fit;
/// use mvlearn_mcr::{DecompositionResults, Mcr, Simplicity};
/// use ndarray::array;
///
/// // three pixels mixing two pure spectra of four channels
/// let spectra = array![[1.0, 0.0], [2.0, 0.0], [0.0, 3.0], [0.0, 1.0]];
/// let maps = array![[1.0, 0.0], [0.6, 0.4], [0.0, 1.0]];
/// let data = maps.dot(&spectra.t());
///
/// let results = DecompositionResults::from_matrices(data.clone(), &spectra, &maps);
/// let mcr = Mcr::params()
///     .simplicity(Simplicity::Spectral)
///     .number_of_components(2)
///     .fit(&results)
///     .unwrap();
///
/// assert_eq!(mcr.factors().dim(), (4, 2));
/// assert_eq!(mcr.loadings().dim(), (3, 2));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Mcr<F> {
    factors: Array2<F>,
    loadings: Array2<F>,
    components: Vec<usize>,
    rotation: Array2<F>,
    n_iter: usize,
    stop_reason: StopReason,
}

impl<F: Float, L: LearningResults<F>> Fit<L, McrError> for McrValidParams<F> {
    type Object = Mcr<F>;

    /// Resolve the components of the decomposition
    ///
    /// # Errors
    ///
    /// * if the factors do not have exactly one navigation axis with at least two components
    /// * if no components were selected and the decomposition has no output dimension
    /// * if a selected component, the mask, the data or the weights do not match the
    ///   decomposition
    fn fit(&self, results: &L) -> Result<Self::Object> {
        let factors = results.factors();
        let loadings = results.loadings();

        if factors.navigation_dimension() != 1 {
            return Err(McrError::NavigationDimension(
                factors.navigation_dimension(),
            ));
        }
        let available = factors.navigation_size();
        if available < 2 {
            return Err(McrError::NavigationSize(available));
        }
        if loadings.navigation_size() != available {
            return Err(Error::MismatchedShapes {
                expected: vec![available],
                actual: loadings.navigation_shape().to_vec(),
            }
            .into());
        }

        let components = self.select_components(results.output_dimension(), available)?;

        let (n_channels, n_pixels) = (factors.signal_size(), loadings.signal_size());
        let data = results.data();
        if data.dim() != (n_pixels, n_channels) {
            return Err(Error::MismatchedShapes {
                expected: vec![n_pixels, n_channels],
                actual: data.shape().to_vec(),
            }
            .into());
        }

        let channels = match self.mask() {
            Some(mask) => {
                if mask.shape() != factors.signal_shape() {
                    return Err(McrError::MaskShape {
                        expected: factors.signal_shape().to_vec(),
                        actual: mask.shape().to_vec(),
                    });
                }
                let channels: Vec<usize> = mask
                    .iter()
                    .enumerate()
                    .filter(|(_, masked)| !**masked)
                    .map(|(channel, _)| channel)
                    .collect();
                if channels.is_empty() {
                    return Err(McrError::AllMasked);
                }
                channels
            }
            None => (0..n_channels).collect(),
        };

        let weights = match results.poissonian_weights() {
            Some(weights) => {
                if weights.spectral.len() != n_channels || weights.spatial.len() != n_pixels {
                    return Err(Error::MismatchedShapes {
                        expected: vec![n_channels, n_pixels],
                        actual: vec![weights.spectral.len(), weights.spatial.len()],
                    }
                    .into());
                }
                Some((
                    weights.spectral.select(Axis(0), &channels),
                    weights.spatial.to_owned(),
                ))
            }
            None => None,
        };

        // one component per column
        let factors = factors
            .unfold()?
            .select(Axis(0), &components)
            .reversed_axes()
            .select(Axis(0), &channels);
        let loadings = loadings
            .unfold()?
            .select(Axis(0), &components)
            .reversed_axes();
        let mut data = data.select(Axis(1), &channels);

        log::debug!(
            "resolving {} components with {} simplicity on {} channels",
            components.len(),
            self.simplicity(),
            channels.len()
        );

        let (rotated, rotation) = match self.simplicity() {
            Simplicity::Spatial => {
                let (_, rotation) = varimax(&loadings)?;
                (factors.dot(&rotation), rotation)
            }
            Simplicity::Spectral => varimax(&factors)?,
        };
        let mut rotated = flip_and_clip(rotated);

        if let Some((spectral, spatial)) = &weights {
            for (mut row, weight) in rotated.axis_iter_mut(Axis(0)).zip(spectral.iter()) {
                row.mapv_inplace(|v| nan_to_num(v / *weight));
            }
            for ((pixel, channel), v) in data.indexed_iter_mut() {
                *v = nan_to_num(*v / spatial[pixel] / spectral[channel]);
            }
        }

        let (mut resolved_factors, mut resolved_loadings, fit) = match self.simplicity() {
            Simplicity::Spatial => {
                let fit = self.mcr_ar().fit_with_c(&data.t(), &rotated)?;
                (fit.c().to_owned(), fit.st().t().to_owned(), fit)
            }
            Simplicity::Spectral => {
                let fit = self.mcr_ar().fit_with_st(&data, &rotated.t())?;
                (fit.st().t().to_owned(), fit.c().to_owned(), fit)
            }
        };
        log::info!(
            "MCR fit after {} iterations ({}), mean squared error {:?}",
            fit.n_iter(),
            fit.stop_reason(),
            fit.errors().last()
        );

        if let Some((spectral, spatial)) = &weights {
            scale_rows(&mut resolved_factors, spectral);
            scale_rows(&mut resolved_loadings, spatial);
        }
        normalize_columns(&mut resolved_factors);
        normalize_columns(&mut resolved_loadings);

        let mut factors = Array2::zeros((n_channels, components.len()));
        for (row, &channel) in resolved_factors.rows().into_iter().zip(channels.iter()) {
            factors.row_mut(channel).assign(&row);
        }

        Ok(Mcr {
            factors,
            loadings: resolved_loadings,
            components,
            rotation,
            n_iter: fit.n_iter(),
            stop_reason: fit.stop_reason(),
        })
    }
}

impl<F: Float> McrValidParams<F> {
    fn select_components(
        &self,
        output_dimension: Option<usize>,
        available: usize,
    ) -> Result<Vec<usize>> {
        let components: Vec<usize> = match (self.number_of_components(), self.component_list()) {
            (Some(n), _) => (0..n).collect(),
            (None, Some(list)) => list.to_vec(),
            (None, None) => match output_dimension {
                Some(n) => (0..n).collect(),
                None => return Err(McrError::NoComponents),
            },
        };

        if components.is_empty() {
            return Err(McrError::NoComponents);
        }
        if let Some(&index) = components.iter().find(|&&index| index >= available) {
            return Err(McrError::ComponentOutOfRange { index, available });
        }

        Ok(components)
    }
}

/// Make every column mostly positive, then clip the negative entries
fn flip_and_clip<F: Float>(mut x: Array2<F>) -> Array2<F> {
    for mut column in x.axis_iter_mut(Axis(1)) {
        let total = column.sum();
        let sign = if total > F::zero() {
            F::one()
        } else if total < F::zero() {
            -F::one()
        } else {
            F::zero()
        };
        column.mapv_inplace(|v| (v * sign).max(F::zero()));
    }
    x
}

fn scale_rows<F: Float>(x: &mut Array2<F>, weights: &Array1<F>) {
    for (mut row, weight) in x.axis_iter_mut(Axis(0)).zip(weights.iter()) {
        row *= *weight;
    }
}

fn normalize_columns<F: Float>(x: &mut Array2<F>) {
    for mut column in x.axis_iter_mut(Axis(1)) {
        let total = column.sum();
        column.mapv_inplace(|v| safe_div(v, total));
    }
}

impl<F: Float> Mcr<F> {
    /// Resolved spectral components, shape `(n_channels, k)`, every column sums to one
    ///
    /// Masked channels are zero.
    pub fn factors(&self) -> &Array2<F> {
        &self.factors
    }

    /// Resolved spatial components, shape `(n_pixels, k)`, every column sums to one
    pub fn loadings(&self) -> &Array2<F> {
        &self.loadings
    }

    /// Indices of the resolved components in the decomposition
    pub fn components(&self) -> &[usize] {
        &self.components
    }

    /// The varimax rotation applied before the fit, shape `(k, k)`
    pub fn rotation(&self) -> &Array2<F> {
        &self.rotation
    }

    /// Iterations of the alternating regression
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentStack, Constraint, DecompositionResults, PoissonianWeights};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array3};

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Mcr<f64>>();
        has_autotraits::<McrValidParams<f64>>();
        has_autotraits::<DecompositionResults<f64>>();
    }

    const N_CHANNELS: usize = 40;

    /// Two peaks with disjoint support and different widths, as columns
    fn peaks() -> Array2<f64> {
        Array2::from_shape_fn((N_CHANNELS, 2), |(channel, k)| {
            let x = channel as f64;
            match k {
                0 if (x - 10.).abs() <= 6. => (-(x - 10.).powi(2) / 8.).exp(),
                1 if (x - 28.).abs() <= 9. => 0.6 * (-(x - 28.).powi(2) / 18.).exp(),
                _ => 0.,
            }
        })
    }

    /// Orthonormal basis of the peaks, mixed by a rotation
    fn mixed_factors(spectra: &Array2<f64>) -> Array2<f64> {
        let norms = spectra.mapv(|v| v * v).sum_axis(Axis(0)).mapv(f64::sqrt);
        let (sin, cos) = 25f64.to_radians().sin_cos();
        (spectra / &norms).dot(&array![[cos, -sin], [sin, cos]])
    }

    fn unit_sum(x: &Array2<f64>) -> Array2<f64> {
        x / &x.sum_axis(Axis(0))
    }

    #[test]
    fn spectral_simplicity_recovers_disjoint_peaks() {
        let spectra = peaks();
        let maps = Array2::from_shape_fn((25, 2), |(pixel, k)| {
            let c = 0.2 + 0.6 * pixel as f64 / 24.;
            if k == 0 {
                c
            } else {
                1. - c
            }
        });
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);
        let results = DecompositionResults::from_matrices(data, &factors, &loadings);

        let mcr = Mcr::params()
            .simplicity(Simplicity::Spectral)
            .number_of_components(2)
            .c_constraints(vec![Constraint::NonNegative])
            .fit(&results)
            .unwrap();

        assert_abs_diff_eq!(mcr.factors(), &unit_sum(&spectra), epsilon = 1e-4);
        assert_abs_diff_eq!(mcr.loadings(), &unit_sum(&maps), epsilon = 1e-4);
        assert_abs_diff_eq!(
            mcr.rotation().t().dot(mcr.rotation()),
            Array2::eye(2),
            epsilon = 1e-10
        );
    }

    #[test]
    fn spatial_simplicity_recovers_disjoint_maps() {
        let spectra = peaks();
        let maps = Array2::from_shape_fn((30, 2), |(pixel, k)| match (k, pixel < 12) {
            (0, true) => 1. + 0.1 * pixel as f64,
            (1, false) => 2. - 0.05 * (pixel - 12) as f64,
            _ => 0.,
        });
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);
        let results =
            DecompositionResults::from_matrices(data, &factors, &loadings).with_output_dimension(2);

        let mcr = Mcr::params()
            .c_constraints(vec![Constraint::NonNegative])
            .fit(&results)
            .unwrap();

        assert_eq!(mcr.components(), &[0, 1]);
        assert_abs_diff_eq!(mcr.factors(), &unit_sum(&spectra), epsilon = 1e-6);
        assert_abs_diff_eq!(mcr.loadings(), &unit_sum(&maps), epsilon = 1e-6);
    }

    #[test]
    fn default_constraints_give_unit_sums() {
        let spectra = peaks();
        let maps = Array2::from_shape_fn((20, 2), |(pixel, k)| {
            let c = (pixel as f64 / 19.).powi(2);
            if k == 0 {
                c
            } else {
                1. - c
            }
        });
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);
        let results = DecompositionResults::from_matrices(data, &factors, &loadings);

        for simplicity in &[Simplicity::Spatial, Simplicity::Spectral] {
            let mcr = Mcr::params()
                .simplicity(*simplicity)
                .number_of_components(2)
                .fit(&results)
                .unwrap();

            assert!(mcr.factors().iter().all(|v| *v >= 0.));
            assert!(mcr.loadings().iter().all(|v| *v >= 0.));
            assert_abs_diff_eq!(
                mcr.factors().sum_axis(Axis(0)),
                Array1::ones(2),
                epsilon = 1e-10
            );
            assert_abs_diff_eq!(
                mcr.loadings().sum_axis(Axis(0)),
                Array1::ones(2),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn masked_channels_are_zero() {
        let spectra = peaks();
        let maps = array![[1.0, 0.0], [0.7, 0.3], [0.4, 0.6], [0.1, 0.9], [0.0, 1.0]];
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);
        let results = DecompositionResults::from_matrices(data, &factors, &loadings);

        let mask = Array1::from_shape_fn(N_CHANNELS, |channel| channel == 10 || channel == 30);
        let mcr = Mcr::params()
            .simplicity(Simplicity::Spectral)
            .number_of_components(2)
            .mask(mask)
            .fit(&results)
            .unwrap();

        for channel in &[10, 30] {
            assert_abs_diff_eq!(mcr.factors().row(*channel), Array1::zeros(2));
        }
        assert_abs_diff_eq!(
            mcr.factors().sum_axis(Axis(0)),
            Array1::ones(2),
            epsilon = 1e-10
        );
    }

    #[test]
    fn poissonian_weights_are_removed() {
        let spectra = peaks();
        let maps = Array2::from_shape_fn((25, 2), |(pixel, k)| {
            let c = 0.1 + 0.8 * pixel as f64 / 24.;
            if k == 0 {
                c
            } else {
                1. - c
            }
        });
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);

        let weights = PoissonianWeights {
            spectral: Array1::from_shape_fn(N_CHANNELS, |c| 1. + 0.02 * c as f64),
            spatial: Array1::from_shape_fn(25, |p| 2. - 0.03 * p as f64),
        };
        let results = DecompositionResults::from_matrices(data, &factors, &loadings)
            .with_poissonian_weights(weights);

        let mcr = Mcr::params()
            .simplicity(Simplicity::Spectral)
            .number_of_components(2)
            .c_constraints(vec![Constraint::NonNegative])
            .fit(&results)
            .unwrap();

        assert_abs_diff_eq!(mcr.factors(), &unit_sum(&spectra), epsilon = 1e-4);
        assert_abs_diff_eq!(mcr.loadings(), &unit_sum(&maps), epsilon = 1e-4);
    }

    #[test]
    fn selects_listed_components() {
        let spectra = peaks();
        let maps = array![[1.0, 0.0], [0.5, 0.5], [0.0, 1.0], [0.2, 0.8]];
        let data = maps.dot(&spectra.t());
        // a third, irrelevant component in front
        let mut factors = Array2::zeros((N_CHANNELS, 3));
        factors.slice_mut(ndarray::s![.., 1..]).assign(&mixed_factors(&spectra));
        factors[[0, 0]] = 1.;
        let loadings = data.dot(&factors);
        let results = DecompositionResults::from_matrices(data, &factors, &loadings);

        let mcr = Mcr::params()
            .simplicity(Simplicity::Spectral)
            .component_list(vec![1, 2])
            .fit(&results)
            .unwrap();
        assert_eq!(mcr.components(), &[1, 2]);
        assert_eq!(mcr.factors().dim(), (N_CHANNELS, 2));

        let err = Mcr::params()
            .component_list(vec![0, 3])
            .fit(&results)
            .unwrap_err();
        assert!(matches!(
            err,
            McrError::ComponentOutOfRange {
                index: 3,
                available: 3
            }
        ));
    }

    #[test]
    fn invalid_decompositions() {
        let data = Array2::<f64>::ones((6, 4));

        // two navigation axes
        let factors = ComponentStack::new(Array3::<f64>::ones((2, 2, 4)), 2).unwrap();
        let loadings = ComponentStack::new(Array3::<f64>::ones((2, 2, 6)), 2).unwrap();
        let results = DecompositionResults::new(data.clone(), factors, loadings);
        let err = Mcr::params().number_of_components(2).fit(&results).unwrap_err();
        assert!(matches!(err, McrError::NavigationDimension(2)));

        // a single component
        let results = DecompositionResults::from_matrices(
            data.clone(),
            &Array2::ones((4, 1)),
            &Array2::ones((6, 1)),
        );
        let err = Mcr::params().number_of_components(1).fit(&results).unwrap_err();
        assert!(matches!(err, McrError::NavigationSize(1)));
        assert!(err.to_string().contains("navigation size greater than one"));

        // nothing selects the components
        let results = DecompositionResults::from_matrices(
            data.clone(),
            &Array2::ones((4, 2)),
            &Array2::ones((6, 2)),
        );
        assert!(matches!(
            Mcr::params().fit(&results),
            Err(McrError::NoComponents)
        ));

        // mask of the wrong shape
        let err = Mcr::params()
            .number_of_components(2)
            .mask(Array1::from_elem(5, false))
            .fit(&results)
            .unwrap_err();
        assert!(matches!(err, McrError::MaskShape { .. }));

        let err = Mcr::params()
            .number_of_components(2)
            .mask(Array1::from_elem(4, true))
            .fit(&results)
            .unwrap_err();
        assert!(matches!(err, McrError::AllMasked));

        // data not matching the decomposition
        let results = DecompositionResults::<f64>::from_matrices(
            Array2::ones((5, 4)),
            &Array2::ones((4, 2)),
            &Array2::ones((6, 2)),
        );
        assert!(Mcr::params().number_of_components(2).fit(&results).is_err());
    }

    #[test]
    fn image_signals_are_unfolded() {
        // factors with a 2 x 3 signal, i.e. six channels
        let spectra = array![
            [1.0, 0.0],
            [2.0, 0.0],
            [0.5, 0.0],
            [0.0, 1.0],
            [0.0, 3.0],
            [0.0, 0.5]
        ];
        let maps = array![[1.0, 0.0], [0.6, 0.4], [0.3, 0.7], [0.0, 1.0]];
        let data = maps.dot(&spectra.t());
        let factors = mixed_factors(&spectra);
        let loadings = data.dot(&factors);

        let folded =
            Array::from_shape_vec((2, 2, 3), factors.t().iter().cloned().collect()).unwrap();
        let results = DecompositionResults::new(
            data,
            ComponentStack::new(folded, 1).unwrap(),
            ComponentStack::from_columns(&loadings),
        );

        let mcr = Mcr::params()
            .simplicity(Simplicity::Spectral)
            .number_of_components(2)
            .c_constraints(vec![Constraint::NonNegative])
            .fit(&results)
            .unwrap();

        assert_eq!(mcr.factors().dim(), (6, 2));
        assert_abs_diff_eq!(mcr.factors(), &unit_sum(&spectra), epsilon = 1e-4);
    }
}

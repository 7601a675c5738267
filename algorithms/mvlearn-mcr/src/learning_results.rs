//! Read-only view of a previous decomposition
//!
//! Curve resolution does not decompose the data itself, it rotates and refits the factors and
//! loadings of a decomposition computed upstream. [`LearningResults`] is the narrow interface it
//! needs from that decomposition, [`DecompositionResults`] a plain owned implementation.
use mvlearn::{error::Error, Float};
use ndarray::{Array, Array1, Array2, ArrayBase, ArrayD, ArrayView2, Data, Dimension, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::Result;

/// A stack of components
///
/// The leading `navigation_ndim` axes index the components, the remaining axes are the signal of
/// every component, e.g. a spectrum for the factors or an image for the loadings.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStack<F> {
    data: ArrayD<F>,
    navigation_ndim: usize,
}

impl<F: Float> ComponentStack<F> {
    /// Stack from an array whose leading `navigation_ndim` axes index the components
    ///
    /// # Errors
    ///
    /// If the array has fewer axes than `navigation_ndim`
    pub fn new<D: Dimension>(data: Array<F, D>, navigation_ndim: usize) -> Result<Self> {
        if navigation_ndim > data.ndim() {
            return Err(Error::Parameters(format!(
                "a {}-dimensional array cannot have {} navigation axes",
                data.ndim(),
                navigation_ndim
            ))
            .into());
        }

        Ok(ComponentStack {
            data: data.into_dyn(),
            navigation_ndim,
        })
    }

    /// Stack of one-dimensional components given as the columns of a matrix
    pub fn from_columns<D: Data<Elem = F>>(columns: &ArrayBase<D, Ix2>) -> Self {
        ComponentStack {
            data: columns.t().to_owned().into_dyn(),
            navigation_ndim: 1,
        }
    }

    pub fn data(&self) -> &ArrayD<F> {
        &self.data
    }

    pub fn navigation_shape(&self) -> &[usize] {
        &self.data.shape()[..self.navigation_ndim]
    }

    pub fn signal_shape(&self) -> &[usize] {
        &self.data.shape()[self.navigation_ndim..]
    }

    pub fn navigation_dimension(&self) -> usize {
        self.navigation_ndim
    }

    /// Number of components
    pub fn navigation_size(&self) -> usize {
        self.navigation_shape().iter().product()
    }

    /// Number of signal elements of every component
    pub fn signal_size(&self) -> usize {
        self.signal_shape().iter().product()
    }

    /// Flatten the navigation and the signal axes, one component per row
    pub fn unfold(&self) -> Result<Array2<F>> {
        let shape = (self.navigation_size(), self.signal_size());
        let unfolded = Array2::from_shape_vec(shape, self.data.iter().cloned().collect())
            .map_err(Error::from)?;
        Ok(unfolded)
    }
}

/// Weights of a Poissonian noise normalization
///
/// A decomposition of Poissonian data scales it by `1 / (spatial ⊗ spectral)` first, the curve
/// resolution repeats that scaling before fitting and undoes it afterwards.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonianWeights<F> {
    /// One weight per signal channel
    pub spectral: Array1<F>,
    /// One weight per navigation position (pixel)
    pub spatial: Array1<F>,
}

/// Results of a decomposition, as consumed by the curve resolution
pub trait LearningResults<F> {
    /// The decomposed data, shape `(n_pixels, n_channels)`
    fn data(&self) -> ArrayView2<'_, F>;

    /// Spectral components, the signal of every component has `n_channels` elements
    fn factors(&self) -> &ComponentStack<F>;

    /// Spatial components, the signal of every component has `n_pixels` elements
    fn loadings(&self) -> &ComponentStack<F>;

    /// Number of components the decomposition was truncated to, if any
    fn output_dimension(&self) -> Option<usize>;

    /// Weights of the Poissonian noise normalization, if the data was normalized
    fn poissonian_weights(&self) -> Option<&PoissonianWeights<F>>;
}

/// Owned decomposition results
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResults<F> {
    data: Array2<F>,
    factors: ComponentStack<F>,
    loadings: ComponentStack<F>,
    output_dimension: Option<usize>,
    poissonian_weights: Option<PoissonianWeights<F>>,
}

impl<F: Float> DecompositionResults<F> {
    pub fn new(data: Array2<F>, factors: ComponentStack<F>, loadings: ComponentStack<F>) -> Self {
        DecompositionResults {
            data,
            factors,
            loadings,
            output_dimension: None,
            poissonian_weights: None,
        }
    }

    /// Results of a decomposition `data ≈ loadings · factorsᵀ`
    ///
    /// `data` has shape `(n_pixels, n_channels)`, `factors` has shape `(n_channels, k)` and
    /// `loadings` has shape `(n_pixels, k)`.
    pub fn from_matrices(data: Array2<F>, factors: &Array2<F>, loadings: &Array2<F>) -> Self {
        Self::new(
            data,
            ComponentStack::from_columns(factors),
            ComponentStack::from_columns(loadings),
        )
    }

    pub fn with_output_dimension(mut self, output_dimension: usize) -> Self {
        self.output_dimension = Some(output_dimension);
        self
    }

    pub fn with_poissonian_weights(mut self, weights: PoissonianWeights<F>) -> Self {
        self.poissonian_weights = Some(weights);
        self
    }
}

impl<F: Float> LearningResults<F> for DecompositionResults<F> {
    fn data(&self) -> ArrayView2<'_, F> {
        self.data.view()
    }

    fn factors(&self) -> &ComponentStack<F> {
        &self.factors
    }

    fn loadings(&self) -> &ComponentStack<F> {
        &self.loadings
    }

    fn output_dimension(&self) -> Option<usize> {
        self.output_dimension
    }

    fn poissonian_weights(&self) -> Option<&PoissonianWeights<F>> {
        self.poissonian_weights.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn unfold_image_components() {
        // three components of 2 x 4 images
        let data = Array3::from_shape_fn((3, 2, 4), |(k, i, j)| (100 * k + 10 * i + j) as f64);
        let stack = ComponentStack::new(data, 1).unwrap();

        assert_eq!(stack.navigation_shape(), &[3]);
        assert_eq!(stack.signal_shape(), &[2, 4]);
        assert_eq!(stack.navigation_size(), 3);
        assert_eq!(stack.signal_size(), 8);

        let unfolded = stack.unfold().unwrap();
        assert_eq!(unfolded.dim(), (3, 8));
        assert_abs_diff_eq!(unfolded[[1, 5]], 111.0);
        assert_abs_diff_eq!(unfolded[[2, 3]], 203.0);
    }

    #[test]
    fn columns_are_components() {
        let factors = array![[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]];
        let stack = ComponentStack::from_columns(&factors);

        assert_eq!(stack.navigation_dimension(), 1);
        assert_eq!(stack.navigation_shape(), &[2]);
        assert_abs_diff_eq!(stack.unfold().unwrap(), factors.t());
    }

    #[test]
    fn too_many_navigation_axes() {
        assert!(ComponentStack::new(Array2::<f64>::zeros((2, 3)), 3).is_err());
    }

    #[test]
    fn owned_results() {
        let data = Array2::<f64>::ones((4, 3));
        let results = DecompositionResults::from_matrices(
            data,
            &Array2::ones((3, 2)),
            &Array2::ones((4, 2)),
        )
        .with_output_dimension(2);

        assert_eq!(results.data().dim(), (4, 3));
        assert_eq!(results.factors().signal_shape(), &[3]);
        assert_eq!(results.loadings().signal_shape(), &[4]);
        assert_eq!(results.output_dimension(), Some(2));
        assert!(results.poissonian_weights().is_none());
    }
}

//! # Model components
//!
//! `mvlearn-components` provides components of spectrum models together with estimators of their
//! parameters from the data, to be used as starting values of a fit or as a cheap background
//! subtraction.
//!
//! ## Current state
//!
//! - [`PowerLaw`]: `A · (x - origin)^(-r)` with the two-area estimation of `A` and `r`
//! - [`SplitVoigt`]: asymmetric pseudo-Voigt peak with the estimation of its area, width and
//!   centre from the moments of the spectrum
//! - [`UniformAxis`]: the signal axis the estimation integrates over
//!
//! ## Example
//!
//! ```rust
//! use mvlearn_components::{EstimationWindow, PowerLaw, UniformAxis};
//!
//! let axis = UniformAxis::<f64>::new(100., 1., 200)?;
//! let spectrum = PowerLaw::new(1e5, 3.).function(&axis.values());
//!
//! let mut background = PowerLaw::default();
//! let estimated =
//!     background.estimate_parameters(&axis, &spectrum, EstimationWindow::continuous(120., 200.))?;
//! assert!(estimated);
//! assert!((background.r() - 3.).abs() < 0.05);
//! # Ok::<(), mvlearn_components::ComponentsError>(())
//! ```

mod axis;
mod error;
mod power_law;
mod split_voigt;

pub use axis::{simpson, UniformAxis};
pub use error::{ComponentsError, Result};
pub use power_law::{EstimationWindow, PowerLaw, PowerLawEstimate};
pub use split_voigt::{SplitVoigt, SplitVoigtEstimate};

//! Error types in mvlearn
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An enumerated option was given a value outside of its choices
    #[error("'{option}' not recognised: got `{value}`, expected one of {expected}")]
    InvalidChoice {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("mismatched shapes: expected {expected:?}, got {actual:?}")]
    MismatchedShapes {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("at least one sample needed")]
    NotEnoughSamples,
    #[error("SVD decomposition did not return the requested singular vectors")]
    SvdDecomposition,
    #[error(transparent)]
    Linalg(#[from] linfa_linalg::LinalgError),
}

impl Error {
    pub fn invalid_choice(
        option: &'static str,
        value: &str,
        expected: &'static str,
    ) -> Self {
        Error::InvalidChoice {
            option,
            value: value.to_string(),
            expected,
        }
    }
}

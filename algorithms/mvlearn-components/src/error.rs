use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComponentsError>;

/// An error when evaluating or estimating a model component
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ComponentsError {
    #[error(
        "an axis needs a positive finite scale and at least one point, got scale {scale} and \
         size {size}"
    )]
    InvalidAxis { scale: f32, size: usize },
    #[error("the value {value} is out of the axis limits [{low}, {high}]")]
    OutOfAxis { value: f32, low: f32, high: f32 },
    #[error("x2 must be greater than x1")]
    EmptyFirstWindow,
    #[error("x3 must not be smaller than x2")]
    OverlappingWindows,
    #[error("x4 must be greater than x3")]
    EmptySecondWindow,
    #[error("the estimation windows must contain at least 2 points")]
    TooFewPoints,
    #[error(transparent)]
    MvlearnError(#[from] mvlearn::error::Error),
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, McrError>;

/// An error when resolving curves from a decomposition
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum McrError {
    #[error(
        "`factors` must have navigation dimension equal one, but the navigation dimension of \
         the given factors is {0}"
    )]
    NavigationDimension(usize),
    #[error(
        "`factors` must have navigation size greater than one, but the navigation size of the \
         given factors is {0}"
    )]
    NavigationSize(usize),
    /// Neither a component count, nor a list, nor an output dimension of the decomposition
    #[error("no `number_of_components` or `component_list` provided")]
    NoComponents,
    #[error("component {index} does not exist, the decomposition has {available} components")]
    ComponentOutOfRange { index: usize, available: usize },
    #[error("mask has to be of the signal shape {expected:?}, got {actual:?}")]
    MaskShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("every channel of the factors is masked")]
    AllMasked,
    #[error("`gamma` must be between 0 and 1, got {0}")]
    InvalidGamma(f32),
    #[error("maximum number of iterations must be at least 1")]
    ZeroIterations,
    #[error("`{name}` must be non-negative, got {value}")]
    NegativeTolerance { name: &'static str, value: f32 },
    #[error(transparent)]
    MvlearnError(#[from] mvlearn::error::Error),
}

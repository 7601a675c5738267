use thiserror::Error;

pub type Result<T> = std::result::Result<T, RpcaError>;

/// An error when fitting a robust PCA
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RpcaError {
    #[error("rank must be positive")]
    ZeroRank,
    /// The rank has to fit into the data
    #[error("rank must be between 1 and {max}, got {rank}")]
    InvalidRank { rank: usize, max: usize },
    #[error("`training_samples` must be >= rank ({rank}), got {training_samples}")]
    NotEnoughTrainingSamples {
        training_samples: usize,
        rank: usize,
    },
    #[error("`subspace_momentum` must be a float between 0 and 1, got {0}")]
    InvalidMomentum(f32),
    #[error("`{name}` must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("maximum number of iterations must be at least 1")]
    ZeroIterations,
    /// The user-supplied initial basis
    #[error("`init` has to be a two-dimensional matrix, got {0} dimensions")]
    InitNotTwoDimensional(usize),
    #[error("`init` has to be of shape {expected:?}, got {actual:?}")]
    InitShape {
        expected: (usize, usize),
        actual: Vec<usize>,
    },
    #[error("mask has to be of shape {expected:?}, got {actual:?}")]
    MaskShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    #[error(transparent)]
    MvlearnError(#[from] mvlearn::error::Error),
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NmfError>;

/// An error when fitting an online robust NMF
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NmfError {
    #[error("rank must be positive")]
    ZeroRank,
    #[error("rank must be between 1 and {max}, got {rank}")]
    InvalidRank { rank: usize, max: usize },
    #[error("`subspace_momentum` must be a float between 0 and 1, got {0}")]
    InvalidMomentum(f32),
    #[error("`{name}` must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error(transparent)]
    MvlearnError(#[from] mvlearn::error::Error),
}

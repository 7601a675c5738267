//! `mvlearn-datasets` generates synthetic factorization problems with a known ground truth, to
//! be used in tests, examples and benchmarks of the `mvlearn` algorithm crates.
//!
//! ## Current State
//!
//! Currently the following generators are provided:
//!
//! * [`generate::low_rank_sparse`]: a low-rank matrix corrupted by sparse outliers and Gaussian
//!   noise, the setting robust PCA is designed for
//! * [`generate::nonnegative_low_rank`]: a nonnegative low-rank product for NMF
//! * [`generate::sparse_corruption`]: the outlier pattern alone
//!
//! All generators take an explicit random number generator so that results are reproducible:
//! ```ignore
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let problem =
//!     mvlearn_datasets::generate::low_rank_sparse((256, 250), 3, 0.01, 10., 0.01, &mut rng)?;
//! ```

pub mod generate;

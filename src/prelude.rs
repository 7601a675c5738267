//! Common imports of the factorization crates
//!
//! `use mvlearn::prelude::*;` brings the fitting traits, the shared error type and the
//! decomposition metrics into scope.

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::{Float, ParamGuard};

#[doc(no_inline)]
pub use crate::linalg::LowRankSvd;

#[doc(no_inline)]
pub use crate::metrics_decomposition::Decomposition;

//! Forwarding of renamed hyperparameters
//!
//! Builders keep accepting the old name of a renamed parameter. The value is forwarded to the
//! new parameter and a notice is both logged and kept next to the hyperparameters, so callers
//! can inspect what was rewritten.
use std::fmt;

#[cfg(feature = "serde")]
use serde_crate::Serialize;

/// A hyperparameter that was set through its legacy name
#[cfg_attr(feature = "serde", derive(Serialize), serde(crate = "serde_crate"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeprecatedParameter {
    name: &'static str,
    replacement: &'static str,
}

impl DeprecatedParameter {
    /// Emit the deprecation warning for `name` and return the notice
    pub fn warn(name: &'static str, replacement: &'static str) -> Self {
        let notice = DeprecatedParameter { name, replacement };
        log::warn!("{}", notice);
        notice
    }

    /// The legacy parameter name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parameter receiving the value
    pub fn replacement(&self) -> &'static str {
        self.replacement
    }
}

impl fmt::Display for DeprecatedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The argument `{}` has been deprecated and may be removed in future. \
             Please use `{}` instead.",
            self.name, self.replacement
        )
    }
}

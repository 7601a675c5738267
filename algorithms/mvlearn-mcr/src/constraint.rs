use std::fmt;
use std::str::FromStr;

use mvlearn::{error::Error, linalg::safe_div, Float};
use ndarray::{Array2, Axis};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Constraint applied to a half of the factorization after each regression
///
/// Constraints are stateless and act on the whole matrix in place.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Clip negative entries to zero
    NonNegative,
    /// Scale every row to unit sum, rows summing to zero are set to zero
    Normalize,
}

impl Constraint {
    pub fn apply<F: Float>(&self, x: &mut Array2<F>) {
        match self {
            Constraint::NonNegative => x.mapv_inplace(|v| v.max(F::zero())),
            Constraint::Normalize => {
                for mut row in x.axis_iter_mut(Axis(0)) {
                    let total = row.sum();
                    row.mapv_inplace(|v| safe_div(v, total));
                }
            }
        }
    }
}

impl FromStr for Constraint {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "NonNeg" => Ok(Constraint::NonNegative),
            "Norm" => Ok(Constraint::Normalize),
            _ => Err(Error::invalid_choice("constraint", s, "NonNeg, Norm")),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::NonNegative => write!(f, "NonNeg"),
            Constraint::Normalize => write!(f, "Norm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn clip_and_normalize() {
        let mut x = array![[1.0, -1.0, 3.0], [0.0, 0.0, 0.0], [-2.0, 2.0, 2.0]];
        Constraint::NonNegative.apply(&mut x);
        assert_abs_diff_eq!(x, array![[1.0, 0.0, 3.0], [0.0, 0.0, 0.0], [0.0, 2.0, 2.0]]);

        Constraint::Normalize.apply(&mut x);
        assert_abs_diff_eq!(x, array![[0.25, 0.0, 0.75], [0.0, 0.0, 0.0], [0.0, 0.5, 0.5]]);
    }

    #[test]
    fn parse_constraints() {
        assert_eq!("NonNeg".parse::<Constraint>().unwrap(), Constraint::NonNegative);
        assert_eq!("Norm".parse::<Constraint>().unwrap(), Constraint::Normalize);
        assert!("Unimodal".parse::<Constraint>().is_err());
    }
}

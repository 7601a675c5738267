mod algorithm;
mod hyperparams;

pub use algorithm::{McrAr, StopReason};
pub use hyperparams::{McrArParams, McrArValidParams};

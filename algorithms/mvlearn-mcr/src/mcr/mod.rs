mod algorithm;
mod hyperparams;

pub use algorithm::Mcr;
pub use hyperparams::{McrParams, McrValidParams, Simplicity};

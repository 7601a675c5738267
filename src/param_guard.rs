use crate::traits::Fit;

/// Hyperparameters as set by the builder, not yet validated
///
/// Every `XParams` builder wraps its `XValidParams` and only hands them out after validation, so
/// an algorithm never runs with an out-of-range rank, tolerance or learning rate. Implementing
/// [`Fit`] for the validated parameters implements it for the builder as well, validating first.
///
/// `check_ref()` and `check()` must run the same validation.
pub trait ParamGuard {
    /// The checked hyperparameters
    type Checked;
    /// Error type resulting from failed hyperparameter checking
    type Error: std::error::Error;

    /// Checks the hyperparameters and returns a reference to the checked hyperparameters if
    /// successful
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Checks the hyperparameters and returns the checked hyperparameters if successful
    fn check(self) -> Result<Self::Checked, Self::Error>;

    /// Calls `check()` and unwraps the result
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        self.check().unwrap()
    }
}

/// Validate, then fit with the validated parameters. A validation error is converted into the
/// error type of the algorithm.
impl<R, E, P: ParamGuard> Fit<R, E> for P
where
    P::Checked: Fit<R, E>,
    E: std::error::Error + From<crate::error::Error> + From<P::Error>,
{
    type Object = <<P as ParamGuard>::Checked as Fit<R, E>>::Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E> {
        let checked = self.check_ref()?;
        checked.fit(records)
    }
}

//! Context for failures that have no dedicated error variant.
//!
//! `.diag(...)` turns any `std::error::Error` into a `miette` report carrying
//! a short description of what was being attempted.
use miette::{Context, IntoDiagnostic, Result};
use std::fmt::Display;

/// Extension methods for turning `Result` values into `miette` diagnostics.
///
/// ```rust,ignore
/// use crate::diagnostics::ResultExt;
///
/// let exe = std::env::current_exe().diag("locate the kumiki executable")?;
/// ```
pub(crate) trait ResultExt<T> {
    /// Attach a static context message to any error.
    fn diag(self, context: impl Display + Send + Sync + 'static) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn diag(self, context: impl Display + Send + Sync + 'static) -> Result<T> {
        self.into_diagnostic().wrap_err(context)
    }
}

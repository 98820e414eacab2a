//! Errors raised while reading the run configuration.

use miette::Diagnostic;
use thiserror::Error;

/// Invalid environment or an unusable working directory.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An environment variable holds a value kumiki cannot use.
    #[error("{variable}={value:?} is invalid: {reason}")]
    #[diagnostic(code(kumiki::config::invalid_config))]
    InvalidConfig {
        /// Variable name.
        variable: &'static str,
        /// Value as found in the environment.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The working directory cannot be determined.
    #[error("cannot determine the working directory")]
    #[diagnostic(code(kumiki::config::working_directory))]
    WorkingDirectory {
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

//! Errors raised while probing for toolchain binaries.

use miette::Diagnostic;
use thiserror::Error;

/// Failure to discover a required toolchain component.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolchainError {
    /// A required probe matched nothing.
    #[error("no {tool} found matching `{pattern}`")]
    #[diagnostic(
        code(kumiki::toolchain::not_found),
        help("install the toolchain, point KUMIKI_WIN_ROOT at it, or set KUMIKI_CROSS=0")
    )]
    NotFound {
        /// Variable the probe was meant to define.
        tool: String,
        /// Pattern searched.
        pattern: String,
    },

    /// The search pattern is not a valid glob.
    #[error("invalid search pattern `{pattern}`")]
    #[diagnostic(code(kumiki::toolchain::pattern))]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Parser failure.
        #[source]
        source: glob::PatternError,
    },

    /// A directory could not be read while expanding the pattern.
    #[error("failed to list entries for `{pattern}`")]
    #[diagnostic(code(kumiki::toolchain::listing))]
    Listing {
        /// Pattern being expanded.
        pattern: String,
        /// Underlying I/O failure.
        #[source]
        source: glob::GlobError,
    },

    /// A matched binary does not sit where its installation layout implies.
    #[error("{tool} at `{path}` is not inside a recognised installation layout")]
    #[diagnostic(code(kumiki::toolchain::layout))]
    UnexpectedLayout {
        /// Variable the binary was discovered for.
        tool: String,
        /// Discovered path.
        path: String,
    },
}

//! Errors raised while registering rules and appending edges.

use miette::Diagnostic;
use thiserror::Error;

/// Configuration errors in the rule registry or the declared edges.
///
/// Every variant is fatal: the declaration tree is wrong and the generator
/// writes nothing.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphError {
    /// Two rules share a name.
    #[error("rule `{name}` is registered twice")]
    #[diagnostic(
        code(kumiki::graph::duplicate_rule),
        help("rule names must be unique across the registry")
    )]
    DuplicateRule {
        /// Name of the second registration.
        name: String,
    },

    /// An edge references a rule that was never registered.
    #[error("edge producing `{target}` references unknown rule `{rule}`")]
    #[diagnostic(code(kumiki::graph::unknown_rule))]
    UnknownRule {
        /// Requested rule name.
        rule: String,
        /// First target of the offending edge.
        target: String,
    },

    /// An edge specification is structurally invalid.
    #[error("malformed `{rule}` edge: {reason}")]
    #[diagnostic(code(kumiki::graph::malformed_edge))]
    MalformedEdge {
        /// Rule the edge would have used.
        rule: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A binding name contains characters Ninja does not accept.
    #[error("`{name}` is not a valid variable name")]
    #[diagnostic(
        code(kumiki::graph::invalid_name),
        help("use ASCII letters, digits, `_`, `-` or `.`")
    )]
    InvalidName {
        /// Offending name.
        name: String,
    },

    /// A referenced variable resolves from no scope (strict mode only).
    #[error("variable `${name}` used by {context} is not defined")]
    #[diagnostic(
        code(kumiki::graph::unresolved_variable),
        help("define it in a declaration unit's `vars` block or unset KUMIKI_STRICT_VARS")
    )]
    UnresolvedVariable {
        /// Variable name without the leading `$`.
        name: String,
        /// Where the reference was found.
        context: String,
    },
}

//! Errors raised while loading the declaration tree.

use miette::Diagnostic;
use thiserror::Error;

use super::UnitPath;
use crate::graph::GraphError;

const ROOT_HINT: &str = "run kumiki from the directory holding the top-level BUILD file or point KUMIKI_ROOT at it";
const CHILD_HINT: &str = "check the `include` list of the parent unit";

/// Fatal failure while walking the declaration tree.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    /// A unit file is missing or cannot be read.
    #[error("cannot read declaration unit `{unit}`")]
    #[diagnostic(code(kumiki::declaration::unreadable), help("{hint}"))]
    Unreadable {
        /// Unit identity or tree root.
        unit: String,
        /// What to check, which differs for the root unit.
        hint: &'static str,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A unit file is not valid YAML or does not match the unit schema.
    #[error("invalid declaration unit `{unit}`")]
    #[diagnostic(code(kumiki::declaration::parse))]
    Parse {
        /// Unit identity.
        unit: String,
        /// Located parse or schema diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// A unit was reached twice through the include lists.
    #[error("declaration unit `{unit}` included again by `{includer}`")]
    #[diagnostic(
        code(kumiki::declaration::repeated_unit),
        help("each unit may be included exactly once; remove the duplicate include or the cycle")
    )]
    RepeatedUnit {
        /// Unit identity.
        unit: String,
        /// Identity of the unit naming it the second time.
        includer: String,
    },

    /// An include names a location outside the tree root.
    #[error("`{includer}` includes `{unit}`, which lies outside the declaration tree")]
    #[diagnostic(code(kumiki::declaration::outside_tree))]
    OutsideTree {
        /// Requested location.
        unit: String,
        /// Identity of the including unit.
        includer: String,
    },

    /// A unit declared an invalid edge, rule or binding.
    #[error("declaration unit `{unit}` is invalid")]
    #[diagnostic(code(kumiki::declaration::declare))]
    Declare {
        /// Unit identity.
        unit: String,
        /// What the builder rejected.
        #[source]
        #[diagnostic_source]
        source: GraphError,
    },
}

impl LoadError {
    /// Report that `unit` could not be read.
    #[must_use]
    pub fn unreadable(unit: &UnitPath, source: std::io::Error) -> Self {
        Self::Unreadable {
            unit: unit.identity(),
            hint: if unit.is_root() { ROOT_HINT } else { CHILD_HINT },
            source,
        }
    }

    /// Report that the tree root itself could not be opened.
    #[must_use]
    pub fn unreadable_root(root: &camino::Utf8Path, source: std::io::Error) -> Self {
        Self::Unreadable {
            unit: root.to_string(),
            hint: ROOT_HINT,
            source,
        }
    }
}

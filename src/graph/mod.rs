//! In-memory build graph.
//!
//! A [`BuildGraph`] is owned by whoever drives generation and handed to each
//! declaration unit through a [`Builder`]. It accumulates global bindings,
//! edges, default targets, and the identities of the units that contributed
//! them. Nothing is removed once appended: the graph lives for a single run.
//!
//! ```
//! use kumiki::graph::{BuildGraph, Simple, Transform};
//! use kumiki::rules::{Rule, RuleRegistry};
//!
//! let mut rules = RuleRegistry::default();
//! rules.register(Rule::new("compile", "CXX $in", "c++ $in -o $out"))?;
//! let mut graph = BuildGraph::new(Default::default(), rules);
//! graph
//!     .builder()
//!     .transform(Transform::Compile, &Simple::new("app", "app.cc"))?;
//! assert_eq!(graph.edges.len(), 1);
//! # Ok::<(), kumiki::graph::GraphError>(())
//! ```

mod builder;
mod error;
mod paths;

pub use builder::{
    Builder, EdgeSpec, GenRun, Importation, OneShot, Optional, OptionalPart, REVISION, REVSHORT,
    Resize, Simple, TestRun, Transform, Zip,
};
pub use error::GraphError;
pub use paths::{normalize, relative_to};

use crate::rules::RuleRegistry;
use crate::template::Vars;

/// Name of Ninja's built-in alias rule.
pub const PHONY: &str = "phony";

/// One build action: a rule applied to inputs to produce targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    /// Rule name, or [`PHONY`].
    pub rule: String,
    /// Produced paths; never empty.
    pub targets: Vec<String>,
    /// Explicit inputs, substituted for `$in`.
    pub sources: Vec<String>,
    /// Inputs that must be up to date but are not passed to the command.
    pub implicit: Vec<String>,
    /// Edge-local bindings shadowing globals and rule bindings.
    pub vars: Vars,
}

impl Edge {
    /// Whether this edge is a pure alias.
    #[must_use]
    pub fn is_phony(&self) -> bool {
        self.rule == PHONY
    }

    /// First produced path, used to name the edge in diagnostics.
    #[must_use]
    pub fn primary_target(&self) -> &str {
        self.targets.first().map_or("", String::as_str)
    }
}

/// Accumulated graph for one generator run.
#[derive(Debug, Default)]
pub struct BuildGraph {
    /// Global bindings, emitted first in insertion order.
    pub globals: Vars,
    /// Rules available to edges.
    pub rules: RuleRegistry,
    /// Edges in declaration order.
    pub edges: Vec<Edge>,
    /// Targets built when Ninja is invoked without arguments.
    pub defaults: Vec<String>,
    /// Identities of the declaration units visited, in visitation order.
    pub units: Vec<String>,
}

impl BuildGraph {
    /// Create a graph seeded with `globals` and a populated rule registry.
    #[must_use]
    pub fn new(globals: Vars, rules: RuleRegistry) -> Self {
        Self {
            globals,
            rules,
            ..Self::default()
        }
    }

    /// Borrow a builder appending to this graph.
    pub const fn builder(&mut self) -> Builder<'_> {
        Builder::new(self)
    }

    /// Record that a declaration unit contributed to the graph.
    pub fn record_unit(&mut self, identity: impl Into<String>) {
        self.units.push(identity.into());
    }
}

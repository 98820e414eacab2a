//! Named command templates.
//!
//! A [`Rule`] is what Ninja calls a rule: a command template, a description
//! shown while it runs, and optionally a depfile with its format. Rules are
//! registered once at startup in a [`RuleRegistry`] and never change after.

mod catalogue;

pub use catalogue::{prelude, standard, tool_globals};

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

use crate::graph::GraphError;
use crate::template::Resolver;

/// Syntax of the dependency file a command writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepsFormat {
    /// Makefile-style depfile written by gcc/clang `-MD`.
    Gcc,
    /// `/showIncludes` lines printed by MSVC.
    Msvc,
}

impl DepsFormat {
    /// Keyword Ninja expects in a rule's `deps` binding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
        }
    }
}

impl Display for DepsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Unique name edges refer to.
    pub name: String,
    /// Human-readable progress line.
    pub description: String,
    /// Shell command template.
    pub command: String,
    /// Template for the depfile path, if the command writes one.
    pub depfile: Option<String>,
    /// How Ninja should read discovered dependencies.
    pub deps: Option<DepsFormat>,
}

impl Rule {
    /// Create a rule without dependency tracking.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: command.into(),
            depfile: None,
            deps: None,
        }
    }

    /// Track dependencies through a depfile written by the command.
    #[must_use]
    pub fn with_depfile(mut self, depfile: impl Into<String>, format: DepsFormat) -> Self {
        self.depfile = Some(depfile.into());
        self.deps = Some(format);
        self
    }

    /// Track dependencies reported on the command's output (no depfile).
    #[must_use]
    pub fn with_deps(mut self, format: DepsFormat) -> Self {
        self.deps = Some(format);
        self
    }

    /// Templates Ninja evaluates in an edge's scope, labelled by binding name.
    pub fn templates(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("description", Some(self.description.as_str())),
            ("depfile", self.depfile.as_deref()),
            ("command", Some(self.command.as_str())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

/// Rule-level bindings are visible to the rule's own templates.
impl Resolver for Rule {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "description" => Some(self.description.as_str()),
            "command" => Some(self.command.as_str()),
            "depfile" => self.depfile.as_deref(),
            "deps" => self.deps.map(DepsFormat::as_str),
            _ => None,
        }
    }
}

/// Registry of rules keyed by name, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, Rule>,
}

impl RuleRegistry {
    /// Add `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateRule`] if the name is already taken.
    pub fn register(&mut self, rule: Rule) -> Result<(), GraphError> {
        if self.rules.contains_key(&rule.name) {
            return Err(GraphError::DuplicateRule { name: rule.name });
        }
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    /// Look up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Iterate rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "registry tests use fixed rules")]

    use super::*;
    use crate::template::Resolution;

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = RuleRegistry::default();
        registry
            .register(Rule::new("copy", "COPY $in", "cp $in $out"))
            .expect("first registration");
        let err = registry
            .register(Rule::new("copy", "COPY", "cp -f $in $out"))
            .expect_err("second registration must fail");
        assert_eq!(
            err,
            GraphError::DuplicateRule {
                name: "copy".into()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("copy").map(|r| r.command.as_str()),
            Some("cp $in $out")
        );
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = RuleRegistry::default();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(Rule::new(name, name, "true"))
                .expect("register");
        }
        let names: Vec<_> = registry.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn rule_bindings_resolve_depfile() {
        let rule = Rule::new("cc", "CC $in", "cc -MF $depfile $in")
            .with_depfile("$out.d", DepsFormat::Gcc);
        assert_eq!(rule.resolve("depfile"), Resolution::Resolved("$out.d"));
        assert_eq!(rule.resolve("deps"), Resolution::Resolved("gcc"));
        assert_eq!(rule.resolve("CFLAGS"), Resolution::Unresolved("CFLAGS"));
        let keys: Vec<_> = rule.templates().map(|(k, _)| k).collect();
        assert_eq!(keys, ["description", "depfile", "command"]);
    }

    #[test]
    fn msvc_rules_have_no_depfile() {
        let rule = Rule::new("cl", "CL $in", "cl /showIncludes $in").with_deps(DepsFormat::Msvc);
        assert_eq!(rule.depfile, None);
        assert_eq!(rule.deps.map(DepsFormat::as_str), Some("msvc"));
    }
}

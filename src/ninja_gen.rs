//! Ninja file generator.
//!
//! This module converts a [`BuildGraph`] into the textual representation
//! expected by the Ninja build system. Output order is fully determined by
//! declaration order, so identical inputs produce byte-identical files.
//!
//! Before any text is produced every variable referenced by a global, a rule
//! template or an edge binding is resolved the way Ninja will resolve it.
//! Unresolved names are passed through for Ninja to judge unless
//! [`UnresolvedPolicy::Strict`] is requested.

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::graph::{BuildGraph, Edge, GraphError};
use crate::rules::{DepsFormat, Rule};
use crate::template::{self, Resolver, Scope, Vars};

const HEADER: &str = "# Generated by kumiki. Edits are lost on the next regeneration.";

macro_rules! write_kv {
    ($f:expr, $key:expr, $opt:expr) => {
        if let Some(val) = $opt {
            writeln!($f, "  {}", Binding($key, val))?;
        }
    };
}

/// What to do with a variable no scope defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Log it and leave the reference for Ninja.
    #[default]
    PassThrough,
    /// Fail with [`GraphError::UnresolvedVariable`].
    Strict,
}

/// Trailing edge that makes Ninja re-run the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconfigure {
    /// The build file itself, e.g. `$ninjadir/build.ninja`.
    pub output: String,
    /// Generator entry point, listed before the visited units.
    pub entry: String,
}

/// Generate a Ninja build file as a string.
///
/// # Errors
///
/// Returns [`GraphError::UnresolvedVariable`] under the strict policy.
pub fn generate(
    graph: &BuildGraph,
    reconfigure: &Reconfigure,
    policy: UnresolvedPolicy,
) -> Result<String, GraphError> {
    check_variables(graph, policy)?;
    Ok(Manifest { graph, reconfigure }.to_string())
}

/// Escape a filesystem path for use in a `build` line.
///
/// ```
/// use kumiki::ninja_gen::escape_path;
///
/// assert_eq!(escape_path("/opt/my tools/c:$x"), "/opt/my$ tools/c$:$$x");
/// ```
#[must_use]
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if matches!(ch, '$' | ' ' | ':') {
            escaped.push('$');
        }
        escaped.push(ch);
    }
    escaped
}

/// Wrapper struct to display the whole file.
struct Manifest<'a> {
    graph: &'a BuildGraph,
    reconfigure: &'a Reconfigure,
}

impl Display for Manifest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let graph = self.graph;
        writeln!(f, "{HEADER}")?;
        writeln!(f)?;
        for (name, value) in &graph.globals {
            writeln!(f, "{}", Binding(name, value))?;
        }
        writeln!(f)?;
        for rule in graph.rules.iter() {
            write!(f, "{}", NamedRule(rule))?;
        }
        for edge in &graph.edges {
            write!(f, "{}", DisplayEdge(edge))?;
        }
        if !graph.edges.is_empty() {
            writeln!(f)?;
        }
        for target in &graph.defaults {
            writeln!(f, "default {target}")?;
        }
        if !graph.defaults.is_empty() {
            writeln!(f)?;
        }
        let inputs = std::iter::once(self.reconfigure.entry.as_str())
            .chain(graph.units.iter().map(String::as_str));
        writeln!(
            f,
            "build {}: config {}",
            self.reconfigure.output,
            inputs.format(" ")
        )
    }
}

/// `name = value`, without a trailing space for empty values.
struct Binding<'a>(&'a str, &'a str);

impl Display for Binding<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.1.is_empty() {
            write!(f, "{} =", self.0)
        } else {
            write!(f, "{} = {}", self.0, self.1)
        }
    }
}

/// Wrapper struct to display a rule block.
struct NamedRule<'a>(&'a Rule);

impl Display for NamedRule<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rule = self.0;
        writeln!(f, "rule {}", rule.name)?;
        write_kv!(f, "description", Some(rule.description.as_str()));
        write_kv!(f, "depfile", rule.depfile.as_deref());
        write_kv!(f, "deps", rule.deps.map(DepsFormat::as_str));
        write_kv!(f, "command", Some(rule.command.as_str()));
        writeln!(f)
    }
}

/// Wrapper struct to display a build edge.
struct DisplayEdge<'a>(&'a Edge);

impl Display for DisplayEdge<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let edge = self.0;
        write!(f, "build {}: {}", edge.targets.join(" "), edge.rule)?;
        if !edge.sources.is_empty() {
            write!(f, " {}", edge.sources.join(" "))?;
        }
        if !edge.implicit.is_empty() {
            write!(f, " | {}", edge.implicit.join(" "))?;
        }
        writeln!(f)?;
        for (name, value) in &edge.vars {
            writeln!(f, "  {}", Binding(name, value))?;
        }
        Ok(())
    }
}

/// Values Ninja derives for every edge.
fn builtins(edge: &Edge) -> Vars {
    Vars::from([
        ("in".to_owned(), edge.sources.join(" ")),
        ("in_newline".to_owned(), edge.sources.join("\n")),
        ("out".to_owned(), edge.targets.join(" ")),
    ])
}

struct Checker {
    policy: UnresolvedPolicy,
}

impl Checker {
    fn check(
        &self,
        template: &str,
        scope: &dyn Resolver,
        context: impl Fn() -> String,
    ) -> Result<String, GraphError> {
        let expansion = template::expand(template, scope);
        if let Some(name) = expansion.unresolved.first() {
            if self.policy == UnresolvedPolicy::Strict {
                return Err(GraphError::UnresolvedVariable {
                    name: name.clone(),
                    context: context(),
                });
            }
            debug!(
                unresolved = %expansion.unresolved.join(", "),
                context = %context(),
                "passing unresolved variables through"
            );
        }
        Ok(expansion.text)
    }
}

fn check_variables(graph: &BuildGraph, policy: UnresolvedPolicy) -> Result<(), GraphError> {
    let checker = Checker { policy };

    // Ninja evaluates each global when it is read, so only earlier ones count.
    let mut earlier = Vars::new();
    for (name, value) in &graph.globals {
        checker.check(value, &earlier, || format!("global `{name}`"))?;
        earlier.insert(name.clone(), value.clone());
    }

    for edge in &graph.edges {
        let context = || format!("the `{}` edge for `{}`", edge.rule, edge.primary_target());
        let derived = builtins(edge);
        let local_scope = Scope::new().with(&derived).with(&graph.globals);
        for value in edge.vars.values() {
            checker.check(value, &local_scope, context)?;
        }
        let Some(rule) = graph.rules.get(&edge.rule) else {
            continue;
        };
        let rule_scope = Scope::new()
            .with(&edge.vars)
            .with(rule)
            .with(&derived)
            .with(&graph.globals);
        for (key, template) in rule.templates() {
            if edge.vars.contains_key(key) {
                continue;
            }
            let text = checker.check(template, &rule_scope, context)?;
            if key == "command" {
                trace!(target = edge.primary_target(), command = %text, "edge");
            }
        }
    }
    Ok(())
}

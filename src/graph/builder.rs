//! Edge construction API.
//!
//! [`Builder`] appends edges to a [`BuildGraph`]. Each physical action has a
//! dedicated operation that fills in the rule name and edge-local bindings its
//! rule expects, then funnels through [`Builder::add_edge`], the only place
//! edges are validated. Validation is per edge: the builder never compares an
//! edge with the ones already appended.
//!
//! The request structs double as the schema of declaration unit files, so
//! they derive `Deserialize`.

use camino::Utf8Path;
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{BuildGraph, Edge, GraphError, PHONY, relative_to};
use crate::template::{self, Segment, Vars};

/// Build revision stamp every importation depends on.
pub const REVISION: &str = "$dst/gen/REVISION";
/// Short build revision stamp every importation depends on.
pub const REVSHORT: &str = "$dst/gen/REVSHORT";

const DEFAULT_HEADER_MODE: &str = "cpp";

/// Generic edge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSpec {
    /// Rule name, or `phony`.
    pub rule: String,
    /// Produced paths.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Explicit inputs.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Implicit inputs.
    #[serde(default)]
    pub implicit: Vec<String>,
    /// Edge-local bindings.
    #[serde(default)]
    pub vars: Vars,
}

/// Single-input transformation kinds sharing the [`Simple`] request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Native compile and link.
    Compile,
    /// Native compile of the simulator build.
    CompileSim,
    /// MSVC 32-bit compile.
    CompileWin32,
    /// MSVC 64-bit compile.
    CompileWin64,
    /// MSVC 32-bit link.
    LinkWin32,
    /// MSVC 64-bit link.
    LinkWin64,
    /// 32-bit resource compile.
    ResourceWin32,
    /// 64-bit resource compile.
    ResourceWin64,
    /// Run a built artifact, capturing stdout.
    Run,
    /// Convert an image between formats.
    ConvertImage,
    /// Copy a file.
    Copy,
}

impl Transform {
    /// Every transformation kind.
    pub const ALL: [Self; 11] = [
        Self::Compile,
        Self::CompileSim,
        Self::CompileWin32,
        Self::CompileWin64,
        Self::LinkWin32,
        Self::LinkWin64,
        Self::ResourceWin32,
        Self::ResourceWin64,
        Self::Run,
        Self::ConvertImage,
        Self::Copy,
    ];

    /// Name of the catalogue rule implementing this kind.
    #[must_use]
    pub const fn rule(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::CompileSim => "compile_sim",
            Self::CompileWin32 => "compile_win32",
            Self::CompileWin64 => "compile_win64",
            Self::LinkWin32 => "link_win32",
            Self::LinkWin64 => "link_win64",
            Self::ResourceWin32 => "rc_win32",
            Self::ResourceWin64 => "rc_win64",
            Self::Run => "run",
            Self::ConvertImage => "convert_image",
            Self::Copy => "copy",
        }
    }
}

/// One source to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simple {
    /// Produced path.
    pub target: String,
    /// Input path.
    pub source: String,
    /// Extra implicit inputs.
    #[serde(default)]
    pub implicit: Vec<String>,
}

impl Simple {
    /// Request without implicit inputs.
    #[must_use]
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            implicit: Vec::new(),
        }
    }

    /// Add implicit inputs.
    #[must_use]
    pub fn with_implicit<I, S>(mut self, implicit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implicit.extend(implicit.into_iter().map(Into::into));
        self
    }
}

/// Image resize: binds `size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resize {
    /// Produced image.
    pub target: String,
    /// Source image.
    pub source: String,
    /// Geometry passed to `convert -resize`, e.g. `32x32`.
    pub size: String,
    /// Extra implicit inputs.
    #[serde(default)]
    pub implicit: Vec<String>,
}

/// Archive of several inputs; binds `base`, `relout` and `relin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Zip {
    /// Produced archive.
    pub target: String,
    /// Members, as build paths.
    pub sources: Vec<String>,
    /// Directory the member names are relative to.
    pub base: String,
}

/// Source-to-header translation through the importer tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Importation {
    /// Produced header or source file.
    pub target: String,
    /// Input file.
    pub source: String,
    /// Header emission mode passed with `--header` when `name` is set.
    #[serde(default = "default_header_mode")]
    pub header: String,
    /// Symbol name for the generated artifact.
    #[serde(default)]
    pub name: Option<String>,
    /// Preserve the leading comment block of the source.
    #[serde(default)]
    pub keep_first_comment: bool,
    /// Depfile override.
    #[serde(default)]
    pub depfile: Option<String>,
    /// Extra implicit inputs, merged after the revision stamps.
    #[serde(default)]
    pub implicit: Vec<String>,
    /// Extra importer options, placed before the generated ones.
    #[serde(default)]
    pub options: Option<String>,
}

fn default_header_mode() -> String {
    DEFAULT_HEADER_MODE.to_owned()
}

impl Importation {
    /// Plain importation with default options.
    #[must_use]
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            header: default_header_mode(),
            name: None,
            keep_first_comment: false,
            depfile: None,
            implicit: Vec::new(),
            options: None,
        }
    }

    fn options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = self
            .options
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .into_iter()
            .collect();
        if self.keep_first_comment {
            options.push("--keep-first-comment");
        }
        if let Some(name) = &self.name {
            options.extend(["--name", name, "--header", &self.header]);
        }
        options
    }
}

/// One optional feature block composed into an aggregate header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalPart {
    /// Feature name; `-` becomes `_` in the generated symbol.
    pub name: String,
    /// Feature source.
    pub source: String,
}

/// Aggregate header composed from separately generated feature blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Optional {
    /// Platform family prefixing the intermediate headers, e.g. `esp32`.
    pub family: String,
    /// Aggregate name; the header is `<output_dir>/<name>.h`.
    pub name: String,
    /// Aggregate source.
    pub source: String,
    /// Directory receiving the aggregate header.
    pub output_dir: String,
    /// Feature blocks, generated in order.
    #[serde(default)]
    pub parts: Vec<OptionalPart>,
}

/// Script run over inputs; binds `script`, `options` and `infiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenRun {
    /// Captured stdout.
    pub target: String,
    /// Generator script, also an explicit input.
    pub script: String,
    /// Options passed before the inputs.
    #[serde(default)]
    pub options: String,
    /// Inputs handed to the script.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Edge with its own command line; binds `command` and optionally `pool`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OneShot {
    /// Produced path or pseudo-target.
    pub target: String,
    /// Command overriding the rule's placeholder.
    pub command: String,
    /// Explicit input.
    pub source: String,
    /// Ninja pool, e.g. `console`.
    #[serde(default)]
    pub pool: Option<String>,
}

/// Test run capturing the interpreter's output as the artifact.
///
/// Binds `program`, `test`, `interp`, and optionally `pool`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestRun {
    /// Captured output.
    pub target: String,
    /// Built interpreter image under test.
    pub program: String,
    /// Test script.
    pub test: String,
    /// Launcher placed before the program, e.g. `$NODEJS`.
    #[serde(default)]
    pub interp: String,
    /// Ninja pool.
    #[serde(default)]
    pub pool: Option<String>,
}

/// Handle appending edges to a graph.
pub struct Builder<'g> {
    graph: &'g mut BuildGraph,
}

impl<'g> Builder<'g> {
    /// Wrap `graph`.
    #[must_use]
    pub const fn new(graph: &'g mut BuildGraph) -> Self {
        Self { graph }
    }

    /// Bind a global variable.
    ///
    /// Ninja evaluates top-level bindings as it reads them, so a rebound name
    /// moves to the end of the globals. References to the name inside the new
    /// value, and inside globals bound after the old one, are replaced with
    /// the old value so every binding keeps the meaning it had when declared.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidName`] for names Ninja rejects.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        let key: String = name.into();
        if !template::is_valid_name(&key) {
            return Err(GraphError::InvalidName { name: key });
        }
        let mut bound: String = value.into();
        let globals = &mut self.graph.globals;
        if let Some((index, _, previous)) = globals.shift_remove_full(&key) {
            bound = template::substitute(&bound, &key, &previous);
            for (_, later) in globals.iter_mut().skip(index) {
                if template::references(later).contains(&key.as_str()) {
                    *later = template::substitute(later, &key, &previous);
                }
            }
        }
        globals.insert(key, bound);
        Ok(())
    }

    /// Append a validated edge and return its first target.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedEdge`] for an empty target list or a
    /// path Ninja cannot parse, [`GraphError::InvalidName`] for a bad binding
    /// name, and [`GraphError::UnknownRule`] for an unregistered rule.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Result<String, GraphError> {
        let EdgeSpec {
            rule,
            targets,
            sources,
            implicit,
            vars,
        } = spec;
        let malformed = |reason: String| GraphError::MalformedEdge {
            rule: rule.clone(),
            reason,
        };
        let Some(primary) = targets.first().cloned() else {
            return Err(malformed("no targets".to_owned()));
        };
        for path in targets.iter().chain(&sources).chain(&implicit) {
            check_path(path).map_err(&malformed)?;
        }
        if let Some(name) = vars.keys().find(|k| !template::is_valid_name(k)) {
            return Err(GraphError::InvalidName { name: name.clone() });
        }
        if rule != PHONY && self.graph.rules.get(&rule).is_none() {
            return Err(GraphError::UnknownRule {
                rule,
                target: primary,
            });
        }
        trace!(rule = %rule, target = %primary, "append edge");
        self.graph.edges.push(Edge {
            rule,
            targets,
            sources,
            implicit,
            vars,
        });
        Ok(primary)
    }

    /// Append a single-input transformation.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn transform(&mut self, kind: Transform, request: &Simple) -> Result<String, GraphError> {
        self.add_edge(EdgeSpec {
            rule: kind.rule().to_owned(),
            targets: vec![request.target.clone()],
            sources: vec![request.source.clone()],
            implicit: request.implicit.clone(),
            vars: Vars::new(),
        })
    }

    /// Append an image resize.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn resize(&mut self, request: &Resize) -> Result<String, GraphError> {
        self.add_edge(EdgeSpec {
            rule: "resize".to_owned(),
            targets: vec![request.target.clone()],
            sources: vec![request.source.clone()],
            implicit: request.implicit.clone(),
            vars: Vars::from([("size".to_owned(), request.size.clone())]),
        })
    }

    /// Append an archive edge, recording member names relative to `base`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedEdge`] when there are no members or a
    /// path cannot be expressed relative to `base`.
    pub fn zip(&mut self, request: &Zip) -> Result<String, GraphError> {
        let malformed = |reason: String| GraphError::MalformedEdge {
            rule: "zip".to_owned(),
            reason,
        };
        if request.sources.is_empty() {
            return Err(malformed("archive has no members".to_owned()));
        }
        let base = Utf8Path::new(&request.base);
        let relative = |path: &str| {
            relative_to(Utf8Path::new(path), base).ok_or_else(|| {
                malformed(format!(
                    "`{path}` cannot be expressed relative to `{}`",
                    request.base
                ))
            })
        };
        let relin = request
            .sources
            .iter()
            .map(|source| relative(source))
            .collect::<Result<Vec<_>, _>>()?;
        let relout = relative(&request.target)?;
        self.add_edge(EdgeSpec {
            rule: "zip".to_owned(),
            targets: vec![request.target.clone()],
            sources: request.sources.clone(),
            implicit: Vec::new(),
            vars: Vars::from([
                ("base".to_owned(), request.base.clone()),
                ("relout".to_owned(), relout.into_string()),
                ("relin".to_owned(), relin.iter().join(" ")),
            ]),
        })
    }

    /// Append an importation edge.
    ///
    /// The implicit inputs always start with [`REVISION`] and [`REVSHORT`],
    /// followed by the caller's list with duplicates removed.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn importation(&mut self, request: &Importation) -> Result<String, GraphError> {
        let implicit: IndexSet<&str> = [REVISION, REVSHORT]
            .into_iter()
            .chain(request.implicit.iter().map(String::as_str))
            .collect();
        let mut vars = Vars::new();
        let options = request.options();
        if !options.is_empty() {
            vars.insert("options".to_owned(), options.join(" "));
        }
        if let Some(depfile) = &request.depfile {
            vars.insert("depfile".to_owned(), depfile.clone());
        }
        self.add_edge(EdgeSpec {
            rule: "importation".to_owned(),
            targets: vec![request.target.clone()],
            sources: vec![request.source.clone()],
            implicit: implicit.into_iter().map(str::to_owned).collect(),
            vars,
        })
    }

    /// Compose optional feature blocks into an aggregate header.
    ///
    /// One importation per part produces `$dst/gen/<family>_<part>.h`; the
    /// aggregate importation then lists those headers, in order, as implicit
    /// inputs so it is regenerated whenever a block changes.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn optional(&mut self, request: &Optional) -> Result<String, GraphError> {
        let mut leaves = Vec::with_capacity(request.parts.len());
        for part in &request.parts {
            let mut leaf = Importation::new(
                format!("$dst/gen/{}_{}.h", request.family, part.name),
                part.source.clone(),
            );
            leaf.name = Some(format!("{}_source", part.name.replace('-', "_")));
            leaves.push(self.importation(&leaf)?);
        }
        let mut aggregate = Importation::new(
            format!("{}/{}.h", request.output_dir, request.name),
            request.source.clone(),
        );
        aggregate.keep_first_comment = true;
        aggregate.depfile = Some(format!(
            "$dst/gen/{}_optional_{}.h.d",
            request.family, request.name
        ));
        aggregate.implicit = leaves;
        self.importation(&aggregate)
    }

    /// Append a generator-script run.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn gen_run(&mut self, request: &GenRun) -> Result<String, GraphError> {
        let infiles = request.sources.join(" ");
        self.add_edge(EdgeSpec {
            rule: "gen_run".to_owned(),
            targets: vec![request.target.clone()],
            sources: std::iter::once(request.script.clone())
                .chain(request.sources.iter().cloned())
                .collect(),
            implicit: Vec::new(),
            vars: Vars::from([
                ("options".to_owned(), request.options.clone()),
                ("script".to_owned(), request.script.clone()),
                ("infiles".to_owned(), infiles),
            ]),
        })
    }

    /// Append an edge carrying its own command.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn oneshot(&mut self, request: &OneShot) -> Result<String, GraphError> {
        let mut vars = Vars::from([("command".to_owned(), request.command.clone())]);
        if let Some(pool) = &request.pool {
            vars.insert("pool".to_owned(), pool.clone());
        }
        self.add_edge(EdgeSpec {
            rule: "oneshot".to_owned(),
            targets: vec![request.target.clone()],
            sources: vec![request.source.clone()],
            implicit: Vec::new(),
            vars,
        })
    }

    /// Append a test run.
    ///
    /// The rule first re-derives the test's dependency list with the importer
    /// so the edge is invalidated when any included file changes, then runs
    /// the interpreter and captures stdout as the artifact.
    ///
    /// # Errors
    ///
    /// Propagates [`Builder::add_edge`] failures.
    pub fn test(&mut self, request: &TestRun) -> Result<String, GraphError> {
        let mut vars = Vars::from([
            ("program".to_owned(), request.program.clone()),
            ("test".to_owned(), request.test.clone()),
            ("interp".to_owned(), request.interp.clone()),
        ]);
        if let Some(pool) = &request.pool {
            vars.insert("pool".to_owned(), pool.clone());
        }
        self.add_edge(EdgeSpec {
            rule: "test_run".to_owned(),
            targets: vec![request.target.clone()],
            sources: vec![request.program.clone(), request.test.clone()],
            implicit: Vec::new(),
            vars,
        })
    }

    /// Map the nickname `name` to one or more real targets.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedEdge`] when `targets` is empty.
    pub fn alias<I, S>(&mut self, name: impl Into<String>, targets: I) -> Result<String, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = targets.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(GraphError::MalformedEdge {
                rule: PHONY.to_owned(),
                reason: "alias names no targets".to_owned(),
            });
        }
        self.add_edge(EdgeSpec {
            rule: PHONY.to_owned(),
            targets: vec![name.into()],
            sources,
            implicit: Vec::new(),
            vars: Vars::new(),
        })
    }

    /// Mark targets as built when Ninja runs without arguments.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedEdge`] for a path Ninja cannot parse.
    pub fn default_targets<I, S>(&mut self, targets: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for target in targets.into_iter().map(Into::into) {
            check_path(&target).map_err(|reason| GraphError::MalformedEdge {
                rule: "default".to_owned(),
                reason,
            })?;
            self.graph.defaults.push(target);
        }
        Ok(())
    }
}

/// Reject paths that would change meaning on a Ninja `build` line.
///
/// Whitespace, `:` and `|` must be written with a `$` escape.
fn check_path(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("empty path".to_owned());
    }
    let bad = template::parse(path).into_iter().find_map(|segment| match segment {
        Segment::Literal(text) => text.chars().find(|c| c.is_whitespace() || matches!(c, ':' | '|')),
        Segment::Escape('\n') => Some('\n'),
        Segment::Escape(_) | Segment::Variable(_) => None,
    });
    match bad {
        Some(ch) => Err(format!(
            "path `{}` contains an unescaped {ch:?}",
            path.escape_debug()
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "builder tests assert on freshly created edges")]

    use super::*;
    use crate::rules::{self, Rule, RuleRegistry};
    use rstest::{fixture, rstest};

    #[fixture]
    fn graph() -> BuildGraph {
        BuildGraph::new(Vars::new(), rules::standard().expect("standard rules"))
    }

    #[rstest]
    fn transform_uses_catalogue_rule(mut graph: BuildGraph) {
        let target = graph
            .builder()
            .transform(
                Transform::ResourceWin64,
                &Simple::new("$dst/w/app.res", "$src/w/app.rc").with_implicit(["$dst/gen/icon.ico"]),
            )
            .expect("edge");
        assert_eq!(target, "$dst/w/app.res");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.rule, "rc_win64");
        assert_eq!(edge.implicit, ["$dst/gen/icon.ico"]);
    }

    #[rstest]
    fn unknown_rule_is_rejected(mut graph: BuildGraph) {
        let err = graph
            .builder()
            .add_edge(EdgeSpec {
                rule: "teleport".into(),
                targets: vec!["x".into()],
                ..EdgeSpec::default()
            })
            .expect_err("unknown rule");
        assert_eq!(
            err,
            GraphError::UnknownRule {
                rule: "teleport".into(),
                target: "x".into()
            }
        );
        assert!(graph.edges.is_empty());
    }

    #[rstest]
    #[case(vec![], "no targets")]
    #[case(vec!["".into()], "empty path")]
    #[case(vec!["a b".into()], "unescaped ' '")]
    #[case(vec!["c:/x".into()], "unescaped ':'")]
    fn malformed_targets_are_rejected(
        mut graph: BuildGraph,
        #[case] targets: Vec<String>,
        #[case] reason: &str,
    ) {
        let err = graph
            .builder()
            .add_edge(EdgeSpec {
                rule: "copy".into(),
                targets,
                ..EdgeSpec::default()
            })
            .expect_err("malformed edge");
        match err {
            GraphError::MalformedEdge { reason: got, .. } => {
                assert!(got.contains(reason), "{got}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    fn escaped_paths_are_accepted(mut graph: BuildGraph) {
        graph
            .builder()
            .transform(Transform::Copy, &Simple::new("Program$ Files/a", "c$:/a"))
            .expect("escaped path");
    }

    #[rstest]
    fn invalid_binding_names_are_rejected(mut graph: BuildGraph) {
        let err = graph
            .builder()
            .add_edge(EdgeSpec {
                rule: "copy".into(),
                targets: vec!["x".into()],
                vars: Vars::from([("bad name".to_owned(), "v".to_owned())]),
                ..EdgeSpec::default()
            })
            .expect_err("bad name");
        assert!(matches!(err, GraphError::InvalidName { .. }));
    }

    #[rstest]
    fn importation_always_depends_on_revision_stamps(mut graph: BuildGraph) {
        let mut request = Importation::new("$dst/gen/a.h", "$src/a.fs");
        request.implicit = vec![
            "$dst/gen/b.h".into(),
            REVSHORT.into(),
            "$dst/gen/b.h".into(),
        ];
        graph.builder().importation(&request).expect("edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.implicit, [REVISION, REVSHORT, "$dst/gen/b.h"]);
        assert!(edge.vars.is_empty());
    }

    #[rstest]
    fn importation_options_follow_flags(mut graph: BuildGraph) {
        let mut request = Importation::new("$dst/gen/boot.h", "$src/boot.fs");
        request.options = Some(" -DEXTRA ".into());
        request.keep_first_comment = true;
        request.name = Some("boot".into());
        request.header = "web".into();
        request.depfile = Some("$dst/gen/boot.h.dd".into());
        graph.builder().importation(&request).expect("edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(
            edge.vars.get("options").map(String::as_str),
            Some("-DEXTRA --keep-first-comment --name boot --header web")
        );
        assert_eq!(
            edge.vars.get("depfile").map(String::as_str),
            Some("$dst/gen/boot.h.dd")
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    fn optional_composes_leaves_then_aggregate(mut graph: BuildGraph, #[case] n: usize) {
        let parts: Vec<_> = (0..n)
            .map(|i| OptionalPart {
                name: format!("feature-{i}"),
                source: format!("$src/opt/feature{i}.fs"),
            })
            .collect();
        let request = Optional {
            family: "esp32".into(),
            name: "extras".into(),
            source: "$src/opt/extras.h".into(),
            output_dir: "$dst/esp32/optional".into(),
            parts,
        };
        let target = graph.builder().optional(&request).expect("edges");
        assert_eq!(target, "$dst/esp32/optional/extras.h");
        assert_eq!(graph.edges.len(), n + 1);

        let (aggregate, leaves) = graph.edges.split_last().expect("aggregate edge");
        let leaf_targets: Vec<&str> = leaves.iter().map(Edge::primary_target).collect();
        let expected: Vec<String> = (0..n).map(|i| format!("$dst/gen/esp32_feature-{i}.h")).collect();
        assert_eq!(leaf_targets, expected);
        for (i, leaf) in leaves.iter().enumerate() {
            assert_eq!(
                leaf.vars.get("options").map(String::as_str),
                Some(format!("--name feature_{i}_source --header cpp").as_str())
            );
        }

        let mut implicit = vec![REVISION.to_owned(), REVSHORT.to_owned()];
        implicit.extend(expected);
        assert_eq!(aggregate.implicit, implicit);
        assert_eq!(
            aggregate.vars.get("options").map(String::as_str),
            Some("--keep-first-comment")
        );
        assert_eq!(
            aggregate.vars.get("depfile").map(String::as_str),
            Some("$dst/gen/esp32_optional_extras.h.d")
        );
    }

    #[rstest]
    fn zip_records_relative_members(mut graph: BuildGraph) {
        graph
            .builder()
            .zip(&Zip {
                target: "$dst/dist/bundle.zip".into(),
                sources: vec![
                    "$dst/dist/bundle/a.txt".into(),
                    "$dst/dist/bundle/sub/b.bin".into(),
                ],
                base: "$dst/dist".into(),
            })
            .expect("zip edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.vars.get("base").map(String::as_str), Some("$dst/dist"));
        assert_eq!(edge.vars.get("relout").map(String::as_str), Some("bundle.zip"));
        assert_eq!(
            edge.vars.get("relin").map(String::as_str),
            Some("bundle/a.txt bundle/sub/b.bin")
        );
    }

    #[rstest]
    fn zip_rejects_unrelated_members(mut graph: BuildGraph) {
        let err = graph
            .builder()
            .zip(&Zip {
                target: "$dst/a.zip".into(),
                sources: vec!["/etc/passwd".into()],
                base: "$dst".into(),
            })
            .expect_err("absolute member");
        assert!(matches!(err, GraphError::MalformedEdge { .. }));
    }

    #[rstest]
    fn test_edge_binds_interpreter(mut graph: BuildGraph) {
        graph
            .builder()
            .test(&TestRun {
                target: "$dst/tests/core.out".into(),
                program: "$dst/posix/app".into(),
                test: "$src/tests/core.fs".into(),
                interp: String::new(),
                pool: Some("console".into()),
            })
            .expect("test edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.rule, "test_run");
        assert_eq!(edge.sources, ["$dst/posix/app", "$src/tests/core.fs"]);
        let keys: Vec<_> = edge.vars.keys().map(String::as_str).collect();
        assert_eq!(keys, ["program", "test", "interp", "pool"]);
    }

    #[rstest]
    fn gen_run_lists_script_first(mut graph: BuildGraph) {
        graph
            .builder()
            .gen_run(&GenRun {
                target: "$dst/gen/index.html".into(),
                script: "$src/tools/page.py".into(),
                options: "-v".into(),
                sources: vec!["a.md".into(), "b.md".into()],
            })
            .expect("gen_run edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.sources, ["$src/tools/page.py", "a.md", "b.md"]);
        assert_eq!(edge.vars.get("infiles").map(String::as_str), Some("a.md b.md"));
    }

    #[rstest]
    fn oneshot_overrides_command(mut graph: BuildGraph) {
        graph
            .builder()
            .oneshot(&OneShot {
                target: "deploy".into(),
                command: "scp $in host:".into(),
                source: "$dst/app".into(),
                pool: None,
            })
            .expect("oneshot edge");
        let edge = graph.edges.first().expect("one edge");
        assert_eq!(edge.vars.len(), 1);
    }

    #[rstest]
    fn alias_is_phony_and_needs_targets(mut graph: BuildGraph) {
        let mut builder = graph.builder();
        builder.alias("all", ["app", "lib"]).expect("alias");
        let err = builder
            .alias("none", Vec::<String>::new())
            .expect_err("empty alias");
        assert!(matches!(err, GraphError::MalformedEdge { .. }));
        let edge = graph.edges.first().expect("alias edge");
        assert!(edge.is_phony());
        assert_eq!(edge.sources, ["app", "lib"]);
    }

    #[rstest]
    fn defaults_accumulate(mut graph: BuildGraph) {
        let mut builder = graph.builder();
        builder.default_targets(["all"]).expect("default");
        builder.default_targets(["tests", "docs"]).expect("default");
        assert_eq!(graph.defaults, ["all", "tests", "docs"]);
    }

    #[test]
    fn custom_registry_is_honoured() {
        let mut rules = RuleRegistry::default();
        rules
            .register(Rule::new("compile", "CXX $in", "c++ $in -o $out"))
            .expect("register");
        let mut graph = BuildGraph::new(Vars::new(), rules);
        let err = graph
            .builder()
            .transform(Transform::Copy, &Simple::new("b", "a"))
            .expect_err("copy is not registered");
        assert!(matches!(err, GraphError::UnknownRule { .. }));
    }

    #[rstest]
    fn define_validates_names(mut graph: BuildGraph) {
        let mut builder = graph.builder();
        builder.define("VERSION", "7.0").expect("define");
        builder.define("VERSION", "7.1").expect("redefine");
        assert!(builder.define("no good", "x").is_err());
        assert_eq!(graph.globals.get("VERSION").map(String::as_str), Some("7.1"));
    }

    #[rstest]
    fn rebinding_moves_the_global_after_its_references(mut graph: BuildGraph) {
        let mut builder = graph.builder();
        builder.define("defs", "").expect("define");
        builder.define("SIM", "-DSIM=$defs").expect("define");
        builder.define("VERSION", "7.0").expect("define");
        builder
            .define("defs", "$defs -DVERSION=$VERSION")
            .expect("extend");
        let bound: Vec<(&str, &str)> = graph
            .globals
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            bound,
            [
                ("SIM", "-DSIM="),
                ("VERSION", "7.0"),
                ("defs", " -DVERSION=$VERSION"),
            ]
        );
    }
}

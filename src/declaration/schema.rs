//! On-disk schema of a `BUILD` unit.
//!
//! ```yaml
//! vars:
//!   VERSION: 7.0.7.16
//! include: [posix, windows]
//! build:
//!   - compile: { target: $dst/posix/app, source: $src/posix/main.cc }
//!   - alias: { name: posix, targets: [$dst/posix/app] }
//! default: [posix]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use super::{DeclarationUnit, LoadError, UnitPath, diagnostics};
use crate::graph::{
    Builder, EdgeSpec, GenRun, GraphError, Importation, OneShot, Optional, Resize, Simple,
    TestRun, Transform, Zip,
};
use crate::template::Vars;

/// Parsed contents of one unit file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitFile {
    /// Global bindings, applied in order before any step.
    #[serde(default, deserialize_with = "scalar_map")]
    pub vars: Vars,
    /// Child locations relative to the tree root.
    #[serde(default)]
    pub include: Vec<String>,
    /// Builder steps in declaration order.
    #[serde(default)]
    pub build: Vec<Step>,
    /// Targets built by a bare `ninja`.
    #[serde(default)]
    pub default: Vec<String>,
}

/// Phony alias request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alias {
    /// Nickname target.
    pub name: String,
    /// Real targets it stands for.
    pub targets: Vec<String>,
}

/// One builder call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Native compile and link.
    Compile(Simple),
    /// Simulator compile.
    CompileSim(Simple),
    /// MSVC 32-bit compile.
    CompileWin32(Simple),
    /// MSVC 64-bit compile.
    CompileWin64(Simple),
    /// MSVC 32-bit link.
    LinkWin32(Simple),
    /// MSVC 64-bit link.
    LinkWin64(Simple),
    /// 32-bit resource compile.
    ResourceWin32(Simple),
    /// 64-bit resource compile.
    ResourceWin64(Simple),
    /// Run a built artifact.
    Run(Simple),
    /// Image format conversion.
    ConvertImage(Simple),
    /// File copy.
    Copy(Simple),
    /// Image resize.
    Resize(Resize),
    /// Archive.
    Zip(Zip),
    /// Source-to-header translation.
    Importation(Importation),
    /// Optional feature composition.
    Optional(Optional),
    /// Generator script run.
    GenRun(GenRun),
    /// Edge with its own command.
    Oneshot(OneShot),
    /// Test run.
    Test(TestRun),
    /// Phony alias.
    Alias(Alias),
    /// Generic edge.
    Edge(EdgeSpec),
}

impl Step {
    /// Invoke the matching builder operation.
    ///
    /// # Errors
    ///
    /// Propagates the builder's [`GraphError`].
    pub fn apply(&self, builder: &mut Builder<'_>) -> Result<String, GraphError> {
        match self {
            Self::Compile(req) => builder.transform(Transform::Compile, req),
            Self::CompileSim(req) => builder.transform(Transform::CompileSim, req),
            Self::CompileWin32(req) => builder.transform(Transform::CompileWin32, req),
            Self::CompileWin64(req) => builder.transform(Transform::CompileWin64, req),
            Self::LinkWin32(req) => builder.transform(Transform::LinkWin32, req),
            Self::LinkWin64(req) => builder.transform(Transform::LinkWin64, req),
            Self::ResourceWin32(req) => builder.transform(Transform::ResourceWin32, req),
            Self::ResourceWin64(req) => builder.transform(Transform::ResourceWin64, req),
            Self::Run(req) => builder.transform(Transform::Run, req),
            Self::ConvertImage(req) => builder.transform(Transform::ConvertImage, req),
            Self::Copy(req) => builder.transform(Transform::Copy, req),
            Self::Resize(req) => builder.resize(req),
            Self::Zip(req) => builder.zip(req),
            Self::Importation(req) => builder.importation(req),
            Self::Optional(req) => builder.optional(req),
            Self::GenRun(req) => builder.gen_run(req),
            Self::Oneshot(req) => builder.oneshot(req),
            Self::Test(req) => builder.test(req),
            Self::Alias(req) => builder.alias(req.name.clone(), req.targets.iter().cloned()),
            Self::Edge(req) => builder.add_edge(req.clone()),
        }
    }
}

impl UnitFile {
    /// Parse a unit file's YAML text; `name` labels diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] for invalid YAML or a schema mismatch.
    pub fn parse(text: &str, name: &str) -> Result<Self, LoadError> {
        if is_blank(text) {
            return Ok(Self::default());
        }
        let doc: Value = serde_saphyr::from_str(text).map_err(|e| LoadError::Parse {
            unit: name.to_owned(),
            source: diagnostics::yaml_error(e, text, name),
        })?;
        if doc.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(doc).map_err(|e| LoadError::Parse {
            unit: name.to_owned(),
            source: diagnostics::schema_error(e, name),
        })
    }
}

impl DeclarationUnit for UnitFile {
    fn declare(&self, builder: &mut Builder<'_>) -> Result<Vec<UnitPath>, GraphError> {
        for (name, value) in &self.vars {
            builder.define(name.clone(), value.clone())?;
        }
        for step in &self.build {
            step.apply(builder)?;
        }
        builder.default_targets(self.default.iter().cloned())?;
        Ok(self.include.iter().map(UnitPath::new).collect())
    }
}

/// A unit holding only comments declares nothing.
fn is_blank(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

/// Accept scalar variable values of any YAML type and keep them as text.
fn scalar_map<'de, D>(deserializer: D) -> Result<Vars, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(de::Error::custom(format!(
                        "variable `{name}` must be a scalar"
                    )));
                }
            };
            Ok((name, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "fixture units are valid YAML")]

    use super::*;
    use crate::graph::BuildGraph;
    use crate::rules;

    const UNIT: &str = r#"
vars:
  VERSION: 7.0.7.16
  REVISION_DEPTH: 3
  RELEASE: true
include:
  - posix
  - ./web/
build:
  - compile: { target: $dst/posix/app, source: $src/posix/main.cc }
  - importation:
      target: $dst/gen/boot.h
      source: $src/common/boot.fs
      name: boot
      keep_first_comment: true
  - resize: { target: $dst/icon32.png, source: $src/icon.png, size: 32x32 }
  - alias: { name: posix, targets: [$dst/posix/app] }
  - edge:
      rule: phony
      targets: [everything]
      sources: [posix]
default: [posix]
"#;

    fn graph() -> BuildGraph {
        BuildGraph::new(Vars::new(), rules::standard().expect("catalogue"))
    }

    #[test]
    fn parses_and_declares_every_section() {
        let unit = UnitFile::parse(UNIT, "$src/BUILD").expect("valid unit");
        assert_eq!(
            unit.vars.get("REVISION_DEPTH").map(String::as_str),
            Some("3")
        );
        assert_eq!(unit.vars.get("RELEASE").map(String::as_str), Some("true"));

        let mut graph = graph();
        let children = unit.declare(&mut graph.builder()).expect("declare");
        assert_eq!(children, [UnitPath::new("posix"), UnitPath::new("web")]);
        let rules: Vec<_> = graph.edges.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, ["compile", "importation", "resize", "phony", "phony"]);
        assert_eq!(graph.defaults, ["posix"]);
        assert_eq!(
            graph.globals.get("VERSION").map(String::as_str),
            Some("7.0.7.16")
        );
    }

    #[test]
    fn empty_file_declares_nothing() {
        for text in ["", "# placeholder\n\n"] {
            let unit = UnitFile::parse(text, "$src/BUILD").expect("empty unit");
            assert_eq!(unit, UnitFile::default());
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = UnitFile::parse("targets: []\n", "$src/BUILD").expect_err("unknown key");
        assert!(matches!(err, LoadError::Parse { ref unit, .. } if unit == "$src/BUILD"));
    }

    #[test]
    fn unknown_operations_are_rejected() {
        let text = "build:\n  - compyle: { target: a, source: b }\n";
        let err = UnitFile::parse(text, "$src/posix/BUILD").expect_err("unknown step");
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn nested_variable_values_are_rejected() {
        let err = UnitFile::parse("vars:\n  FLAGS: [a, b]\n", "$src/BUILD").expect_err("list value");
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn builder_errors_surface_from_declare() {
        let unit = UnitFile::parse(
            "build:\n  - edge: { rule: teleport, targets: [x] }\n",
            "$src/BUILD",
        )
        .expect("schema is valid");
        let mut graph = graph();
        let err = unit.declare(&mut graph.builder()).expect_err("unknown rule");
        assert!(matches!(err, GraphError::UnknownRule { .. }));
    }
}

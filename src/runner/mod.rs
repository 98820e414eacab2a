//! CLI execution.
//!
//! This module keeps `main` minimal by providing a single entry point, [`run`],
//! which reads the configuration, builds the graph from the declaration tree
//! and persists the Ninja file. [`generate_ninja`] holds the pipeline itself
//! and takes every external input as a parameter.

mod error;

pub use error::RunnerError;

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use miette::Result;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::{Config, Layout};
use crate::declaration::{FsUnitSource, Loader};
use crate::diagnostics::ResultExt;
use crate::graph::BuildGraph;
use crate::ninja_gen::{self, Reconfigure};
use crate::rules;
use crate::toolchain::{self, GlobLister, PathLister};

/// Printed after a successful run unless `-q` is given.
pub const HINT: &str = "TO BUILD RUN: ninja";

/// The build file regenerates itself through this output.
const SELF_OUTPUT: &str = "$ninjadir/build.ninja";

/// Wrapper around generated Ninja manifest text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NinjaContent(String);

impl NinjaContent {
    /// Store the provided Ninja manifest string.
    #[must_use]
    pub const fn new(content: String) -> Self {
        Self(content)
    }

    /// Borrow the underlying manifest text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned manifest string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a required tool is
/// missing, the declaration tree is invalid, or the file cannot be written.
/// No build file is written in any of these cases.
pub fn run(cli: &Cli) -> Result<()> {
    let config = Config::from_env()?;
    let cwd = current_dir()?;
    let layout = config.layout(&cwd)?;
    let exe = std::env::current_exe().diag("locate the kumiki executable")?;
    let generator = Utf8PathBuf::from_path_buf(exe)
        .map_err(|path| miette::miette!("executable path {} is not UTF-8", path.display()))?;

    let ninja = generate_ninja(&config, &layout, &GlobLister, &generator)?;
    write_ninja_file(&layout.output, &ninja)?;

    if !cli.quiet {
        writeln!(io::stdout().lock(), "{HINT}").diag("print the build hint")?;
    }
    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().diag("read the working directory")?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|path| miette::miette!("working directory {} is not UTF-8", path.display()))
}

/// Build the complete Ninja file for `layout` in memory.
///
/// Globals are bound in this order: layout, toolchain, project tools, then
/// whatever the declaration units define. The prelude edges come before the
/// tree's own edges.
///
/// # Errors
///
/// Returns the first [`RunnerError`] raised along the way.
pub fn generate_ninja(
    config: &Config,
    layout: &Layout,
    lister: &dyn PathLister,
    generator: &Utf8Path,
) -> Result<NinjaContent, RunnerError> {
    let mut globals = layout.globals(config, generator);
    globals.extend(toolchain::resolve(
        config.host,
        lister,
        &config.toolchain_options(),
    )?);
    globals.extend(rules::tool_globals());

    let mut graph = BuildGraph::new(globals, rules::standard()?);
    rules::prelude(&mut graph.builder())?;

    let source = FsUnitSource::open(&layout.root)?;
    Loader::new(&source).load(&mut graph)?;
    debug!(
        units = graph.units.len(),
        edges = graph.edges.len(),
        "declaration tree loaded"
    );

    let reconfigure = Reconfigure {
        output: SELF_OUTPUT.to_owned(),
        entry: ninja_gen::escape_path(generator.as_str()),
    };
    let text = ninja_gen::generate(&graph, &reconfigure, config.policy())?;
    Ok(NinjaContent::new(text))
}

/// Atomically replace `path` with `content`.
///
/// The text goes to a temporary file in the destination directory first, so
/// an interrupted run never leaves a truncated build file behind.
///
/// # Errors
///
/// Returns [`RunnerError::Write`] if the temporary file cannot be created,
/// written or renamed.
pub fn write_ninja_file(path: &Utf8Path, content: &NinjaContent) -> Result<(), RunnerError> {
    let write_error = |source| RunnerError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(content.as_str().as_bytes())
        .map_err(write_error)?;
    tmp.persist(path).map_err(|err| write_error(err.error))?;
    info!("Generated Ninja file at {path}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests drive a known-good tree")]

    use super::*;
    use std::fs;

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("build.ninja")).expect("utf-8");
        fs::write(&path, "stale").expect("seed");
        write_ninja_file(&path, &NinjaContent::new("fresh\n".to_owned())).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "fresh\n");
        let leftovers = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent/build.ninja"))
            .expect("utf-8");
        let err = write_ninja_file(&path, &NinjaContent::new(String::new())).expect_err("no dir");
        assert!(matches!(err, RunnerError::Write { .. }));
    }
}

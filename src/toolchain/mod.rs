//! Toolchain discovery.
//!
//! [`resolve`] runs once at startup and turns the host platform plus whatever
//! is installed into the flat set of global variables the rule catalogue
//! references: `CXX`, `CFLAGS`, `STRIP_ARGS`, `LIBS`, the `WIN_*` cross
//! toolchain, and the optional `D8`/`NODEJS` interpreters.

mod cross;
mod error;
mod flags;
mod platform;
mod probe;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

pub use cross::{DEFAULT_WINDOWS_ROOT, windows_path};
pub use error::ToolchainError;
pub use platform::Host;
pub use probe::{GlobLister, PathLister, Selection, StaticLister, natural_cmp};

use crate::template::Vars;

const NODEJS: &str = "/usr/bin/nodejs";
const D8: &str = "src/v8/v8/out/x64.release/d8";

/// Knobs controlling discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOptions {
    /// Probe for the Windows cross toolchain.
    pub cross: bool,
    /// Mounted Windows program files directory.
    pub windows_root: Utf8PathBuf,
    /// Policy when several installations match.
    pub selection: Selection,
    /// Home directory used for the `d8` probe.
    pub home: Option<Utf8PathBuf>,
}

impl Default for ToolchainOptions {
    fn default() -> Self {
        Self {
            cross: true,
            windows_root: Utf8PathBuf::from(DEFAULT_WINDOWS_ROOT),
            selection: Selection::default(),
            home: None,
        }
    }
}

/// Produce the toolchain variables for `host`.
///
/// # Errors
///
/// Returns [`ToolchainError::NotFound`] when cross probing is enabled and a
/// Windows binary is missing, or the lister's error when probing fails.
///
/// ```
/// use kumiki::toolchain::{Host, StaticLister, ToolchainOptions, resolve};
///
/// let options = ToolchainOptions { cross: false, ..ToolchainOptions::default() };
/// let vars = resolve(Host::Darwin, &StaticLister::default(), &options)?;
/// assert_eq!(vars.get("CXX").map(String::as_str), Some("g++"));
/// assert!(vars.get("NODEJS").is_none());
/// # Ok::<(), kumiki::toolchain::ToolchainError>(())
/// ```
pub fn resolve(
    host: Host,
    lister: &dyn PathLister,
    options: &ToolchainOptions,
) -> Result<Vars, ToolchainError> {
    debug!(%host, cross = options.cross, "resolving toolchain");
    let mut vars = Vars::new();
    vars.insert("CXX".to_owned(), flags::CXX.to_owned());
    vars.insert("CFLAGS".to_owned(), flags::cflags(host).join(" "));
    vars.insert("STRIP_ARGS".to_owned(), flags::strip_args(host).join(" "));
    vars.insert("LIBS".to_owned(), flags::LIBS.join(" "));

    let mut win = Vars::new();
    if options.cross {
        cross::resolve(lister, &options.windows_root, options.selection, &mut win)?;
    }
    let (tools, win_flags): (Vars, Vars) = win
        .into_iter()
        .partition(|(name, _)| !name.starts_with("WIN_CFLAGS") && !name.starts_with("WIN_LFLAGS"));
    vars.extend(tools);

    let d8 = options.home.as_deref().map(|home| home.join(D8));
    let interpreters = [("D8", d8), ("NODEJS", Some(Utf8PathBuf::from(NODEJS)))];
    for (name, candidate) in interpreters {
        let Some(path) = candidate else {
            debug!(tool = name, "no candidate path");
            continue;
        };
        if let Some(found) = optional(lister, name, &path, options.selection)? {
            vars.insert(name.to_owned(), format!("\"{found}\""));
        }
    }
    vars.extend(win_flags);
    Ok(vars)
}

fn optional(
    lister: &dyn PathLister,
    name: &str,
    path: &Utf8Path,
    selection: Selection,
) -> Result<Option<Utf8PathBuf>, ToolchainError> {
    probe::find(lister, name, &probe::literal(path), selection)
}

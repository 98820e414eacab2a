//! Run configuration.
//!
//! The command line only carries `-q`; every other setting is read once from
//! `KUMIKI_*` environment variables into a [`Config`]. [`Config::from_lookup`]
//! takes the lookup as a closure so callers can supply a fixed map instead of
//! the process environment.
//!
//! ```
//! use kumiki::config::Config;
//! use kumiki::toolchain::Selection;
//!
//! let config = Config::from_lookup(|name| match name {
//!     "KUMIKI_CROSS" => Some("off".to_owned()),
//!     "KUMIKI_TOOLCHAIN_SELECT" => Some("latest".to_owned()),
//!     _ => None,
//! })?;
//! assert!(!config.cross);
//! assert_eq!(config.selection, Selection::Latest);
//! assert_eq!(
//!     config.regen_env(),
//!     "KUMIKI_ROOT=$src KUMIKI_CROSS=0 KUMIKI_TOOLCHAIN_SELECT=latest"
//! );
//! # Ok::<(), kumiki::config::ConfigError>(())
//! ```

mod error;

use camino::{Utf8Path, Utf8PathBuf};
use kumiki_env::{
    CROSS_ENV, HOME_ENV, HOST_ENV, ROOT_ENV, SELECT_ENV, STRICT_ENV, WIN_ROOT_ENV,
};
use shell_quote::{QuoteRefExt, Sh};
use tracing::debug;

pub use error::ConfigError;

use crate::graph::relative_to;
use crate::ninja_gen::UnresolvedPolicy;
use crate::template::Vars;
use crate::toolchain::{DEFAULT_WINDOWS_ROOT, Host, Selection, ToolchainOptions};

/// Name of the generated file, written to the working directory.
pub const BUILD_FILE: &str = "build.ninja";

/// Oldest Ninja that understands the generated file.
pub const NINJA_REQUIRED_VERSION: &str = "1.1";

/// Settings for one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the declaration tree, as given.
    pub root: Utf8PathBuf,
    /// Probe for the Windows cross toolchain.
    pub cross: bool,
    /// Mounted Windows program files directory.
    pub windows_root: Utf8PathBuf,
    /// Which installation wins when several match.
    pub selection: Selection,
    /// Reject unresolved variables.
    pub strict: bool,
    /// Platform the native flags are chosen for.
    pub host: Host,
    /// Home directory for the `d8` probe.
    pub home: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            cross: true,
            windows_root: Utf8PathBuf::from(DEFAULT_WINDOWS_ROOT),
            selection: Selection::default(),
            strict: false,
            host: Host::current(),
            home: None,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] for an unparsable flag or an
    /// unknown selection policy.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        let selection = match read(SELECT_ENV) {
            Some(value) => value
                .parse()
                .map_err(|reason| invalid(SELECT_ENV, &value, reason))?,
            None => defaults.selection,
        };
        let config = Self {
            root: read(ROOT_ENV).map_or(defaults.root, Utf8PathBuf::from),
            cross: flag(CROSS_ENV, read(CROSS_ENV), defaults.cross)?,
            windows_root: read(WIN_ROOT_ENV).map_or(defaults.windows_root, Utf8PathBuf::from),
            selection,
            strict: flag(STRICT_ENV, read(STRICT_ENV), defaults.strict)?,
            host: read(HOST_ENV).map_or(defaults.host, |value| Host::from(value.as_str())),
            home: read(HOME_ENV).map(Utf8PathBuf::from),
        };
        debug!(?config, "configuration");
        Ok(config)
    }

    /// Options handed to toolchain discovery.
    #[must_use]
    pub fn toolchain_options(&self) -> ToolchainOptions {
        ToolchainOptions {
            cross: self.cross,
            windows_root: self.windows_root.clone(),
            selection: self.selection,
            home: self.home.clone(),
        }
    }

    /// How the emitter treats unresolved variables.
    #[must_use]
    pub const fn policy(&self) -> UnresolvedPolicy {
        if self.strict {
            UnresolvedPolicy::Strict
        } else {
            UnresolvedPolicy::PassThrough
        }
    }

    /// Environment prefix for the regeneration command.
    ///
    /// The root is always passed as `$src`; other settings appear only when
    /// they differ from their defaults.
    #[must_use]
    pub fn regen_env(&self) -> String {
        let mut settings = vec![format!("{ROOT_ENV}=$src")];
        if !self.cross {
            settings.push(format!("{CROSS_ENV}=0"));
        }
        if self.windows_root != DEFAULT_WINDOWS_ROOT {
            settings.push(format!(
                "{WIN_ROOT_ENV}={}",
                escape_value(&shell_word(self.windows_root.as_str()))
            ));
        }
        if self.selection != Selection::default() {
            settings.push(format!("{SELECT_ENV}={}", self.selection.as_str()));
        }
        if self.strict {
            settings.push(format!("{STRICT_ENV}=1"));
        }
        if self.host != Host::current() {
            settings.push(format!("{HOST_ENV}={}", self.host));
        }
        settings.join(" ")
    }

    /// Work out where sources and outputs live relative to `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the root does not exist and
    /// [`ConfigError::WorkingDirectory`] when `cwd` cannot be resolved.
    pub fn layout(&self, cwd: &Utf8Path) -> Result<Layout, ConfigError> {
        let here = cwd
            .canonicalize_utf8()
            .map_err(|source| ConfigError::WorkingDirectory { source })?;
        let root = cwd
            .join(&self.root)
            .canonicalize_utf8()
            .map_err(|err| invalid(ROOT_ENV, self.root.as_str(), err.to_string()))?;
        let src = relative_to(&root, &here).unwrap_or(root);
        let dst = if src == "." { "out" } else { "." };
        Ok(Layout {
            root: cwd.join(&self.root),
            src: src.into_string(),
            dst: dst.to_owned(),
            output: cwd.join(BUILD_FILE),
        })
    }
}

/// Directories derived from the configuration and the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Declaration tree root as a filesystem path.
    pub root: Utf8PathBuf,
    /// Tree root relative to the working directory, bound to `$src`.
    pub src: String,
    /// Output directory, bound to `$dst`.
    pub dst: String,
    /// Path of the generated file.
    pub output: Utf8PathBuf,
}

impl Layout {
    /// Leading globals of every build file.
    #[must_use]
    pub fn globals(&self, config: &Config, generator: &Utf8Path) -> Vars {
        Vars::from([
            (
                "ninja_required_version".to_owned(),
                NINJA_REQUIRED_VERSION.to_owned(),
            ),
            ("src".to_owned(), escape_value(&self.src)),
            ("dst".to_owned(), self.dst.clone()),
            ("ninjadir".to_owned(), ".".to_owned()),
            ("builddir".to_owned(), "$dst".to_owned()),
            (
                "generator".to_owned(),
                escape_value(&shell_word(generator.as_str())),
            ),
            ("regen_env".to_owned(), config.regen_env()),
        ])
    }
}

fn invalid(variable: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfig {
        variable,
        value: value.to_owned(),
        reason: reason.into(),
    }
}

fn flag(variable: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(text) = value else {
        return Ok(default);
    };
    match text.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Ok(true),
        "0" | "off" | "false" | "no" => Ok(false),
        _ => Err(invalid(variable, &text, "expected one of 1/0, on/off, true/false, yes/no")),
    }
}

/// Quote `text` for `/bin/sh`.
fn shell_word(text: &str) -> String {
    let bytes: Vec<u8> = text.quoted(Sh);
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Escape `$` so Ninja keeps a value literal.
fn escape_value(text: &str) -> String {
    text.replace('$', "$$")
}
